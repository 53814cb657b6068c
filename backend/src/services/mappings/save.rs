use crate::error::AppError;
use crate::mappings_store::MappingStore;
use actix_web::{web, HttpResponse};
use common::requests::SaveMappingsRequest;
use log::info;

/// Handles `POST /api/mappings`: batch upsert of external-value -> ad-copy
/// pairs. A write failure propagates as a 500; the store stays consistent.
pub(crate) async fn process(
    store: web::Data<MappingStore>,
    payload: web::Json<SaveMappingsRequest>,
) -> Result<HttpResponse, AppError> {
    let entries = payload.into_inner().mappings;
    info!("Saving {} mapping(s)", entries.len());

    let saved = store.upsert_batch(&entries)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "saved": saved,
    })))
}
