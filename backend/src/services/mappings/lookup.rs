use crate::error::AppError;
use crate::mappings_store::MappingStore;
use actix_web::{web, HttpResponse};
use common::requests::LookupMappingsRequest;
use std::collections::BTreeMap;

/// Handles `POST /api/mappings/lookup`: resolves a list of external values
/// against the store and returns the known pairs as an object for direct
/// indexing on the client.
pub(crate) async fn process(
    store: web::Data<MappingStore>,
    payload: web::Json<LookupMappingsRequest>,
) -> Result<HttpResponse, AppError> {
    let values = payload.into_inner().external_values;
    let found = store.by_external_values(&values);

    let mappings: BTreeMap<String, String> = found
        .into_iter()
        .map(|m| (m.external_value, m.adcopy_name))
        .collect();
    let found_count = mappings.len();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": {
            "mappings": mappings,
            "found": found_count,
            "total": values.len(),
        }
    })))
}
