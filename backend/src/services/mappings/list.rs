use crate::error::AppError;
use crate::mappings_store::MappingStore;
use actix_web::{web, HttpResponse};

/// Handles `GET /api/mappings`: returns every persisted mapping record.
pub(crate) async fn process(store: web::Data<MappingStore>) -> Result<HttpResponse, AppError> {
    let mappings = store.all();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": mappings,
    })))
}
