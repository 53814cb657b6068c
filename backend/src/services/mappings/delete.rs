use crate::error::AppError;
use crate::mappings_store::MappingStore;
use actix_web::{web, HttpResponse};

/// Handles `DELETE /api/mappings/{id}`.
pub(crate) async fn by_id(
    store: web::Data<MappingStore>,
    id: web::Path<u32>,
) -> Result<HttpResponse, AppError> {
    let deleted = store.delete_by_id(id.into_inner())?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "deleted": deleted,
    })))
}

/// Handles `DELETE /api/mappings/value/{external_value}`.
pub(crate) async fn by_external_value(
    store: web::Data<MappingStore>,
    value: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let deleted = store.delete_by_external_value(&value)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "deleted": deleted,
    })))
}
