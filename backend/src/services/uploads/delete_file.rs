use crate::error::AppError;
use crate::file_store::TempFileStore;
use actix_web::{web, HttpResponse};

/// Handles `DELETE /api/upload/{file_id}`. Always succeeds; `deleted` tells
/// whether an entry actually existed.
pub(crate) async fn process(
    store: web::Data<TempFileStore>,
    file_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let deleted = store.delete(&file_id).await;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "deleted": deleted,
    })))
}
