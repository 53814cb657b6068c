use crate::error::AppError;
use crate::file_store::TempFileStore;
use crate::parser::{self, Separator};
use actix_web::{web, HttpResponse};
use common::requests::ParseFileRequest;
use log::info;
use std::collections::HashMap;

/// Handles `POST /api/upload/parse`: parses the stored file from a chosen
/// start line with an explicit or auto-detected delimiter.
pub(crate) async fn process(
    store: web::Data<TempFileStore>,
    payload: web::Json<ParseFileRequest>,
) -> Result<HttpResponse, AppError> {
    let req = payload.into_inner();
    if req.file_id.is_empty() {
        return Err(AppError::Validation("fileId is required".to_string()));
    }
    let separator = Separator::from_request(req.separator.as_deref())?;

    info!("Parsing file {} from line {}", req.file_id, req.start_line);
    let table = parser::parse(store.get_ref(), &req.file_id, req.start_line, separator).await?;

    let row_count = table.row_count();
    let preview: Vec<HashMap<String, String>> = table.rows.iter().take(10).cloned().collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": {
            "columns": table.columns,
            "data": table.rows,
            "separator": table.separator,
            "rowCount": row_count,
            "preview": preview,
        }
    })))
}
