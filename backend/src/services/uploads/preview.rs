use crate::error::AppError;
use crate::file_store::{validate_upload, TempFileStore, MAX_UPLOAD_BYTES, MAX_UPLOAD_MB};
use crate::parser::{self, PREVIEW_MAX_LINES};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use log::info;

/// Handles `POST /api/upload/preview`: stores the uploaded file and returns
/// its raw first lines together with the detected delimiter.
pub(crate) async fn process(
    store: web::Data<TempFileStore>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let (bytes, original_name) = read_file_field(payload).await?;
    info!("Upload received: {} ({} bytes)", original_name, bytes.len());

    let file_id = store.save(&bytes, &original_name).await?;
    let preview = parser::preview(store.get_ref(), &file_id, PREVIEW_MAX_LINES).await?;
    let detected_separator = parser::detect_separator(&preview.lines);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": {
            "fileId": file_id,
            "originalName": original_name,
            "lines": preview.lines,
            "totalLines": preview.total_lines,
            "isExcel": preview.is_excel,
            "detectedSeparator": detected_separator,
            "sheetNames": preview.sheet_names,
        }
    })))
}

/// Drains the multipart payload and returns the `file` field's bytes and
/// filename. The extension is checked before reading and the size cap is
/// enforced while streaming, so an oversize upload is rejected without
/// buffering all of it.
async fn read_file_field(mut payload: Multipart) -> Result<(Vec<u8>, String), AppError> {
    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::Validation(format!("Invalid multipart payload: {e}")))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));
        if name.as_deref() != Some("file") {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
            .unwrap_or_default();
        validate_upload(&filename, 0)?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::Validation(format!("Upload stream error: {e}")))?;
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(AppError::FileTooLarge(MAX_UPLOAD_MB));
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok((bytes, filename));
    }

    Err(AppError::Validation("No file provided".to_string()))
}
