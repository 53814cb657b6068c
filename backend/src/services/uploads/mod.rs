//! Upload, preview and parsing of external report files.
//!
//! These endpoints drive the first steps of the import sequence: a file is
//! uploaded and previewed, the client picks a header line and delimiter, the
//! file is parsed into columns and rows, and the temp file is deleted once
//! the import finishes (or is cancelled).
//!
//! The provided routes are:
//! - `POST /api/upload/preview`: multipart upload (`file` field). Stores the
//!   bytes in the temp file store and returns the file id, the first raw
//!   lines, the total line count and the detected delimiter. Spreadsheets
//!   additionally report their sheet names.
//!
//! - `POST /api/upload/parse`: parses a previously uploaded file from a
//!   given start line, with an explicit delimiter or `"auto"` detection, and
//!   returns columns, rows and a ten-row preview.
//!
//! - `DELETE /api/upload/{file_id}`: removes the temp file; idempotent.

use actix_web::web::{delete, post, scope};
use actix_web::Scope;

mod delete_file;
mod parse;
mod preview;

const API_PATH: &str = "/api/upload";

/// Configures and returns the Actix scope for upload routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/preview", post().to(preview::process))
        .route("/parse", post().to(parse::process))
        .route("/{file_id}", delete().to(delete_file::process))
}
