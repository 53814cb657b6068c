//! Error type shared by the stores, the parser and the HTTP handlers.
//!
//! Every error renders as the JSON envelope `{ "success": false, "error": … }`
//! so handlers can simply return `Result<HttpResponse, AppError>`. Parse
//! diagnostics on individual rows are warnings, not errors, and never appear
//! here.

use actix_web::http::StatusCode;
use actix_web::HttpResponse;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Bad or missing required field in a request.
    #[error("{0}")]
    Validation(String),

    /// Upload with a file type other than CSV or XLSX.
    #[error("Unsupported file type '{0}'. Use CSV or XLSX.")]
    UnsupportedExtension(String),

    /// Upload beyond the size cap.
    #[error("File too large (max {0} MB)")]
    FileTooLarge(usize),

    /// Unknown file id or mapping.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Disk read/write/delete failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::UnsupportedExtension(_)
            | AppError::FileTooLarge(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Io(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": self.to_string(),
        }))
    }
}
