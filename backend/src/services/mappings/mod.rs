//! Management of persisted external-value -> ad-copy mappings.
//!
//! The provided routes are:
//! - `GET /api/mappings`: all mapping records.
//! - `POST /api/mappings/lookup`: mappings for a list of external values,
//!   returned as a value -> ad-copy object plus found/total counts.
//! - `POST /api/mappings`: batch upsert; entries with an empty field are
//!   skipped, the response carries the number actually saved.
//! - `DELETE /api/mappings/{id}` and `DELETE /api/mappings/value/{value}`:
//!   remove one record by id or by external value.

use actix_web::web::{self, get, post, scope};
use actix_web::Scope;

mod delete;
mod list;
mod lookup;
mod save;

const API_PATH: &str = "/api/mappings";

/// Configures and returns the Actix scope for mapping routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("", post().to(save::process))
        .route("/lookup", post().to(lookup::process))
        .route("/value/{external_value}", web::delete().to(delete::by_external_value))
        .route("/{id}", web::delete().to(delete::by_id))
}
