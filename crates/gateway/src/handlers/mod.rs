//! API handlers module

pub mod assistant;
pub mod graph;
pub mod health;
pub mod import;
pub mod publications;

use axum::http::Uri;
use spacebio_common::errors::AppError;

/// JSON 404 for unmatched routes
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound {
        resource_type: "route".to_string(),
        id: uri.path().to_string(),
    }
}
