//! Publication import function

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use spacebio_common::errors::{AppError, Result};
use spacebio_ingestion::ImportProcessor;

pub const IMPORT_SUCCESS_MESSAGE: &str = "Publications imported successfully";

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub imported: usize,
    pub message: String,
}

/// Fetch the dataset, store every row, and rebuild the connection graph.
///
/// The import runs on its own task, so a client that disconnects does not
/// stop it halfway. Any failure aborts the remaining steps and surfaces as a
/// JSON error.
pub async fn import_publications(State(state): State<AppState>) -> Result<Json<ImportResponse>> {
    let processor = ImportProcessor::new(
        state.store.clone(),
        state.source.clone(),
        &state.config.import,
    );

    let summary = tokio::spawn(async move { processor.run().await })
        .await
        .map_err(|e| AppError::Internal {
            message: format!("Import task failed: {}", e),
        })??;

    Ok(Json(ImportResponse {
        success: true,
        imported: summary.imported,
        message: IMPORT_SUCCESS_MESSAGE.to_string(),
    }))
}
