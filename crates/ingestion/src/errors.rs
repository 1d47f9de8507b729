//! Ingestion error types

use spacebio_common::errors::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Failed to fetch publications: {status}")]
    Fetch { status: u16 },

    #[error("Source request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<IngestionError> for AppError {
    fn from(e: IngestionError) -> Self {
        match e {
            IngestionError::Fetch { status } => AppError::SourceFetch { status },
            IngestionError::Http(err) => AppError::HttpClient(err),
            IngestionError::Store(err) => err,
        }
    }
}
