//! SpaceBio Common Library
//!
//! Shared code for the SpaceBio services including:
//! - Publication models and the storage seam (Postgres and in-memory)
//! - The connection deriver and graph projection
//! - The AI assistant gateway client
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod assistant;
pub mod config;
pub mod db;
pub mod errors;
pub mod graph;
pub mod metrics;
pub mod telemetry;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use db::PublicationStore;
pub use assistant::ChatGateway;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Dataset imported when no source is configured
pub const DEFAULT_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/jgalazka/SB_publications/main/SB_publications.csv";

/// Rows per insert batch
pub const DEFAULT_BATCH_SIZE: usize = 50;
