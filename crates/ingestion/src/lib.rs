//! SpaceBio ingestion
//!
//! Pulls the publication CSV, stores the rows, and regenerates the
//! knowledge-graph connections between them.

pub mod errors;
pub mod parser;
pub mod processor;
pub mod source;

pub use errors::IngestionError;
pub use processor::{ImportProcessor, ImportSummary};
pub use source::{CsvSource, HttpCsvSource, StaticCsvSource};
