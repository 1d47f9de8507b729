//! Import processor
//!
//! One import is a single synchronous batch:
//! 1. Fetch the CSV and parse it
//! 2. Insert publications in fixed-size batches
//! 3. Derive connections over every stored publication
//! 4. Replace the stored connections in one atomic step
//!
//! The first failing step aborts the import. Nothing already written is
//! rolled back and there is no resume; the caller re-runs the import.

use crate::errors::IngestionError;
use crate::parser::parse_publications;
use crate::source::CsvSource;
use serde::{Deserialize, Serialize};
use spacebio_common::config::ImportConfig;
use spacebio_common::db::PublicationStore;
use spacebio_common::graph::derive_connections;
use spacebio_common::metrics;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Outcome of a completed import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Publications parsed and inserted
    pub imported: usize,
    /// Connections written after regeneration
    pub connections: usize,
}

/// Import processor
pub struct ImportProcessor {
    store: Arc<dyn PublicationStore>,
    source: Arc<dyn CsvSource>,
    batch_size: usize,
    window: usize,
}

impl ImportProcessor {
    pub fn new(
        store: Arc<dyn PublicationStore>,
        source: Arc<dyn CsvSource>,
        config: &ImportConfig,
    ) -> Self {
        Self {
            store,
            source,
            batch_size: config.batch_size.max(1),
            window: config.connection_window,
        }
    }

    /// Fetch the configured source and import it
    #[instrument(skip(self), fields(source = %self.source.location()))]
    pub async fn run(&self) -> Result<ImportSummary, IngestionError> {
        info!("Starting publication import...");
        let start = Instant::now();

        let result = self.fetch_and_import().await;

        match &result {
            Ok(summary) => {
                metrics::record_import(
                    start.elapsed().as_secs_f64(),
                    summary.imported,
                    summary.connections,
                );
                info!(
                    imported = summary.imported,
                    connections = summary.connections,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Publication import complete"
                );
            }
            Err(e) => {
                metrics::record_import_failure();
                tracing::error!(error = %e, "Import error");
            }
        }

        result
    }

    async fn fetch_and_import(&self) -> Result<ImportSummary, IngestionError> {
        let csv = self.source.fetch().await?;
        self.import_csv(&csv).await
    }

    /// Import an already-fetched CSV body
    pub async fn import_csv(&self, csv: &str) -> Result<ImportSummary, IngestionError> {
        let now = chrono::Utc::now();
        let publications = parse_publications(csv);
        let total = publications.len();
        info!(count = total, "Parsed publications");

        let mut inserted = 0;
        for batch in publications.chunks(self.batch_size) {
            let rows = batch.iter().cloned().map(|p| p.into_model(now)).collect();
            self.store.insert_publications(rows).await?;

            inserted += batch.len();
            info!(inserted, total, "Inserted publication batch");
        }

        let connections = self.regenerate_connections().await?;

        Ok(ImportSummary {
            imported: inserted,
            connections,
        })
    }

    /// Recompute every connection from the stored publications
    pub async fn regenerate_connections(&self) -> Result<usize, IngestionError> {
        info!("Generating knowledge graph connections...");

        let inputs = self.store.connection_inputs().await?;
        let derived = derive_connections(&inputs, self.window);
        let count = derived.len();
        info!(publications = inputs.len(), connections = count, "Generated connections");

        let now = chrono::Utc::now();
        let rows = derived.into_iter().map(|c| c.into_model(now)).collect();
        self.store.replace_connections(rows, self.batch_size).await?;

        Ok(count)
    }
}
