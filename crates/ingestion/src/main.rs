//! SpaceBio Ingestion CLI
//!
//! Runs one publication import against the configured store:
//! 1. Fetches the CSV source
//! 2. Inserts publications in batches
//! 3. Regenerates knowledge-graph connections
//! 4. Prints the summary as JSON

use spacebio_common::{config::AppConfig, db, telemetry, VERSION};
use spacebio_ingestion::{HttpCsvSource, ImportProcessor};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing
    telemetry::init_tracing(&config.observability);

    info!("Starting SpaceBio Ingestion v{}", VERSION);

    let store = db::connect_store(&config.database).await?;
    let source = HttpCsvSource::new(
        config.import.source_url.clone(),
        Duration::from_secs(config.import.fetch_timeout_secs),
    )?;

    let processor = ImportProcessor::new(store, Arc::new(source), &config.import);
    let summary = processor.run().await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
