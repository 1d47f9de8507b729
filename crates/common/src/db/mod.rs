//! Database layer for SpaceBio
//!
//! Provides:
//! - SeaORM entity models
//! - The `PublicationStore` seam with Postgres and in-memory implementations
//! - Connection pool management and migrations

pub mod models;
pub mod query;
mod memory;
mod repository;
mod store;

pub use memory::MemoryStore;
pub use query::{FilterOptions, PublicationQuery};
pub use repository::Repository;
pub use store::PublicationStore;

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database...");

        let mut opts = ConnectOptions::new(&config.url);
        opts
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .sqlx_logging(true);

        let conn = Database::connect(opts)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect: {}", e)
            })?;

        info!("Database connection established");

        Ok(Self { conn })
    }

    /// Get the underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Apply the bundled SQL migrations
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations...");
        sqlx::migrate!("../../migrations")
            .run(self.conn.get_postgres_connection_pool())
            .await?;
        Ok(())
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.conn
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Ping failed: {}", e),
            })?;

        Ok(())
    }
}

/// Build the store selected by `config.url`
pub async fn connect_store(config: &DatabaseConfig) -> Result<Arc<dyn PublicationStore>> {
    if config.url.starts_with("memory://") {
        info!("Using in-memory publication store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let pool = DbPool::new(config).await?;
    if config.run_migrations {
        pool.migrate().await?;
    }

    Ok(Arc::new(Repository::new(pool)))
}
