//! Storage seam for publications and their derived connections

use crate::db::models::{Publication, PublicationConnection};
use crate::db::query::{FilterOptions, PublicationQuery};
use crate::errors::Result;
use crate::graph::ConnectionInput;
use async_trait::async_trait;
use uuid::Uuid;

/// Operations the import job and the read API need from persistence.
///
/// Implemented by the Postgres `Repository` and by `MemoryStore`.
#[async_trait]
pub trait PublicationStore: Send + Sync {
    /// Check connectivity
    async fn ping(&self) -> Result<()>;

    /// Insert one batch of publications; returns rows written
    async fn insert_publications(&self, batch: Vec<Publication>) -> Result<u64>;

    /// Deriver inputs for every stored publication, in import order
    async fn connection_inputs(&self) -> Result<Vec<ConnectionInput>>;

    /// Replace every stored connection in one atomic step, inserting in
    /// chunks of `batch_size`; returns rows written. On failure the previous
    /// set stays in place.
    async fn replace_connections(
        &self,
        connections: Vec<PublicationConnection>,
        batch_size: usize,
    ) -> Result<u64>;

    /// Number of stored publications
    async fn count_publications(&self) -> Result<u64>;

    /// Filtered listing, newest year first
    async fn list_publications(&self, query: &PublicationQuery) -> Result<Vec<Publication>>;

    /// Single publication by id
    async fn find_publication(&self, id: Uuid) -> Result<Option<Publication>>;

    /// Distinct filter values across all publications
    async fn filter_options(&self) -> Result<FilterOptions>;

    /// First `limit` publications in import order
    async fn first_publications(&self, limit: u64) -> Result<Vec<Publication>>;

    /// Connections whose source and target are both in `ids`
    async fn connections_among(&self, ids: &[Uuid]) -> Result<Vec<PublicationConnection>>;
}
