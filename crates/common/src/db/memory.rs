//! In-process store
//!
//! Backs `memory://` deployments and the test suites. Rows are kept in
//! insertion order, which is the import order the deriver relies on.

use crate::db::models::{Publication, PublicationConnection};
use crate::db::query::{FilterOptions, PublicationQuery};
use crate::db::store::PublicationStore;
use crate::errors::Result;
use crate::graph::ConnectionInput;
use async_trait::async_trait;
use std::cmp::Reverse;
use std::collections::HashSet;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    publications: RwLock<Vec<Publication>>,
    connections: RwLock<Vec<PublicationConnection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of stored connections
    pub async fn connections(&self) -> Vec<PublicationConnection> {
        self.connections.read().await.clone()
    }
}

#[async_trait]
impl PublicationStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_publications(&self, batch: Vec<Publication>) -> Result<u64> {
        let count = batch.len() as u64;
        self.publications.write().await.extend(batch);
        Ok(count)
    }

    async fn connection_inputs(&self) -> Result<Vec<ConnectionInput>> {
        let publications = self.publications.read().await;
        Ok(publications
            .iter()
            .map(|p| ConnectionInput {
                id: p.id,
                keywords: p.keywords.clone(),
                organisms: p.organisms.clone(),
                research_area: p.research_area.clone(),
            })
            .collect())
    }

    async fn replace_connections(
        &self,
        connections: Vec<PublicationConnection>,
        _batch_size: usize,
    ) -> Result<u64> {
        let count = connections.len() as u64;
        *self.connections.write().await = connections;
        Ok(count)
    }

    async fn count_publications(&self) -> Result<u64> {
        Ok(self.publications.read().await.len() as u64)
    }

    async fn list_publications(&self, query: &PublicationQuery) -> Result<Vec<Publication>> {
        let publications = self.publications.read().await;
        let mut matched: Vec<Publication> = publications
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();

        // Year descending, unknown years last; stable for ties
        matched.sort_by_key(|p| (p.year.is_none(), Reverse(p.year)));
        matched.truncate(query.limit as usize);
        Ok(matched)
    }

    async fn find_publication(&self, id: Uuid) -> Result<Option<Publication>> {
        let publications = self.publications.read().await;
        Ok(publications.iter().find(|p| p.id == id).cloned())
    }

    async fn filter_options(&self) -> Result<FilterOptions> {
        let publications = self.publications.read().await;
        Ok(FilterOptions::collect(publications.iter().map(|p| {
            (p.organisms.clone(), p.research_area.clone(), p.experiment_type.clone())
        })))
    }

    async fn first_publications(&self, limit: u64) -> Result<Vec<Publication>> {
        let publications = self.publications.read().await;
        Ok(publications.iter().take(limit as usize).cloned().collect())
    }

    async fn connections_among(&self, ids: &[Uuid]) -> Result<Vec<PublicationConnection>> {
        let ids: HashSet<&Uuid> = ids.iter().collect();
        let connections = self.connections.read().await;
        Ok(connections
            .iter()
            .filter(|c| ids.contains(&c.source_publication_id) && ids.contains(&c.target_publication_id))
            .cloned()
            .collect())
    }
}
