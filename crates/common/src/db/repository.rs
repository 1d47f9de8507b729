//! Repository pattern for database operations
//!
//! Postgres implementation of `PublicationStore` on top of SeaORM. Array
//! columns (`authors`, `keywords`, `organisms`) map to `text[]`.

use crate::db::models::*;
use crate::db::query::{FilterOptions, PublicationQuery};
use crate::db::store::PublicationStore;
use crate::db::DbPool;
use crate::errors::Result;
use crate::graph::ConnectionInput;
use async_trait::async_trait;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, DbBackend, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Statement, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

/// Listing query; every filter is optional and bound as a parameter
const LIST_PUBLICATIONS_SQL: &str = r#"
    SELECT *
    FROM publications
    WHERE ($1::text IS NULL OR title ILIKE $1 OR "abstract" ILIKE $1)
      AND ($2::int IS NULL OR year >= $2)
      AND ($3::int IS NULL OR year <= $3)
      AND (cardinality($4::text[]) = 0 OR organisms && $4::text[])
      AND (cardinality($5::text[]) = 0 OR research_area = ANY($5::text[]))
    ORDER BY year DESC NULLS LAST, id ASC
    LIMIT $6
"#;

fn connection_active_model(c: PublicationConnection) -> ConnectionActiveModel {
    ConnectionActiveModel {
        id: Set(c.id),
        source_publication_id: Set(c.source_publication_id),
        target_publication_id: Set(c.target_publication_id),
        connection_type: Set(c.connection_type),
        strength: Set(c.strength),
        created_at: Set(c.created_at),
    }
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.connection()
    }
}

#[async_trait]
impl PublicationStore for Repository {
    // ========================================================================
    // Health Check
    // ========================================================================

    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Import Operations
    // ========================================================================

    async fn insert_publications(&self, batch: Vec<Publication>) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }

        let rows = batch.into_iter().map(Publication::into_insert);
        let inserted = PublicationEntity::insert_many(rows)
            .exec_without_returning(self.conn())
            .await?;

        Ok(inserted)
    }

    async fn connection_inputs(&self) -> Result<Vec<ConnectionInput>> {
        let rows: Vec<(Uuid, Vec<String>, Vec<String>, Option<String>)> = PublicationEntity::find()
            .select_only()
            .column(PublicationColumn::Id)
            .column(PublicationColumn::Keywords)
            .column(PublicationColumn::Organisms)
            .column(PublicationColumn::ResearchArea)
            .order_by_asc(PublicationColumn::Id)
            .into_tuple()
            .all(self.conn())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, keywords, organisms, research_area)| ConnectionInput {
                id,
                keywords,
                organisms,
                research_area,
            })
            .collect())
    }

    async fn replace_connections(
        &self,
        connections: Vec<PublicationConnection>,
        batch_size: usize,
    ) -> Result<u64> {
        // An uncommitted transaction rolls back on drop
        let txn = self.conn().begin().await?;

        let removed = ConnectionEntity::delete_many().exec(&txn).await?.rows_affected;

        let mut written = 0;
        for chunk in connections.chunks(batch_size.max(1)) {
            let rows = chunk.iter().cloned().map(connection_active_model);
            written += ConnectionEntity::insert_many(rows)
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;
        debug!(removed, written, "Replaced publication connections");

        Ok(written)
    }

    // ========================================================================
    // Read Operations
    // ========================================================================

    async fn count_publications(&self) -> Result<u64> {
        PublicationEntity::find()
            .count(self.conn())
            .await
            .map_err(Into::into)
    }

    async fn list_publications(&self, query: &PublicationQuery) -> Result<Vec<Publication>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            LIST_PUBLICATIONS_SQL,
            vec![
                query.search_pattern().into(),
                query.year_from.into(),
                query.year_to.into(),
                query.organisms.clone().into(),
                query.research_areas.clone().into(),
                (query.limit as i64).into(),
            ],
        );

        PublicationEntity::find()
            .from_raw_sql(stmt)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    async fn find_publication(&self, id: Uuid) -> Result<Option<Publication>> {
        PublicationEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    async fn filter_options(&self) -> Result<FilterOptions> {
        let rows: Vec<(Vec<String>, Option<String>, Option<String>)> = PublicationEntity::find()
            .select_only()
            .column(PublicationColumn::Organisms)
            .column(PublicationColumn::ResearchArea)
            .column(PublicationColumn::ExperimentType)
            .into_tuple()
            .all(self.conn())
            .await?;

        Ok(FilterOptions::collect(rows))
    }

    async fn first_publications(&self, limit: u64) -> Result<Vec<Publication>> {
        PublicationEntity::find()
            .order_by_asc(PublicationColumn::Id)
            .limit(limit)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    async fn connections_among(&self, ids: &[Uuid]) -> Result<Vec<PublicationConnection>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        ConnectionEntity::find()
            .filter(ConnectionColumn::SourcePublicationId.is_in(ids.iter().copied()))
            .filter(ConnectionColumn::TargetPublicationId.is_in(ids.iter().copied()))
            .all(self.conn())
            .await
            .map_err(Into::into)
    }
}
