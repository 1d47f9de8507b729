//! Knowledge graph projection

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use spacebio_common::{
    errors::{AppError, Result},
    graph::GraphData,
};

pub const DEFAULT_GRAPH_LIMIT: u64 = 100;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct GraphParams {
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u64>,
}

/// First `limit` publications as nodes, plus every connection between them
pub async fn get_graph(
    State(state): State<AppState>,
    params: std::result::Result<Query<GraphParams>, QueryRejection>,
) -> Result<Json<GraphData>> {
    let Query(params) = params.map_err(|rejection| AppError::InvalidFormat {
        message: rejection.body_text(),
    })?;

    params.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("limit".to_string()),
    })?;

    let publications = state
        .store
        .first_publications(params.limit.unwrap_or(DEFAULT_GRAPH_LIMIT))
        .await?;

    let ids: Vec<Uuid> = publications.iter().map(|p| p.id).collect();
    let connections = state.store.connections_among(&ids).await?;

    let graph = GraphData::build(&publications, connections);

    tracing::debug!(
        nodes = graph.nodes.len(),
        links = graph.links.len(),
        "Graph projection built"
    );

    Ok(Json(graph))
}
