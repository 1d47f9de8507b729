//! Graph projection for rendering

use crate::db::models::{Publication, PublicationConnection};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Node size handed to the renderer
pub const DEFAULT_NODE_SIZE: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub research_area: Option<String>,
    pub val: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: Uuid,
    pub target: Uuid,
    #[serde(rename = "type")]
    pub link_type: String,
    pub strength: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl From<&Publication> for GraphNode {
    fn from(publication: &Publication) -> Self {
        Self {
            id: publication.id,
            title: publication.title.clone(),
            year: publication.year,
            research_area: publication
                .research_area
                .clone()
                .filter(|area| !area.is_empty()),
            val: DEFAULT_NODE_SIZE,
        }
    }
}

impl From<PublicationConnection> for GraphLink {
    fn from(connection: PublicationConnection) -> Self {
        Self {
            source: connection.source_publication_id,
            target: connection.target_publication_id,
            link_type: connection.connection_type,
            strength: connection.strength,
        }
    }
}

impl GraphData {
    /// Build the graph, keeping only links with both ends among `publications`
    pub fn build(publications: &[Publication], connections: Vec<PublicationConnection>) -> Self {
        let ids: HashSet<Uuid> = publications.iter().map(|p| p.id).collect();

        let nodes = publications.iter().map(GraphNode::from).collect();
        let links = connections
            .into_iter()
            .filter(|c| ids.contains(&c.source_publication_id) && ids.contains(&c.target_publication_id))
            .map(GraphLink::from)
            .collect();

        Self { nodes, links }
    }
}
