//! Knowledge graph over publications
//!
//! - `connections`: derives weighted edges from shared metadata
//! - `projection`: node/link views consumed by the graph renderer

mod connections;
mod projection;

pub use connections::{
    clamp_strength, derive_connections, ConnectionInput, DerivedConnection,
    DEFAULT_WINDOW, KEYWORD_SATURATION, ORGANISM_STRENGTH, RESEARCH_AREA_STRENGTH,
};
pub use projection::{GraphData, GraphLink, GraphNode, DEFAULT_NODE_SIZE};
