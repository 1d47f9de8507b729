//! Publication connection entity for the knowledge graph

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Heuristic that produced a connection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    SharedKeywords,
    SharedOrganism,
    SameResearchArea,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::SharedKeywords => "shared_keywords",
            ConnectionType::SharedOrganism => "shared_organism",
            ConnectionType::SameResearchArea => "same_research_area",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shared_keywords" => Ok(ConnectionType::SharedKeywords),
            "shared_organism" => Ok(ConnectionType::SharedOrganism),
            "same_research_area" => Ok(ConnectionType::SameResearchArea),
            other => Err(format!("unknown connection type: {other}")),
        }
    }
}

impl From<ConnectionType> for String {
    fn from(kind: ConnectionType) -> Self {
        kind.as_str().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "publication_connections")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub source_publication_id: Uuid,

    pub target_publication_id: Uuid,

    /// One of the `ConnectionType` names; checked by a table constraint
    #[sea_orm(column_type = "Text")]
    pub connection_type: String,

    /// Heuristic confidence in [0, 1]
    pub strength: f64,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Get the connection type as an enum
    pub fn kind(&self) -> Option<ConnectionType> {
        self.connection_type.parse().ok()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::publication::Entity",
        from = "Column::SourcePublicationId",
        to = "super::publication::Column::Id",
        on_delete = "Cascade"
    )]
    SourcePublication,

    #[sea_orm(
        belongs_to = "super::publication::Entity",
        from = "Column::TargetPublicationId",
        to = "super::publication::Column::Id",
        on_delete = "Cascade"
    )]
    TargetPublication,
}

// Joins from a publication go through the source side
impl Related<super::publication::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SourcePublication.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
