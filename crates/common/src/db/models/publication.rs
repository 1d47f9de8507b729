//! Publication entity

use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "publications")]
pub struct Model {
    /// UUIDv7, so ordering by id follows import order
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    pub authors: Vec<String>,

    pub year: Option<i32>,

    #[sea_orm(column_name = "abstract", column_type = "Text", nullable)]
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,

    pub keywords: Vec<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub doi: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub publication_url: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub nasa_task_book_url: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub osdr_url: Option<String>,

    pub organisms: Vec<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub experiment_type: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub research_area: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub findings: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::connection::Entity", on_delete = "Cascade")]
    ConnectionsFrom,
}

impl Related<super::connection::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConnectionsFrom.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A publication row as parsed from the import source, before it has an id
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPublication {
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub keywords: Vec<String>,
    pub doi: Option<String>,
    pub publication_url: Option<String>,
    pub organisms: Vec<String>,
    pub experiment_type: Option<String>,
    pub research_area: Option<String>,
}

impl NewPublication {
    /// Materialize the stored row with a fresh id and timestamps
    pub fn into_model(self, now: chrono::DateTime<chrono::Utc>) -> Model {
        Model {
            id: Uuid::now_v7(),
            title: self.title,
            authors: self.authors,
            year: self.year,
            abstract_text: self.abstract_text,
            keywords: self.keywords,
            doi: self.doi,
            publication_url: self.publication_url,
            nasa_task_book_url: None,
            osdr_url: None,
            organisms: self.organisms,
            experiment_type: self.experiment_type,
            research_area: self.research_area,
            findings: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }
}

impl Model {
    /// Active model with every column `Set`, for inserts
    pub fn into_insert(self) -> ActiveModel {
        ActiveModel {
            id: Set(self.id),
            title: Set(self.title),
            authors: Set(self.authors),
            year: Set(self.year),
            abstract_text: Set(self.abstract_text),
            keywords: Set(self.keywords),
            doi: Set(self.doi),
            publication_url: Set(self.publication_url),
            nasa_task_book_url: Set(self.nasa_task_book_url),
            osdr_url: Set(self.osdr_url),
            organisms: Set(self.organisms),
            experiment_type: Set(self.experiment_type),
            research_area: Set(self.research_area),
            findings: Set(self.findings),
            created_at: Set(self.created_at),
            updated_at: Set(self.updated_at),
        }
    }
}
