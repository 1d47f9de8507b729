//! SeaORM entity models
//!
//! Database entities for SpaceBio

mod connection;
mod publication;

pub use publication::{
    Entity as PublicationEntity,
    Model as Publication,
    ActiveModel as PublicationActiveModel,
    Column as PublicationColumn,
    NewPublication,
};

pub use connection::{
    Entity as ConnectionEntity,
    Model as PublicationConnection,
    ActiveModel as ConnectionActiveModel,
    Column as ConnectionColumn,
    ConnectionType,
};
