//! Gift entity - Catalog of sendable stream gifts.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Gift catalog database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gifts")]
pub struct Model {
    /// Unique identifier for the gift
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, e.g. "Rose"
    pub name: String,
    /// Current price in cents; past sends keep the price they were sent at
    pub price_cents: i64,
    /// Display artwork URL or glyph
    pub image_url: String,
    /// Whether the gift is currently sendable
    pub active: bool,
}

/// Defines relationships between Gift and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One catalog gift appears in many sends
    #[sea_orm(has_many = "super::stream_gift::Entity")]
    StreamGifts,
}

impl Related<super::stream_gift::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StreamGifts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
