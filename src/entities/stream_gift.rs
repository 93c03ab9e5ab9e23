//! Stream gift entity - One gift transaction on a live stream.
//!
//! `amount_cents` is the gift's price at send time; catalog price changes do
//! not retroactively affect past sends.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stream gift database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stream_gifts")]
pub struct Model {
    /// Unique identifier for the send
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Stream session the gift was sent on
    pub session_id: i64,
    /// Sending client's user id
    pub sender_id: i64,
    /// Catalog gift that was sent
    pub gift_id: i64,
    /// Price in cents frozen at send time
    pub amount_cents: i64,
    /// When the gift was sent
    pub created_at: DateTimeUtc,
}

/// Defines relationships between StreamGift and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each send belongs to one session
    #[sea_orm(
        belongs_to = "super::session::Entity",
        from = "Column::SessionId",
        to = "super::session::Column::Id"
    )]
    Session,
    /// Each send references one catalog gift
    #[sea_orm(
        belongs_to = "super::gift::Entity",
        from = "Column::GiftId",
        to = "super::gift::Column::Id"
    )]
    Gift,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl Related<super::gift::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Gift.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
