//! Availability block entity - A reader's open booking window.
//!
//! Blocks for one reader never overlap; the invariant is enforced at
//! creation time. Bookings must fall entirely inside one block.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Availability block database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "availability_blocks")]
pub struct Model {
    /// Unique identifier for the block
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Reader this window belongs to
    pub reader_id: i64,
    /// Window opens (UTC)
    pub start_time: DateTimeUtc,
    /// Window closes (UTC)
    pub end_time: DateTimeUtc,
    /// IANA timezone name the reader entered the window in
    pub timezone: String,
}

/// Blocks are queried by reader id; no row-level relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
