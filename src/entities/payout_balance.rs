//! Payout balance entity - A reader's earned-but-unpaid balance.
//!
//! The second half of the dual ledger: revenue-split credits accumulate here
//! until the payout runner transfers them out, zeroing the balance in the
//! same unit as the `payout` ledger entry.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payout balance database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payout_balances")]
pub struct Model {
    /// Unique identifier for the balance row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning reader's user id; one balance per reader
    #[sea_orm(unique)]
    pub owner_id: i64,
    /// Earned-but-unpaid balance in cents
    pub balance_cents: i64,
    /// When the balance last changed
    pub updated_at: DateTimeUtc,
}

/// Linked to payout entries by reader id, not a row-level FK
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
