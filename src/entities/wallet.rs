//! Wallet entity - A client's spendable balance.
//!
//! One row per owner, created lazily on first touch. The balance is held in
//! integer cents and never goes negative at rest; every change to it has a
//! matching row in `ledger_entries`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Wallet database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    /// Unique identifier for the wallet
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning client's user id; one wallet per owner
    #[sea_orm(unique)]
    pub owner_id: i64,
    /// Current spendable balance in cents
    pub balance_cents: i64,
    /// When the balance last changed
    pub updated_at: DateTimeUtc,
}

/// Wallets are linked to ledger entries by owner id, not a row-level FK
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
