//! Payout entry entity - Immutable record of one payout-balance change.
//!
//! Append-only, mirroring `ledger_entries` for the reader side of the dual
//! ledger. Revenue-split shares land as `credit` entries; a completed payout
//! transfer appends a single `payout` entry for the transferred amount.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Direction/classification of a payout ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
pub enum PayoutKind {
    /// Earned share credited to the reader
    #[sea_orm(string_value = "credit")]
    Credit,
    /// Correction decreasing the balance
    #[sea_orm(string_value = "debit")]
    Debit,
    /// Confirmed transfer out through the payment gateway
    #[sea_orm(string_value = "payout")]
    Payout,
}

/// Payout entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payout_entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Reader this entry applies to
    pub reader_id: i64,
    /// Direction of the balance change
    pub kind: PayoutKind,
    /// Magnitude of the change in cents, always positive
    pub amount_cents: i64,
    /// Kind of the originating reference, e.g. `"session"`, `"transfer"`
    pub ref_type: String,
    /// Identifier of the originating reference
    pub ref_id: String,
    /// When the entry was appended
    pub created_at: DateTimeUtc,
}

/// Entries reference their origin by (`ref_type`, `ref_id`), not a FK
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
