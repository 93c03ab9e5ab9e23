//! Ledger entry entity - Immutable record of one wallet balance change.
//!
//! The ledger is append-only: rows are never mutated or deleted, and the
//! wallet balance can be reconstructed by applying each entry with its kind's
//! sign. `amount_cents` is always positive; the kind determines direction.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Direction/classification of a wallet ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
pub enum LedgerKind {
    /// Balance increase (deposit or earned credit)
    #[sea_orm(string_value = "credit")]
    Credit,
    /// Balance decrease (charge)
    #[sea_orm(string_value = "debit")]
    Debit,
    /// Balance increase returning a prior charge
    #[sea_orm(string_value = "refund")]
    Refund,
    /// Operator correction, either direction by context
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
}

/// Ledger entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Wallet owner this entry applies to
    pub owner_id: i64,
    /// Direction of the balance change
    pub kind: LedgerKind,
    /// Magnitude of the change in cents, always positive
    pub amount_cents: i64,
    /// Kind of the originating reference, e.g. `"session"`, `"appointment"`
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
