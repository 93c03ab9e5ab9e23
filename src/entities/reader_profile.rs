//! Reader profile entity - A reader's configured rates.
//!
//! Per-minute rates are in cents per minute, one per metered mode; the
//! scheduled rates are a flat table keyed by appointment length. Prices read
//! from here are frozen into sessions, appointments and ledger entries at
//! charge time, so later rate edits never rewrite history.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reader profile database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reader_profiles")]
pub struct Model {
    /// Unique identifier for the profile
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning reader's user id; one profile per reader
    #[sea_orm(unique)]
    pub user_id: i64,
    /// Chat rate in cents per minute
    pub rate_chat_ppm: i64,
    /// Voice rate in cents per minute
    pub rate_voice_ppm: i64,
    /// Video rate in cents per minute
    pub rate_video_ppm: i64,
    /// Flat price in cents for a 15-minute appointment
    pub rate_scheduled_15: i64,
    /// Flat price in cents for a 30-minute appointment
    pub rate_scheduled_30: i64,
    /// Flat price in cents for a 45-minute appointment
    pub rate_scheduled_45: i64,
    /// Flat price in cents for a 60-minute appointment
    pub rate_scheduled_60: i64,
}

/// Profiles are looked up by reader id; no row-level relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
