//! Appointment entity - A scheduled, prepaid booking.
//!
//! The price is fixed from the reader's length-rate table at booking time and
//! debited immediately; the reader is credited only on completion, which keeps
//! the tiered refund policy a pure wallet credit.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AppointmentStatus {
    /// Booked and paid, waiting for its start window
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    /// A fixed-price session has been materialized
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    /// Marked done by the external collaborator; reader credited
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Canceled before starting, refunded per the tier policy
    #[sea_orm(string_value = "canceled")]
    Canceled,
}

/// Appointment database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "appointments")]
pub struct Model {
    /// Unique identifier for the appointment row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Opaque public identifier used in ledger references
    #[sea_orm(unique)]
    pub booking_uid: String,
    /// Booked reader's user id
    pub reader_id: i64,
    /// Booking client's user id
    pub client_id: i64,
    /// Booked length in minutes: 15, 30, 45 or 60
    pub length_minutes: i32,
    /// Interaction mode for the materialized session
    pub mode: super::session::SessionMode,
    /// Price in cents, fixed at booking time
    pub price_cents: i64,
    /// Scheduled start; always before `end_time`
    pub start_time: DateTimeUtc,
    /// Scheduled end, `start_time + length`
    pub end_time: DateTimeUtc,
    /// Current lifecycle state
    pub status: AppointmentStatus,
}

/// Defines relationships between Appointment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Starting an appointment materializes one session
    #[sea_orm(has_many = "super::session::Entity")]
    Sessions,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
