//! Session entity - One live interaction instance between a client and a reader.
//!
//! Status transitions are monotone: `requested -> active -> ended`, with
//! `canceled` reachable only from `requested`. The accumulated fields
//! (`total_seconds`, `amount_charged_cents`) only increase while the session
//! is active, advanced by the billing ticker in the same unit as each debit.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Interaction mode of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum SessionMode {
    /// Text chat, billed per minute
    #[sea_orm(string_value = "chat")]
    Chat,
    /// Voice call, billed per minute
    #[sea_orm(string_value = "voice")]
    Voice,
    /// Video call, billed per minute
    #[sea_orm(string_value = "video")]
    Video,
    /// Live stream, funded by gifts rather than metering
    #[sea_orm(string_value = "stream")]
    Stream,
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum SessionStatus {
    /// Created by the client, waiting on the assigned reader
    #[sea_orm(string_value = "requested")]
    Requested,
    /// Accepted and live; the only billable state
    #[sea_orm(string_value = "active")]
    Active,
    /// Finished by a participant or by the ticker; terminal
    #[sea_orm(string_value = "ended")]
    Ended,
    /// Rejected before ever going live; terminal
    #[sea_orm(string_value = "canceled")]
    Canceled,
}

/// Session database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    /// Unique identifier for the session row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Opaque public identifier used in references and presence keys
    #[sea_orm(unique)]
    pub session_uid: String,
    /// Assigned reader's user id
    pub reader_id: i64,
    /// Requesting client's user id (the reader itself for streams)
    pub client_id: i64,
    /// Interaction mode
    pub mode: SessionMode,
    /// Current lifecycle state
    pub status: SessionStatus,
    /// When the session went active, if it ever did
    pub started_at: Option<DateTimeUtc>,
    /// When the session reached a terminal state
    pub ended_at: Option<DateTimeUtc>,
    /// Billed time so far, advanced 60s per successful tick
    pub total_seconds: i64,
    /// Total charged so far in cents
    pub amount_charged_cents: i64,
    /// Metering mode: true = per-minute ticking, false = fixed price
    pub per_minute: bool,
    /// Link to the appointment that materialized this session, if any
    pub appointment_id: Option<i64>,
}

/// Defines relationships between Session and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One session receives many stream gifts
    #[sea_orm(has_many = "super::stream_gift::Entity")]
    StreamGifts,
    /// A session may have been materialized from an appointment
    #[sea_orm(
        belongs_to = "super::appointment::Entity",
        from = "Column::AppointmentId",
        to = "super::appointment::Column::Id"
    )]
    Appointment,
}

impl Related<super::stream_gift::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StreamGifts.def()
    }
}

impl Related<super::appointment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Appointment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
