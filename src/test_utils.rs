//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::wallet,
    entities::{gift, reader_profile, session, SessionMode, SessionStatus},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set, prelude::*};
use uuid::Uuid;

/// Default reader user id used by `setup_with_reader`.
pub const TEST_READER: i64 = 9;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a reader profile with the default rate card.
///
/// # Defaults
/// * chat 199 / voice 299 / video 399 cents per minute
/// * scheduled 15/30/45/60 minutes: 3000/6000/9000/12000 cents
pub async fn create_test_reader(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<reader_profile::Model> {
    let model = reader_profile::ActiveModel {
        user_id: Set(user_id),
        rate_chat_ppm: Set(199),
        rate_voice_ppm: Set(299),
        rate_video_ppm: Set(399),
        rate_scheduled_15: Set(3000),
        rate_scheduled_30: Set(6000),
        rate_scheduled_45: Set(9000),
        rate_scheduled_60: Set(12_000),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Sets up a complete test environment with one reader.
/// Returns (db, `reader_id`) for common test scenarios.
pub async fn setup_with_reader() -> Result<(DatabaseConnection, i64)> {
    let db = setup_test_db().await?;
    create_test_reader(&db, TEST_READER).await?;
    Ok((db, TEST_READER))
}

/// Funds a client wallet through the normal credit path.
pub async fn fund_wallet(
    db: &DatabaseConnection,
    owner_id: i64,
    amount_cents: i64,
) -> Result<crate::entities::wallet::Model> {
    wallet::credit(db, owner_id, amount_cents, "payment_intent", "test_topup").await
}

async fn insert_session(
    db: &DatabaseConnection,
    client_id: i64,
    reader_id: i64,
    mode: SessionMode,
    per_minute: bool,
) -> Result<session::Model> {
    let model = session::ActiveModel {
        session_uid: Set(Uuid::new_v4().simple().to_string()),
        reader_id: Set(reader_id),
        client_id: Set(client_id),
        mode: Set(mode),
        status: Set(SessionStatus::Active),
        started_at: Set(Some(Utc::now())),
        ended_at: Set(None),
        total_seconds: Set(0),
        amount_charged_cents: Set(0),
        per_minute: Set(per_minute),
        appointment_id: Set(None),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Creates an already-active per-minute session, as if accepted moments ago.
pub async fn create_active_session(
    db: &DatabaseConnection,
    client_id: i64,
    reader_id: i64,
    mode: SessionMode,
) -> Result<session::Model> {
    insert_session(db, client_id, reader_id, mode, true).await
}

/// Creates an active fixed-price session, as if started from an appointment.
pub async fn create_fixed_price_session(
    db: &DatabaseConnection,
    client_id: i64,
    reader_id: i64,
    mode: SessionMode,
) -> Result<session::Model> {
    insert_session(db, client_id, reader_id, mode, false).await
}

/// Creates an active catalog gift at the given price.
pub async fn create_test_gift(
    db: &DatabaseConnection,
    name: &str,
    price_cents: i64,
) -> Result<gift::Model> {
    let model = gift::ActiveModel {
        name: Set(name.to_string()),
        price_cents: Set(price_cents),
        image_url: Set(String::new()),
        active: Set(true),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}
