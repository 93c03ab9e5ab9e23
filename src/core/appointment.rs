//! Appointment business logic - booking, cancellation refunds, start, completion.
//!
//! Funds are held against the booking, not the eventual session: the client
//! pays the full fixed price when booking, cancellation refunds by the tier
//! policy, and the reader is credited only on completion. Starting an
//! appointment materializes one fixed-price session, idempotently.

use crate::{
    entities::{
        Appointment, AppointmentStatus, LedgerKind, ReaderProfile, Session, SessionMode,
        SessionStatus, appointment, reader_profile, session,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use uuid::Uuid;

use super::{revenue, wallet};

/// Bookable lengths in minutes, each with its own column in the rate table.
pub const ALLOWED_LENGTHS: [i32; 4] = [15, 30, 45, 60];

/// Cancellation this many seconds before start refunds in full.
const FULL_REFUND_LEAD_SECS: i64 = 24 * 3600;
/// Cancellation this many seconds before start refunds half; closer refunds nothing.
const HALF_REFUND_LEAD_SECS: i64 = 3600;

/// Looks up an appointment by its public booking uid.
pub async fn get_appointment(
    db: &DatabaseConnection,
    booking_uid: &str,
) -> Result<appointment::Model> {
    Appointment::find()
        .filter(appointment::Column::BookingUid.eq(booking_uid))
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "appointment",
            id: booking_uid.to_string(),
        })
}

/// The fixed price for one booked length from the reader's rate table.
pub fn price_for_length(profile: &reader_profile::Model, length_minutes: i32) -> Result<i64> {
    match length_minutes {
        15 => Ok(profile.rate_scheduled_15),
        30 => Ok(profile.rate_scheduled_30),
        45 => Ok(profile.rate_scheduled_45),
        60 => Ok(profile.rate_scheduled_60),
        other => Err(Error::Config {
            message: format!("invalid appointment length: {other} minutes"),
        }),
    }
}

/// Books an appointment, debiting the client for the full price immediately.
///
/// Requires an availability block fully covering the slot and no overlapping
/// `scheduled`/`in_progress` appointment for the reader. The debit and the
/// appointment insert are one atomic unit, and the debit is tagged with the
/// booking uid minted up front.
pub async fn book_appointment(
    db: &DatabaseConnection,
    client_id: i64,
    reader_id: i64,
    mode: SessionMode,
    length_minutes: i32,
    start_time: DateTime<Utc>,
) -> Result<appointment::Model> {
    if mode == SessionMode::Stream {
        return Err(Error::Config {
            message: "streams cannot be booked as appointments".to_string(),
        });
    }
    if !ALLOWED_LENGTHS.contains(&length_minutes) {
        return Err(Error::Config {
            message: format!("invalid appointment length: {length_minutes} minutes"),
        });
    }
    let end_time = start_time + Duration::minutes(i64::from(length_minutes));

    let profile = ReaderProfile::find()
        .filter(reader_profile::Column::UserId.eq(reader_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "reader",
            id: reader_id.to_string(),
        })?;
    let price_cents = price_for_length(&profile, length_minutes)?;

    if super::availability::covering_block(db, reader_id, start_time, end_time)
        .await?
        .is_none()
    {
        return Err(Error::SchedulingConflict {
            message: "requested time is outside the reader's availability".to_string(),
        });
    }

    let overlapping = Appointment::find()
        .filter(appointment::Column::ReaderId.eq(reader_id))
        .filter(
            appointment::Column::Status
                .is_in([AppointmentStatus::Scheduled, AppointmentStatus::InProgress]),
        )
        .filter(appointment::Column::StartTime.lt(end_time))
        .filter(appointment::Column::EndTime.gt(start_time))
        .count(db)
        .await?;
    if overlapping > 0 {
        return Err(Error::SchedulingConflict {
            message: "reader already has a booking in that slot".to_string(),
        });
    }

    let booking_uid = Uuid::new_v4().simple().to_string();

    // One atomic unit: the client pays and the booking exists, or neither
    let txn = db.begin().await?;
    wallet::apply_debit(&txn, client_id, price_cents, "appointment", &booking_uid).await?;
    let created = appointment::ActiveModel {
        booking_uid: Set(booking_uid),
        reader_id: Set(reader_id),
        client_id: Set(client_id),
        length_minutes: Set(length_minutes),
        mode: Set(mode),
        price_cents: Set(price_cents),
        start_time: Set(start_time),
        end_time: Set(end_time),
        status: Set(AppointmentStatus::Scheduled),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok(created)
}

/// The refund percentage for canceling `lead` before start: 100 at >= 24h,
/// 50 at >= 1h, otherwise 0.
#[must_use]
pub fn refund_percent(lead: Duration) -> i64 {
    let lead_secs = lead.num_seconds();
    if lead_secs >= FULL_REFUND_LEAD_SECS {
        100
    } else if lead_secs >= HALF_REFUND_LEAD_SECS {
        50
    } else {
        0
    }
}

/// Cancels a `scheduled` appointment, refunding the client by the tier
/// policy. Permitted for the client, the assigned reader, or an operator.
/// Returns the refunded amount in cents.
pub async fn cancel_appointment(
    db: &DatabaseConnection,
    actor_id: i64,
    is_operator: bool,
    booking_uid: &str,
) -> Result<i64> {
    use sea_orm::sea_query::Expr;

    let appt = get_appointment(db, booking_uid).await?;
    if actor_id != appt.client_id && actor_id != appt.reader_id && !is_operator {
        return Err(Error::NotAuthorized {
            message: "only the client, the reader or an operator can cancel".to_string(),
        });
    }
    if appt.status != AppointmentStatus::Scheduled {
        return Err(Error::InvalidTransition {
            message: format!("appointment {booking_uid} can no longer be canceled"),
        });
    }

    let refund_cents = appt.price_cents * refund_percent(appt.start_time - Utc::now()) / 100;

    let txn = db.begin().await?;
    // Claim the transition first so a raced cancel can't refund twice
    let update = Appointment::update_many()
        .col_expr(
            appointment::Column::Status,
            Expr::value(AppointmentStatus::Canceled),
        )
        .filter(appointment::Column::Id.eq(appt.id))
        .filter(appointment::Column::Status.eq(AppointmentStatus::Scheduled))
        .exec(&txn)
        .await?;
    if update.rows_affected == 0 {
        txn.rollback().await?;
        return Err(Error::InvalidTransition {
            message: format!("appointment {booking_uid} can no longer be canceled"),
        });
    }
    if refund_cents > 0 {
        wallet::apply_credit(
            &txn,
            appt.client_id,
            refund_cents,
            LedgerKind::Refund,
            "appointment",
            booking_uid,
        )
        .await?;
    }
    txn.commit().await?;

    Ok(refund_cents)
}

/// Starts an appointment, materializing (or reusing) its fixed-price session.
///
/// Permitted for either party from `start_time - grace` onward, from
/// `scheduled` or `in_progress`. Idempotent: repeated starts return the same
/// session.
pub async fn start_appointment(
    db: &DatabaseConnection,
    actor_id: i64,
    booking_uid: &str,
    start_grace_mins: i64,
) -> Result<session::Model> {
    use sea_orm::sea_query::Expr;

    let appt = get_appointment(db, booking_uid).await?;
    if actor_id != appt.client_id && actor_id != appt.reader_id {
        return Err(Error::NotAuthorized {
            message: "only a participant can start the appointment".to_string(),
        });
    }
    if Utc::now() < appt.start_time - Duration::minutes(start_grace_mins) {
        return Err(Error::InvalidTransition {
            message: format!("appointment {booking_uid} cannot start yet"),
        });
    }
    if appt.status != AppointmentStatus::Scheduled && appt.status != AppointmentStatus::InProgress {
        return Err(Error::InvalidTransition {
            message: format!("appointment {booking_uid} is not startable"),
        });
    }

    if let Some(existing) = session_for_appointment(db, appt.id).await? {
        return Ok(existing);
    }

    let txn = db.begin().await?;
    // Claim the transition; the winner materializes the session
    let update = Appointment::update_many()
        .col_expr(
            appointment::Column::Status,
            Expr::value(AppointmentStatus::InProgress),
        )
        .filter(appointment::Column::Id.eq(appt.id))
        .filter(appointment::Column::Status.eq(AppointmentStatus::Scheduled))
        .exec(&txn)
        .await?;
    if update.rows_affected == 0 {
        txn.rollback().await?;
        // A concurrent start won; hand back its session
        return session_for_appointment(db, appt.id)
            .await?
            .ok_or_else(|| Error::InvalidTransition {
                message: format!("appointment {booking_uid} is not startable"),
            });
    }

    let created = session::ActiveModel {
        session_uid: Set(Uuid::new_v4().simple().to_string()),
        reader_id: Set(appt.reader_id),
        client_id: Set(appt.client_id),
        mode: Set(appt.mode),
        status: Set(SessionStatus::Active),
        started_at: Set(Some(Utc::now())),
        ended_at: Set(None),
        total_seconds: Set(0),
        amount_charged_cents: Set(0),
        per_minute: Set(false),
        appointment_id: Set(Some(appt.id)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok(created)
}

async fn session_for_appointment(
    db: &DatabaseConnection,
    appointment_id: i64,
) -> Result<Option<session::Model>> {
    Session::find()
        .filter(session::Column::AppointmentId.eq(appointment_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Marks an `in_progress` appointment completed and credits the reader.
///
/// Invoked by the external collaborator once the reading is done. The client
/// already paid at booking time, so no debit occurs here: the full price is
/// the gross amount fed to the revenue split.
pub async fn complete_appointment(
    db: &DatabaseConnection,
    booking_uid: &str,
    reader_share_pct: u32,
) -> Result<i64> {
    use sea_orm::sea_query::Expr;

    let appt = get_appointment(db, booking_uid).await?;
    if appt.status != AppointmentStatus::InProgress {
        return Err(Error::InvalidTransition {
            message: format!("appointment {booking_uid} is not in progress"),
        });
    }

    let txn = db.begin().await?;
    let update = Appointment::update_many()
        .col_expr(
            appointment::Column::Status,
            Expr::value(AppointmentStatus::Completed),
        )
        .filter(appointment::Column::Id.eq(appt.id))
        .filter(appointment::Column::Status.eq(AppointmentStatus::InProgress))
        .exec(&txn)
        .await?;
    if update.rows_affected == 0 {
        txn.rollback().await?;
        return Err(Error::InvalidTransition {
            message: format!("appointment {booking_uid} is not in progress"),
        });
    }
    let share = revenue::split_to_reader(
        &txn,
        appt.reader_id,
        appt.price_cents,
        reader_share_pct,
        "appointment",
        booking_uid,
    )
    .await?;
    txn.commit().await?;

    Ok(share)
}

/// A client's appointments: upcoming (`scheduled`/`in_progress`, soonest
/// first) and recent history (terminal states, latest first, capped at 50).
pub async fn appointments_for_client(
    db: &DatabaseConnection,
    client_id: i64,
) -> Result<(Vec<appointment::Model>, Vec<appointment::Model>)> {
    let upcoming = Appointment::find()
        .filter(appointment::Column::ClientId.eq(client_id))
        .filter(
            appointment::Column::Status
                .is_in([AppointmentStatus::Scheduled, AppointmentStatus::InProgress]),
        )
        .order_by_asc(appointment::Column::StartTime)
        .all(db)
        .await?;
    let history = Appointment::find()
        .filter(appointment::Column::ClientId.eq(client_id))
        .filter(
            appointment::Column::Status
                .is_in([AppointmentStatus::Completed, AppointmentStatus::Canceled]),
        )
        .order_by_desc(appointment::Column::StartTime)
        .limit(50)
        .all(db)
        .await?;
    Ok((upcoming, history))
}

/// A reader's upcoming appointments, soonest first.
pub async fn upcoming_for_reader(
    db: &DatabaseConnection,
    reader_id: i64,
) -> Result<Vec<appointment::Model>> {
    Appointment::find()
        .filter(appointment::Column::ReaderId.eq(reader_id))
        .filter(
            appointment::Column::Status
                .is_in([AppointmentStatus::Scheduled, AppointmentStatus::InProgress]),
        )
        .order_by_asc(appointment::Column::StartTime)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::wallet::{balance, ledger};
    use crate::test_utils::*;

    const CLIENT: i64 = 1;

    async fn bookable(
        db: &DatabaseConnection,
        reader_id: i64,
        lead: Duration,
    ) -> Result<appointment::Model> {
        let start = Utc::now() + lead;
        crate::core::availability::add_block(
            db,
            reader_id,
            start - Duration::hours(1),
            start + Duration::hours(2),
            "UTC",
        )
        .await?;
        book_appointment(db, CLIENT, reader_id, SessionMode::Chat, 30, start).await
    }

    #[tokio::test]
    async fn test_book_debits_full_price_up_front() -> Result<()> {
        let (db, reader_id) = setup_with_reader().await?;
        fund_wallet(&db, CLIENT, 10_000).await?;

        let appt = bookable(&db, reader_id, Duration::hours(25)).await?;
        assert_eq!(appt.status, AppointmentStatus::Scheduled);
        assert_eq!(appt.price_cents, 6000); // 30-minute table rate
        assert_eq!(appt.end_time - appt.start_time, Duration::minutes(30));

        assert_eq!(balance(&db, CLIENT).await?, 4000);
        let entries = ledger(&db, CLIENT).await?;
        assert_eq!(entries[0].kind, LedgerKind::Debit);
        assert_eq!(entries[0].ref_type, "appointment");
        assert_eq!(entries[0].ref_id, appt.booking_uid);

        Ok(())
    }

    #[tokio::test]
    async fn test_book_requires_availability() -> Result<()> {
        let (db, reader_id) = setup_with_reader().await?;
        fund_wallet(&db, CLIENT, 10_000).await?;

        let start = Utc::now() + Duration::hours(25);
        let result = book_appointment(&db, CLIENT, reader_id, SessionMode::Chat, 30, start).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::SchedulingConflict { .. }
        ));
        // Nothing was debited
        assert_eq!(balance(&db, CLIENT).await?, 10_000);

        Ok(())
    }

    #[tokio::test]
    async fn test_book_rejects_overlapping_slot() -> Result<()> {
        let (db, reader_id) = setup_with_reader().await?;
        fund_wallet(&db, CLIENT, 20_000).await?;
        fund_wallet(&db, 2, 20_000).await?;

        let appt = bookable(&db, reader_id, Duration::hours(25)).await?;

        // Another client wants a slot overlapping the booked one
        let result = book_appointment(
            &db,
            2,
            reader_id,
            SessionMode::Voice,
            30,
            appt.start_time + Duration::minutes(15),
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::SchedulingConflict { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_book_insufficient_funds_creates_nothing() -> Result<()> {
        let (db, reader_id) = setup_with_reader().await?;
        fund_wallet(&db, CLIENT, 100).await?;

        let result = bookable(&db, reader_id, Duration::hours(25)).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientFunds { .. }
        ));
        let (upcoming, history) = appointments_for_client(&db, CLIENT).await?;
        assert!(upcoming.is_empty() && history.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_book_rejects_invalid_length() -> Result<()> {
        let (db, reader_id) = setup_with_reader().await?;
        let start = Utc::now() + Duration::hours(25);

        let result = book_appointment(&db, CLIENT, reader_id, SessionMode::Chat, 20, start).await;
        assert!(matches!(result.unwrap_err(), Error::Config { .. }));

        Ok(())
    }

    #[test]
    fn test_refund_tiers() {
        assert_eq!(refund_percent(Duration::hours(25)), 100);
        assert_eq!(refund_percent(Duration::hours(24)), 100);
        assert_eq!(refund_percent(Duration::hours(2)), 50);
        assert_eq!(refund_percent(Duration::hours(1)), 50);
        assert_eq!(refund_percent(Duration::minutes(30)), 0);
        assert_eq!(refund_percent(Duration::minutes(-5)), 0);
    }

    #[tokio::test]
    async fn test_cancel_25h_before_refunds_in_full() -> Result<()> {
        let (db, reader_id) = setup_with_reader().await?;
        fund_wallet(&db, CLIENT, 6000).await?;
        let appt = bookable(&db, reader_id, Duration::hours(25)).await?;
        assert_eq!(balance(&db, CLIENT).await?, 0);

        let refund = cancel_appointment(&db, CLIENT, false, &appt.booking_uid).await?;
        assert_eq!(refund, 6000);
        assert_eq!(balance(&db, CLIENT).await?, 6000);

        let refreshed = get_appointment(&db, &appt.booking_uid).await?;
        assert_eq!(refreshed.status, AppointmentStatus::Canceled);
        let entries = ledger(&db, CLIENT).await?;
        assert_eq!(entries[0].kind, LedgerKind::Refund);
        assert_eq!(entries[0].amount_cents, 6000);

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_2h_before_refunds_half() -> Result<()> {
        let (db, reader_id) = setup_with_reader().await?;
        fund_wallet(&db, CLIENT, 6000).await?;
        let appt = bookable(&db, reader_id, Duration::hours(2)).await?;

        let refund = cancel_appointment(&db, CLIENT, false, &appt.booking_uid).await?;
        assert_eq!(refund, 3000);
        assert_eq!(balance(&db, CLIENT).await?, 3000);

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_30m_before_refunds_nothing() -> Result<()> {
        let (db, reader_id) = setup_with_reader().await?;
        fund_wallet(&db, CLIENT, 6000).await?;
        let appt = bookable(&db, reader_id, Duration::minutes(30)).await?;

        let refund = cancel_appointment(&db, CLIENT, false, &appt.booking_uid).await?;
        assert_eq!(refund, 0);
        assert_eq!(balance(&db, CLIENT).await?, 0);
        // No zero-amount refund entry was appended
        let entries = ledger(&db, CLIENT).await?;
        assert!(entries.iter().all(|e| e.kind != LedgerKind::Refund));

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_authorization() -> Result<()> {
        let (db, reader_id) = setup_with_reader().await?;
        fund_wallet(&db, CLIENT, 12_000).await?;
        let appt = bookable(&db, reader_id, Duration::hours(25)).await?;

        // A stranger cannot cancel
        let result = cancel_appointment(&db, 42, false, &appt.booking_uid).await;
        assert!(matches!(result.unwrap_err(), Error::NotAuthorized { .. }));

        // An operator can
        let refund = cancel_appointment(&db, 42, true, &appt.booking_uid).await?;
        assert_eq!(refund, 6000);

        // Canceling again is invalid, not a second refund
        let result = cancel_appointment(&db, CLIENT, false, &appt.booking_uid).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidTransition { .. }
        ));
        assert_eq!(balance(&db, CLIENT).await?, 12_000);

        Ok(())
    }

    #[tokio::test]
    async fn test_start_too_early_is_invalid() -> Result<()> {
        let (db, reader_id) = setup_with_reader().await?;
        fund_wallet(&db, CLIENT, 6000).await?;
        let appt = bookable(&db, reader_id, Duration::hours(2)).await?;

        let result = start_appointment(&db, CLIENT, &appt.booking_uid, 5).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidTransition { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_start_is_idempotent_and_fixed_price() -> Result<()> {
        let (db, reader_id) = setup_with_reader().await?;
        fund_wallet(&db, CLIENT, 6000).await?;
        // Starts within the 5-minute grace window
        let appt = bookable(&db, reader_id, Duration::minutes(2)).await?;

        let sess = start_appointment(&db, CLIENT, &appt.booking_uid, 5).await?;
        assert_eq!(sess.status, SessionStatus::Active);
        assert!(!sess.per_minute);
        assert_eq!(sess.appointment_id, Some(appt.id));

        let refreshed = get_appointment(&db, &appt.booking_uid).await?;
        assert_eq!(refreshed.status, AppointmentStatus::InProgress);

        // Starting again (the other party joining) reuses the same session
        let again = start_appointment(&db, reader_id, &appt.booking_uid, 5).await?;
        assert_eq!(again.session_uid, sess.session_uid);

        Ok(())
    }

    #[tokio::test]
    async fn test_start_authorization() -> Result<()> {
        let (db, reader_id) = setup_with_reader().await?;
        fund_wallet(&db, CLIENT, 6000).await?;
        let appt = bookable(&db, reader_id, Duration::minutes(2)).await?;

        let result = start_appointment(&db, 42, &appt.booking_uid, 5).await;
        assert!(matches!(result.unwrap_err(), Error::NotAuthorized { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_complete_credits_reader_share() -> Result<()> {
        let (db, reader_id) = setup_with_reader().await?;
        fund_wallet(&db, CLIENT, 6000).await?;
        let appt = bookable(&db, reader_id, Duration::minutes(2)).await?;

        // Cannot complete before starting
        let result = complete_appointment(&db, &appt.booking_uid, 70).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidTransition { .. }
        ));

        start_appointment(&db, CLIENT, &appt.booking_uid, 5).await?;
        let share = complete_appointment(&db, &appt.booking_uid, 70).await?;
        assert_eq!(share, 4200); // floor(6000 * 70 / 100)
        assert_eq!(
            crate::core::revenue::payout_balance_of(&db, reader_id).await?,
            4200
        );

        // Completing twice is invalid, not a double credit
        let result = complete_appointment(&db, &appt.booking_uid, 70).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidTransition { .. }
        ));

        Ok(())
    }
}
