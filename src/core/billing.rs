//! Billing business logic - the per-minute charge primitive.
//!
//! One tick of one session is a single atomic unit: claim the accumulation
//! (guarded on the totals the ticker observed), debit the client, credit the
//! reader's share. The guard is what makes exactly-one-charge-per-tick hold -
//! two ticker runs racing over the same session resolve to one debit, because
//! the loser's claim matches zero rows and it backs off without touching the
//! wallet.
//!
//! Running out of funds is the one automatic termination trigger: the failed
//! debit rolls the whole unit back and the session is ended instead.

use crate::{
    config::policy::BillingPolicy,
    entities::{
        ReaderProfile, Session, SessionMode, SessionStatus, reader_profile, session,
    },
    errors::{Error, Result},
    presence::PresenceTracker,
};
use sea_orm::{TransactionTrait, prelude::*};
use tracing::debug;

use super::{revenue, session as session_ops, wallet};

/// Seconds of billed time one successful tick adds.
pub const TICK_SECONDS: i64 = 60;

/// What happened to one session on one billing tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The client was debited one rate-unit and the session accumulated
    Billed {
        /// The per-minute rate charged, in cents
        rate_cents: i64,
    },
    /// Either participant's presence signal was absent; deferred, not an error
    SkippedPresence,
    /// Another ticker run already billed this minute; nothing charged
    Superseded,
    /// The debit failed on funds and the session was ended
    EndedInsufficientFunds,
}

/// Resolves the reader's configured per-minute rate for a session mode.
pub fn per_minute_rate(profile: &reader_profile::Model, mode: SessionMode) -> Result<i64> {
    match mode {
        SessionMode::Chat => Ok(profile.rate_chat_ppm),
        SessionMode::Voice => Ok(profile.rate_voice_ppm),
        SessionMode::Video => Ok(profile.rate_video_ppm),
        SessionMode::Stream => Err(Error::Config {
            message: "stream sessions are gift-funded, not metered".to_string(),
        }),
    }
}

/// Snapshot of every session the ticker should consider this tick.
pub async fn active_per_minute_sessions(db: &DatabaseConnection) -> Result<Vec<session::Model>> {
    Session::find()
        .filter(session::Column::Status.eq(SessionStatus::Active))
        .filter(session::Column::PerMinute.eq(true))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Bills one minute against a session snapshot.
///
/// The accumulation claim is filtered on the snapshot's `total_seconds`, so a
/// snapshot made stale by a concurrent tick (or a concurrent end) claims
/// nothing and returns [`TickOutcome::Superseded`] without charging.
pub async fn bill_session_minute(
    db: &DatabaseConnection,
    sess: &session::Model,
    rate_cents: i64,
    reader_share_pct: u32,
) -> Result<TickOutcome> {
    use sea_orm::sea_query::Expr;

    let txn = db.begin().await?;

    let claim = Session::update_many()
        .col_expr(
            session::Column::TotalSeconds,
            Expr::col(session::Column::TotalSeconds).add(TICK_SECONDS),
        )
        .col_expr(
            session::Column::AmountChargedCents,
            Expr::col(session::Column::AmountChargedCents).add(rate_cents),
        )
        .filter(session::Column::Id.eq(sess.id))
        .filter(session::Column::Status.eq(SessionStatus::Active))
        .filter(session::Column::TotalSeconds.eq(sess.total_seconds))
        .exec(&txn)
        .await?;
    if claim.rows_affected == 0 {
        txn.rollback().await?;
        return Ok(TickOutcome::Superseded);
    }

    match wallet::apply_debit(&txn, sess.client_id, rate_cents, "session", &sess.session_uid).await
    {
        Ok(_) => {}
        Err(Error::InsufficientFunds { .. }) => {
            // The whole tick unwinds; the session ends instead of charging
            txn.rollback().await?;
            session_ops::end_for_billing(db, &sess.session_uid).await?;
            return Ok(TickOutcome::EndedInsufficientFunds);
        }
        Err(e) => {
            txn.rollback().await?;
            return Err(e);
        }
    }

    revenue::split_to_reader(
        &txn,
        sess.reader_id,
        rate_cents,
        reader_share_pct,
        "session",
        &sess.session_uid,
    )
    .await?;

    txn.commit().await?;
    Ok(TickOutcome::Billed { rate_cents })
}

/// One session's share of one ticker run: presence gate, rate resolution,
/// then the billing unit.
pub async fn tick_session(
    db: &DatabaseConnection,
    presence: &PresenceTracker,
    policy: &BillingPolicy,
    sess: &session::Model,
) -> Result<TickOutcome> {
    if !presence.both_present(&sess.session_uid, sess.client_id, sess.reader_id) {
        debug!(session = %sess.session_uid, "presence absent, tick skipped");
        return Ok(TickOutcome::SkippedPresence);
    }

    let profile = ReaderProfile::find()
        .filter(reader_profile::Column::UserId.eq(sess.reader_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "reader",
            id: sess.reader_id.to_string(),
        })?;
    let rate_cents = per_minute_rate(&profile, sess.mode)?;

    bill_session_minute(db, sess, rate_cents, policy.reader_share_pct).await
}
