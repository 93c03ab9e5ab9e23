//! Session business logic - the session lifecycle state machine.
//!
//! Transitions are monotone and enforced with guarded single-row updates, so
//! a transition raced by another caller (or by the billing ticker) resolves
//! deterministically: exactly one writer wins and the loser sees either an
//! [`Error::InvalidTransition`] or, for `end`, an idempotent success.

use crate::{
    entities::{
        ReaderProfile, Session, SessionMode, SessionStatus, reader_profile, session,
    },
    errors::{Error, Result},
    registry::{ConnectionRegistry, OutboundEvent},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::debug;
use uuid::Uuid;

fn new_uid() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Looks up a session by its public uid.
pub async fn get_session(db: &DatabaseConnection, session_uid: &str) -> Result<session::Model> {
    Session::find()
        .filter(session::Column::SessionUid.eq(session_uid))
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "session",
            id: session_uid.to_string(),
        })
}

async fn require_reader_profile(
    db: &DatabaseConnection,
    reader_id: i64,
) -> Result<reader_profile::Model> {
    ReaderProfile::find()
        .filter(reader_profile::Column::UserId.eq(reader_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "reader",
            id: reader_id.to_string(),
        })
}

/// Creates a `requested` per-minute session and notifies the assigned reader.
///
/// Only metered modes can be requested; streams are started by their reader
/// via [`start_stream`]. The notification is best-effort - an offline reader
/// still sees the request in [`incoming_for_reader`].
pub async fn request_session(
    db: &DatabaseConnection,
    registry: &ConnectionRegistry,
    client_id: i64,
    reader_id: i64,
    mode: SessionMode,
) -> Result<session::Model> {
    if mode == SessionMode::Stream {
        return Err(Error::InvalidTransition {
            message: "streams are started by their reader, not requested".to_string(),
        });
    }
    require_reader_profile(db, reader_id).await?;

    let model = session::ActiveModel {
        session_uid: Set(new_uid()),
        reader_id: Set(reader_id),
        client_id: Set(client_id),
        mode: Set(mode),
        status: Set(SessionStatus::Requested),
        started_at: Set(None),
        ended_at: Set(None),
        total_seconds: Set(0),
        amount_charged_cents: Set(0),
        per_minute: Set(true),
        appointment_id: Set(None),
        ..Default::default()
    };
    let created = model.insert(db).await?;

    let delivered = registry.notify_user(
        reader_id,
        OutboundEvent::SessionRequested {
            session_uid: created.session_uid.clone(),
            client_id,
            mode,
        },
    );
    debug!(
        session = %created.session_uid,
        reader = reader_id,
        delivered,
        "session requested"
    );

    Ok(created)
}

/// The assigned reader accepts a `requested` session, taking it live.
pub async fn accept_session(
    db: &DatabaseConnection,
    actor_id: i64,
    session_uid: &str,
) -> Result<session::Model> {
    use sea_orm::sea_query::Expr;

    let sess = get_session(db, session_uid).await?;
    if actor_id != sess.reader_id {
        return Err(Error::NotAuthorized {
            message: "only the assigned reader can accept a session".to_string(),
        });
    }

    let update = Session::update_many()
        .col_expr(session::Column::Status, Expr::value(SessionStatus::Active))
        .col_expr(session::Column::StartedAt, Expr::value(Some(Utc::now())))
        .filter(session::Column::Id.eq(sess.id))
        .filter(session::Column::Status.eq(SessionStatus::Requested))
        .exec(db)
        .await?;

    if update.rows_affected == 0 {
        return Err(Error::InvalidTransition {
            message: format!("session {session_uid} is no longer requested"),
        });
    }

    get_session(db, session_uid).await
}

/// The assigned reader rejects a `requested` session. No charge has occurred
/// yet, so no refund logic applies.
pub async fn reject_session(
    db: &DatabaseConnection,
    actor_id: i64,
    session_uid: &str,
) -> Result<session::Model> {
    use sea_orm::sea_query::Expr;

    let sess = get_session(db, session_uid).await?;
    if actor_id != sess.reader_id {
        return Err(Error::NotAuthorized {
            message: "only the assigned reader can reject a session".to_string(),
        });
    }

    let update = Session::update_many()
        .col_expr(session::Column::Status, Expr::value(SessionStatus::Canceled))
        .col_expr(session::Column::EndedAt, Expr::value(Some(Utc::now())))
        .filter(session::Column::Id.eq(sess.id))
        .filter(session::Column::Status.eq(SessionStatus::Requested))
        .exec(db)
        .await?;

    if update.rows_affected == 0 {
        return Err(Error::InvalidTransition {
            message: format!("session {session_uid} is no longer requested"),
        });
    }

    get_session(db, session_uid).await
}

/// Either participant ends an `active` session.
///
/// Ending a session that already ended is a no-op success (this tolerates the
/// race between a manual end and a ticker-driven end); `ended_at` is never
/// re-stamped. Ending a `requested` or `canceled` session is invalid.
pub async fn end_session(
    db: &DatabaseConnection,
    actor_id: i64,
    session_uid: &str,
) -> Result<session::Model> {
    let sess = get_session(db, session_uid).await?;
    if actor_id != sess.client_id && actor_id != sess.reader_id {
        return Err(Error::NotAuthorized {
            message: "only a session participant can end it".to_string(),
        });
    }

    match sess.status {
        SessionStatus::Ended => Ok(sess),
        SessionStatus::Active => {
            end_active(db, sess.id).await?;
            get_session(db, session_uid).await
        }
        SessionStatus::Requested | SessionStatus::Canceled => Err(Error::InvalidTransition {
            message: format!("session {session_uid} was never active"),
        }),
    }
}

/// Ticker-driven end when a session can no longer bill. Idempotent: an
/// already-ended session is left untouched.
pub(crate) async fn end_for_billing(db: &DatabaseConnection, session_uid: &str) -> Result<()> {
    let sess = get_session(db, session_uid).await?;
    if sess.status == SessionStatus::Active {
        end_active(db, sess.id).await?;
    }
    Ok(())
}

async fn end_active(db: &DatabaseConnection, session_id: i64) -> Result<()> {
    use sea_orm::sea_query::Expr;

    // The status filter makes the stamp first-writer-wins
    Session::update_many()
        .col_expr(session::Column::Status, Expr::value(SessionStatus::Ended))
        .col_expr(session::Column::EndedAt, Expr::value(Some(Utc::now())))
        .filter(session::Column::Id.eq(session_id))
        .filter(session::Column::Status.eq(SessionStatus::Active))
        .exec(db)
        .await?;
    Ok(())
}

/// A reader opens a live stream: an `active`, gift-funded session with
/// metering off. The reader occupies both participant seats.
pub async fn start_stream(db: &DatabaseConnection, reader_id: i64) -> Result<session::Model> {
    require_reader_profile(db, reader_id).await?;

    let model = session::ActiveModel {
        session_uid: Set(new_uid()),
        reader_id: Set(reader_id),
        client_id: Set(reader_id),
        mode: Set(SessionMode::Stream),
        status: Set(SessionStatus::Active),
        started_at: Set(Some(Utc::now())),
        ended_at: Set(None),
        total_seconds: Set(0),
        amount_charged_cents: Set(0),
        per_minute: Set(false),
        appointment_id: Set(None),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Requested sessions waiting on a reader, oldest first.
pub async fn incoming_for_reader(
    db: &DatabaseConnection,
    reader_id: i64,
) -> Result<Vec<session::Model>> {
    Session::find()
        .filter(session::Column::ReaderId.eq(reader_id))
        .filter(session::Column::Status.eq(SessionStatus::Requested))
        .order_by_asc(session::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Currently live streams, for the public listing.
pub async fn active_streams(db: &DatabaseConnection) -> Result<Vec<session::Model>> {
    Session::find()
        .filter(session::Column::Mode.eq(SessionMode::Stream))
        .filter(session::Column::Status.eq(SessionStatus::Active))
        .order_by_desc(session::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
