//! Gift business logic - gifting on live streams.
//!
//! A gift send is one atomic unit: verify an active stream exists, debit the
//! sender at the gift's current price, split to the stream's reader, append
//! the send record. A failed debit aborts the whole unit - no partial gift
//! record ever exists. The viewer-facing gift event goes out after commit,
//! best-effort.

use crate::{
    entities::{
        Gift, SessionMode, SessionStatus, StreamGift, gift, stream_gift,
    },
    errors::{Error, Result},
    registry::{ConnectionRegistry, OutboundEvent},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};

use super::{revenue, session, wallet};

/// Sends a gift on a live stream. Returns the recorded send.
///
/// Fails with [`Error::NotFound`] when the session is missing, not a stream,
/// or not active, and when the gift is missing or retired from the catalog.
pub async fn send_gift(
    db: &DatabaseConnection,
    registry: &ConnectionRegistry,
    sender_id: i64,
    session_uid: &str,
    gift_id: i64,
    reader_share_pct: u32,
) -> Result<stream_gift::Model> {
    let sess = session::get_session(db, session_uid).await?;
    if sess.mode != SessionMode::Stream || sess.status != SessionStatus::Active {
        return Err(Error::NotFound {
            entity: "stream",
            id: session_uid.to_string(),
        });
    }

    let gift = Gift::find_by_id(gift_id)
        .one(db)
        .await?
        .filter(|g| g.active)
        .ok_or_else(|| Error::NotFound {
            entity: "gift",
            id: gift_id.to_string(),
        })?;

    let txn = db.begin().await?;
    wallet::apply_debit(&txn, sender_id, gift.price_cents, "stream", session_uid).await?;
    revenue::split_to_reader(
        &txn,
        sess.reader_id,
        gift.price_cents,
        reader_share_pct,
        "stream",
        session_uid,
    )
    .await?;
    let sent = stream_gift::ActiveModel {
        session_id: Set(sess.id),
        sender_id: Set(sender_id),
        gift_id: Set(gift.id),
        amount_cents: Set(gift.price_cents),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    registry.broadcast(
        session_uid,
        &OutboundEvent::GiftSent {
            session_uid: session_uid.to_string(),
            sender_id,
            gift_id: gift.id,
            amount_cents: gift.price_cents,
        },
    );

    Ok(sent)
}

/// The sendable gift catalog, cheapest first.
pub async fn active_gifts(db: &DatabaseConnection) -> Result<Vec<gift::Model>> {
    Gift::find()
        .filter(gift::Column::Active.eq(true))
        .order_by_asc(gift::Column::PriceCents)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All gifts sent on one session, newest first.
pub async fn gifts_for_session(
    db: &DatabaseConnection,
    session_id: i64,
) -> Result<Vec<stream_gift::Model>> {
    StreamGift::find()
        .filter(stream_gift::Column::SessionId.eq(session_id))
        .order_by_desc(stream_gift::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
