//! Connection registry - who is reachable on the real-time transport.
//!
//! An explicit component replacing ad-hoc global peer maps: per-session peer
//! sets with join/leave/broadcast, and per-user notification channels for
//! alerts that precede any session membership (e.g. an incoming session
//! request). The transport layer owns the actual connections; it hands each
//! peer's outbound half to the registry and drains the returned receiver.
//!
//! Fan-out is best-effort: a send failing because the peer vanished is logged
//! and the peer pruned, and delivery to the remaining peers continues.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::entities::SessionMode;

/// Events pushed to connected peers over the real-time transport.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    /// A client requested a session with the notified reader
    SessionRequested {
        /// Public id of the requested session
        session_uid: String,
        /// Requesting client
        client_id: i64,
        /// Requested interaction mode
        mode: SessionMode,
    },
    /// A gift landed on a stream the peer is watching
    GiftSent {
        /// Stream session the gift was sent on
        session_uid: String,
        /// Sending client
        sender_id: i64,
        /// Catalog gift id
        gift_id: i64,
        /// Price paid in cents
        amount_cents: i64,
    },
    /// The viewer count of a session changed
    ViewerCount {
        /// Session whose audience changed
        session_uid: String,
        /// Current number of joined peers
        count: usize,
    },
}

type PeerMap = HashMap<String, HashMap<i64, mpsc::UnboundedSender<OutboundEvent>>>;

/// Registry of connected peers, keyed by session id, plus user-level
/// notification channels.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    sessions: Mutex<PeerMap>,
    users: Mutex<HashMap<i64, mpsc::UnboundedSender<OutboundEvent>>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_sessions(&self) -> std::sync::MutexGuard<'_, PeerMap> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_users(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<i64, mpsc::UnboundedSender<OutboundEvent>>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a participant to a session's peer set and returns the receiver the
    /// transport drains into the connection. Joining twice replaces the
    /// previous channel. Everyone in the session gets a viewer-count update.
    pub fn join(
        &self,
        session_uid: &str,
        participant_id: i64,
    ) -> mpsc::UnboundedReceiver<OutboundEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let count = {
            let mut sessions = self.lock_sessions();
            let peers = sessions.entry(session_uid.to_string()).or_default();
            peers.insert(participant_id, tx);
            peers.len()
        };
        debug!(session = session_uid, participant = participant_id, viewers = count, "peer joined");
        self.broadcast(
            session_uid,
            &OutboundEvent::ViewerCount {
                session_uid: session_uid.to_string(),
                count,
            },
        );
        rx
    }

    /// Removes a participant from a session's peer set, dropping its slot in
    /// the broadcast fan-out. Remaining peers get a viewer-count update.
    pub fn leave(&self, session_uid: &str, participant_id: i64) {
        let count = {
            let mut sessions = self.lock_sessions();
            let Some(peers) = sessions.get_mut(session_uid) else {
                return;
            };
            peers.remove(&participant_id);
            if peers.is_empty() {
                sessions.remove(session_uid);
                None
            } else {
                Some(peers.len())
            }
        };
        debug!(session = session_uid, participant = participant_id, "peer left");
        if let Some(count) = count {
            self.broadcast(
                session_uid,
                &OutboundEvent::ViewerCount {
                    session_uid: session_uid.to_string(),
                    count,
                },
            );
        }
    }

    /// Delivers an event to every peer of a session. Dead peers are logged,
    /// pruned, and never abort delivery to the rest. Returns the number of
    /// peers reached.
    pub fn broadcast(&self, session_uid: &str, event: &OutboundEvent) -> usize {
        let mut sessions = self.lock_sessions();
        let Some(peers) = sessions.get_mut(session_uid) else {
            return 0;
        };

        let mut delivered = 0;
        peers.retain(|participant_id, tx| match tx.send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(_) => {
                warn!(
                    session = session_uid,
                    participant = participant_id,
                    "dropping disconnected peer from broadcast set"
                );
                false
            }
        });
        delivered
    }

    /// Number of peers currently joined to a session.
    #[must_use]
    pub fn viewer_count(&self, session_uid: &str) -> usize {
        self.lock_sessions()
            .get(session_uid)
            .map_or(0, HashMap::len)
    }

    /// Registers a user-level notification channel and returns its receiver.
    pub fn register_user(&self, user_id: i64) -> mpsc::UnboundedReceiver<OutboundEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock_users().insert(user_id, tx);
        rx
    }

    /// Drops a user's notification channel.
    pub fn unregister_user(&self, user_id: i64) {
        self.lock_users().remove(&user_id);
    }

    /// Sends a notification to one user if they are connected. Returns whether
    /// delivery succeeded; an offline user is not an error.
    pub fn notify_user(&self, user_id: i64, event: OutboundEvent) -> bool {
        let mut users = self.lock_users();
        match users.get(&user_id) {
            Some(tx) => {
                if tx.send(event).is_err() {
                    users.remove(&user_id);
                    false
                } else {
                    true
                }
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn gift_event(session_uid: &str) -> OutboundEvent {
        OutboundEvent::GiftSent {
            session_uid: session_uid.to_string(),
            sender_id: 1,
            gift_id: 1,
            amount_cents: 100,
        }
    }

    #[tokio::test]
    async fn test_join_and_broadcast() {
        let registry = ConnectionRegistry::new();
        let mut rx1 = registry.join("sess-1", 1);
        let mut rx2 = registry.join("sess-1", 2);

        // Drain viewer-count updates from the joins
        while rx1.try_recv().is_ok() {}
        while rx2.try_recv().is_ok() {}

        let delivered = registry.broadcast("sess-1", &gift_event("sess-1"));
        assert_eq!(delivered, 2);
        assert!(matches!(
            rx1.try_recv().unwrap(),
            OutboundEvent::GiftSent { .. }
        ));
        assert!(matches!(
            rx2.try_recv().unwrap(),
            OutboundEvent::GiftSent { .. }
        ));
    }

    #[tokio::test]
    async fn test_broadcast_survives_dropped_peer() {
        let registry = ConnectionRegistry::new();
        let rx1 = registry.join("sess-1", 1);
        let mut rx2 = registry.join("sess-1", 2);
        while rx2.try_recv().is_ok() {}

        // Peer 1 vanished without leaving
        drop(rx1);

        let delivered = registry.broadcast("sess-1", &gift_event("sess-1"));
        assert_eq!(delivered, 1);
        assert!(matches!(
            rx2.try_recv().unwrap(),
            OutboundEvent::GiftSent { .. }
        ));
        // The dead peer was pruned
        assert_eq!(registry.viewer_count("sess-1"), 1);
    }

    #[tokio::test]
    async fn test_leave_updates_viewer_count() {
        let registry = ConnectionRegistry::new();
        let _rx1 = registry.join("sess-1", 1);
        let _rx2 = registry.join("sess-1", 2);
        assert_eq!(registry.viewer_count("sess-1"), 2);

        registry.leave("sess-1", 1);
        assert_eq!(registry.viewer_count("sess-1"), 1);

        registry.leave("sess-1", 2);
        assert_eq!(registry.viewer_count("sess-1"), 0);
    }

    #[tokio::test]
    async fn test_notify_user() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.notify_user(7, gift_event("sess-1")));

        let mut rx = registry.register_user(7);
        assert!(registry.notify_user(7, gift_event("sess-1")));
        assert!(rx.try_recv().is_ok());

        registry.unregister_user(7);
        assert!(!registry.notify_user(7, gift_event("sess-1")));
    }
}
