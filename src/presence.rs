//! Presence tracking - short-TTL liveness signals per (session, participant).
//!
//! The real-time transport marks presence on connection establishment,
//! refreshes it on every heartbeat, and clears it on disconnect. The billing
//! ticker treats "signal present for both participants" as the sole criterion
//! for "this session is genuinely live right now" - the application-level
//! `active` status can be left open by a participant who is no longer
//! connected, so billing never trusts it alone.
//!
//! A signal that is not refreshed within the TTL simply expires; no explicit
//! cancellation is needed. All operations are synchronous map operations and
//! never block billing beyond the lock itself.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// In-process TTL map of live (session, participant) signals.
#[derive(Debug)]
pub struct PresenceTracker {
    ttl: Duration,
    entries: Mutex<HashMap<(String, i64), Instant>>,
}

impl PresenceTracker {
    /// Creates a tracker whose signals live for `ttl` after each refresh.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, i64), Instant>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks a participant present, starting (or restarting) its TTL window.
    ///
    /// Called on connection establishment.
    pub fn mark(&self, session_uid: &str, participant_id: i64) {
        let expiry = Instant::now() + self.ttl;
        self.lock()
            .insert((session_uid.to_string(), participant_id), expiry);
    }

    /// Refreshes a participant's TTL window. Called on every heartbeat.
    pub fn heartbeat(&self, session_uid: &str, participant_id: i64) {
        self.mark(session_uid, participant_id);
    }

    /// Removes a participant's signal immediately. Called on disconnect.
    pub fn clear(&self, session_uid: &str, participant_id: i64) {
        self.lock()
            .remove(&(session_uid.to_string(), participant_id));
    }

    /// Whether a participant's signal exists and has not expired.
    ///
    /// An expired entry reads as absent and is dropped on the way out.
    pub fn is_present(&self, session_uid: &str, participant_id: i64) -> bool {
        let key = (session_uid.to_string(), participant_id);
        let mut entries = self.lock();
        match entries.get(&key) {
            Some(expiry) if *expiry > Instant::now() => true,
            Some(_) => {
                entries.remove(&key);
                false
            }
            None => false,
        }
    }

    /// Whether both participants of a session are currently present.
    pub fn both_present(&self, session_uid: &str, a: i64, b: i64) -> bool {
        self.is_present(session_uid, a) && self.is_present(session_uid, b)
    }

    /// Drops every expired entry. The billing ticker runs this once per tick
    /// so abandoned sessions do not accumulate stale keys.
    pub fn sweep(&self) {
        let now = Instant::now();
        self.lock().retain(|_, expiry| *expiry > now);
    }

    /// Number of live (unexpired) signals.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock().values().filter(|e| **e > now).count()
    }

    /// Whether no live signals exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_read() {
        let tracker = PresenceTracker::new(Duration::from_secs(15));
        tracker.mark("sess-1", 1);

        assert!(tracker.is_present("sess-1", 1));
        assert!(!tracker.is_present("sess-1", 2));
        assert!(!tracker.is_present("sess-2", 1));
    }

    #[test]
    fn test_clear_removes_immediately() {
        let tracker = PresenceTracker::new(Duration::from_secs(15));
        tracker.mark("sess-1", 1);
        tracker.clear("sess-1", 1);

        assert!(!tracker.is_present("sess-1", 1));
    }

    #[test]
    fn test_expired_entry_reads_absent() {
        // Zero TTL: the signal is already expired the moment it is set
        let tracker = PresenceTracker::new(Duration::ZERO);
        tracker.mark("sess-1", 1);

        assert!(!tracker.is_present("sess-1", 1));
        // The expired entry was dropped by the read
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_both_present() {
        let tracker = PresenceTracker::new(Duration::from_secs(15));
        tracker.mark("sess-1", 1);
        assert!(!tracker.both_present("sess-1", 1, 2));

        tracker.mark("sess-1", 2);
        assert!(tracker.both_present("sess-1", 1, 2));

        tracker.clear("sess-1", 2);
        assert!(!tracker.both_present("sess-1", 1, 2));
    }

    #[test]
    fn test_sweep_drops_only_expired() {
        let expired = PresenceTracker::new(Duration::ZERO);
        expired.mark("sess-1", 1);
        expired.sweep();
        assert!(expired.is_empty());

        let live = PresenceTracker::new(Duration::from_secs(15));
        live.mark("sess-1", 1);
        live.sweep();
        assert_eq!(live.len(), 1);
    }
}
