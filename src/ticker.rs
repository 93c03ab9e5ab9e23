//! Billing ticker - the scheduled process driving per-minute charges.
//!
//! Runs on a fixed period with `MissedTickBehavior::Skip`, so a run that
//! outlives its period delays the next tick instead of ever running
//! concurrently against itself. Each run snapshots the active per-minute
//! sessions, fans out one independent task per session, and collects the
//! outcomes - a slow or failing session never delays the others.
//!
//! The ticker exposes no external call surface; it only reads presence and
//! drives the billing primitive.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::config::policy::BillingPolicy;
use crate::core::billing::{self, TickOutcome};
use crate::errors::Result;
use crate::presence::PresenceTracker;

/// Totals of one ticker run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// Sessions billed one rate-unit
    pub billed: usize,
    /// Total cents debited this run
    pub billed_cents: i64,
    /// Sessions deferred for absent presence
    pub skipped_presence: usize,
    /// Sessions another run (or an end) got to first
    pub superseded: usize,
    /// Sessions ended for insufficient funds
    pub ended_insufficient_funds: usize,
    /// Sessions whose tick errored (logged, isolated)
    pub failed: usize,
}

impl TickSummary {
    fn record(&mut self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::Billed { rate_cents } => {
                self.billed += 1;
                self.billed_cents += rate_cents;
            }
            TickOutcome::SkippedPresence => self.skipped_presence += 1,
            TickOutcome::Superseded => self.superseded += 1,
            TickOutcome::EndedInsufficientFunds => self.ended_insufficient_funds += 1,
        }
    }
}

/// Background task billing every active per-minute session once per period.
pub struct BillingTicker {
    db: DatabaseConnection,
    presence: Arc<PresenceTracker>,
    policy: BillingPolicy,
}

impl BillingTicker {
    /// Creates a ticker over the shared connection, presence map and policy.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        presence: Arc<PresenceTracker>,
        policy: BillingPolicy,
    ) -> Self {
        Self {
            db,
            presence,
            policy,
        }
    }

    /// Spawns the ticker as a background task.
    ///
    /// Returns a handle that can be used to abort the task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.policy.tick_interval());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                interval.tick().await;

                match self.run_once().await {
                    Ok(summary) if summary.billed > 0 || summary.ended_insufficient_funds > 0 => {
                        info!(
                            billed = summary.billed,
                            billed_cents = summary.billed_cents,
                            skipped = summary.skipped_presence,
                            ended = summary.ended_insufficient_funds,
                            "billing tick completed"
                        );
                    }
                    Ok(summary) => {
                        debug!(skipped = summary.skipped_presence, "billing tick idle");
                    }
                    Err(e) => {
                        warn!(error = %e, "billing tick failed to run");
                    }
                }
            }
        })
    }

    /// Runs one tick now (also used by tests and manual invocation).
    ///
    /// Snapshot, then fan out: every session ticks in its own task, and one
    /// session's error is recorded and isolated from the rest.
    pub async fn run_once(&self) -> Result<TickSummary> {
        self.presence.sweep();

        let sessions = billing::active_per_minute_sessions(&self.db).await?;
        let mut tasks: JoinSet<(String, Result<TickOutcome>)> = JoinSet::new();
        for sess in sessions {
            let db = self.db.clone();
            let presence = Arc::clone(&self.presence);
            let policy = self.policy.clone();
            tasks.spawn(async move {
                let outcome = billing::tick_session(&db, &presence, &policy, &sess).await;
                (sess.session_uid, outcome)
            });
        }

        let mut summary = TickSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(outcome))) => summary.record(outcome),
                Ok((session_uid, Err(e))) => {
                    warn!(session = %session_uid, error = %e, "session tick failed");
                    summary.failed += 1;
                }
                Err(e) => {
                    warn!(error = %e, "session tick task panicked");
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }
}
