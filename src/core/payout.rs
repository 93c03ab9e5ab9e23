//! Payout business logic - transferring earned balances to readers.
//!
//! The gateway is a trait so the transfer rail stays outside the crate.
//! Failures are classified, not suppressed: a retryable failure leaves the
//! balance untouched for the next scheduled run, a terminal one is logged for
//! an operator. The balance is zeroed and the `payout` ledger entry appended
//! only after a confirmed transfer, in one atomic unit; the idempotency key
//! derived from (owner, date, amount) makes a retried run safe on the
//! gateway side.

use crate::{
    config::policy::BillingPolicy,
    entities::{PayoutBalance, PayoutKind, payout_balance, payout_entry},
    errors::Result,
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::{error, info, warn};

/// A gateway transfer failure, classified for the retry policy.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Transient failure; the balance is left for the next run
    #[error("retryable gateway failure: {0}")]
    Retryable(String),
    /// Permanent failure needing operator attention
    #[error("terminal gateway failure: {0}")]
    Terminal(String),
}

/// The payment gateway's payout rail.
#[async_trait]
pub trait PayoutGateway: Send + Sync {
    /// Transfers `amount_cents` to the reader's connected account.
    ///
    /// Implementations must treat `idempotency_key` as the dedupe handle so a
    /// retried run cannot double-pay.
    async fn transfer(
        &self,
        reader_id: i64,
        amount_cents: i64,
        idempotency_key: &str,
    ) -> std::result::Result<(), GatewayError>;
}

/// The dedupe handle for one (owner, date, amount) transfer attempt.
#[must_use]
pub fn idempotency_key(reader_id: i64, date: NaiveDate, amount_cents: i64) -> String {
    format!("payout:{reader_id}:{date}:{amount_cents}")
}

/// Totals of one payout run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PayoutSummary {
    /// Readers paid this run
    pub transferred: usize,
    /// Total cents moved this run
    pub transferred_cents: i64,
    /// Transfers left for the next run
    pub retryable_failures: usize,
    /// Transfers needing operator attention
    pub terminal_failures: usize,
}

/// Pays out every balance at or above the policy minimum.
///
/// Per-reader isolation: one failed transfer never aborts the run. Only a
/// confirmed transfer zeroes its balance.
pub async fn run_payouts(
    db: &DatabaseConnection,
    gateway: &dyn PayoutGateway,
    policy: &BillingPolicy,
) -> Result<PayoutSummary> {
    use sea_orm::sea_query::Expr;

    let eligible = PayoutBalance::find()
        .filter(payout_balance::Column::BalanceCents.gte(policy.payout_min_cents))
        .all(db)
        .await?;

    let today = Utc::now().date_naive();
    let mut summary = PayoutSummary::default();

    for pb in eligible {
        let amount_cents = pb.balance_cents;
        let key = idempotency_key(pb.owner_id, today, amount_cents);

        match gateway.transfer(pb.owner_id, amount_cents, &key).await {
            Ok(()) => {
                let txn = db.begin().await?;
                // Subtract what was paid rather than writing zero: a share
                // credited mid-transfer survives for the next run
                let update = PayoutBalance::update_many()
                    .col_expr(
                        payout_balance::Column::BalanceCents,
                        Expr::col(payout_balance::Column::BalanceCents).sub(amount_cents),
                    )
                    .col_expr(payout_balance::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(payout_balance::Column::Id.eq(pb.id))
                    .filter(payout_balance::Column::BalanceCents.gte(amount_cents))
                    .exec(&txn)
                    .await?;
                if update.rows_affected == 0 {
                    txn.rollback().await?;
                    warn!(reader = pb.owner_id, "payout balance changed under a confirmed transfer");
                    continue;
                }
                payout_entry::ActiveModel {
                    reader_id: Set(pb.owner_id),
                    kind: Set(PayoutKind::Payout),
                    amount_cents: Set(amount_cents),
                    ref_type: Set("transfer".to_string()),
                    ref_id: Set(key),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
                txn.commit().await?;

                info!(reader = pb.owner_id, amount = amount_cents, "payout transferred");
                summary.transferred += 1;
                summary.transferred_cents += amount_cents;
            }
            Err(GatewayError::Retryable(msg)) => {
                warn!(reader = pb.owner_id, amount = amount_cents, cause = %msg, "payout deferred to next run");
                summary.retryable_failures += 1;
            }
            Err(GatewayError::Terminal(msg)) => {
                error!(reader = pb.owner_id, amount = amount_cents, cause = %msg, "payout failed terminally");
                summary.terminal_failures += 1;
            }
        }
    }

    Ok(summary)
}
