//! Revenue split - dividing a gross charge between reader and platform.
//!
//! The reader share is `gross * pct / 100` with integer truncation favoring
//! the platform; the remainder is implicitly retained (no platform ledger row
//! exists today, but `reader share + retained share = gross` holds exactly, so
//! one can be added without breaking reconciliation). Shares are credited to
//! the reader's payout balance tagged with the same reference as the
//! originating debit.

use crate::{
    entities::{PayoutBalance, PayoutEntry, PayoutKind, payout_balance, payout_entry},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};

/// The reader's share of a gross amount in cents, floored.
#[must_use]
pub fn reader_share(gross_cents: i64, share_pct: u32) -> i64 {
    gross_cents * i64::from(share_pct) / 100
}

/// Finds the reader's payout balance, creating an empty one on first touch.
pub async fn get_or_create_payout_balance<C>(db: &C, reader_id: i64) -> Result<payout_balance::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = PayoutBalance::find()
        .filter(payout_balance::Column::OwnerId.eq(reader_id))
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    let model = payout_balance::ActiveModel {
        owner_id: Set(reader_id),
        balance_cents: Set(0),
        updated_at: Set(Utc::now()),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Credits a reader's payout balance and appends the matching payout-ledger
/// entry. Runs on the caller's connection.
pub async fn credit_reader<C>(
    db: &C,
    reader_id: i64,
    amount_cents: i64,
    ref_type: &str,
    ref_id: &str,
) -> Result<()>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    if amount_cents <= 0 {
        return Err(Error::InvalidAmount {
            amount: amount_cents,
        });
    }

    let balance = get_or_create_payout_balance(db, reader_id).await?;

    PayoutBalance::update_many()
        .col_expr(
            payout_balance::Column::BalanceCents,
            Expr::col(payout_balance::Column::BalanceCents).add(amount_cents),
        )
        .col_expr(payout_balance::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(payout_balance::Column::Id.eq(balance.id))
        .exec(db)
        .await?;

    payout_entry::ActiveModel {
        reader_id: Set(reader_id),
        kind: Set(PayoutKind::Credit),
        amount_cents: Set(amount_cents),
        ref_type: Set(ref_type.to_string()),
        ref_id: Set(ref_id.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(())
}

/// Applies the split for one gross charge: computes the reader share and
/// credits it tagged with the originating reference. Returns the share.
///
/// A share that floors to zero credits nothing (the ledger holds no
/// zero-amount rows) - the whole gross is then retained.
pub async fn split_to_reader<C>(
    db: &C,
    reader_id: i64,
    gross_cents: i64,
    share_pct: u32,
    ref_type: &str,
    ref_id: &str,
) -> Result<i64>
where
    C: ConnectionTrait,
{
    let share = reader_share(gross_cents, share_pct);
    if share > 0 {
        credit_reader(db, reader_id, share, ref_type, ref_id).await?;
    }
    Ok(share)
}

/// Current payout balance in cents; zero for a reader with no balance row yet.
pub async fn payout_balance_of(db: &DatabaseConnection, reader_id: i64) -> Result<i64> {
    Ok(PayoutBalance::find()
        .filter(payout_balance::Column::OwnerId.eq(reader_id))
        .one(db)
        .await?
        .map_or(0, |b| b.balance_cents))
}

/// The reader's payout ledger, newest first.
pub async fn payout_ledger(
    db: &DatabaseConnection,
    reader_id: i64,
) -> Result<Vec<payout_entry::Model>> {
    PayoutEntry::find()
        .filter(payout_entry::Column::ReaderId.eq(reader_id))
        .order_by_desc(payout_entry::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_reader_share_floors_toward_platform() {
        assert_eq!(reader_share(100, 70), 70);
        assert_eq!(reader_share(199, 70), 139); // 139.3 floors to 139
        assert_eq!(reader_share(1, 70), 0);
        assert_eq!(reader_share(0, 70), 0);
    }

    #[test]
    fn test_split_reconciles_exactly() {
        for gross in [1, 99, 100, 199, 2500, 12000] {
            let share = reader_share(gross, 70);
            let retained = gross - share;
            assert!(share >= 0 && retained >= 0);
            assert_eq!(share + retained, gross);
        }
    }

    #[tokio::test]
    async fn test_split_credits_reader_with_matching_entry() -> Result<()> {
        let db = setup_test_db().await?;

        let share = split_to_reader(&db, 9, 199, 70, "session", "s_1").await?;
        assert_eq!(share, 139);
        assert_eq!(payout_balance_of(&db, 9).await?, 139);

        let entries = payout_ledger(&db, 9).await?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, PayoutKind::Credit);
        assert_eq!(entries[0].amount_cents, 139);
        assert_eq!(entries[0].ref_type, "session");
        assert_eq!(entries[0].ref_id, "s_1");

        Ok(())
    }

    #[tokio::test]
    async fn test_zero_share_appends_nothing() -> Result<()> {
        let db = setup_test_db().await?;

        let share = split_to_reader(&db, 9, 1, 70, "stream", "s_1").await?;
        assert_eq!(share, 0);
        assert_eq!(payout_balance_of(&db, 9).await?, 0);
        assert!(payout_ledger(&db, 9).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_credit_reader_rejects_non_positive() -> Result<()> {
        let db = setup_test_db().await?;
        let result = credit_reader(&db, 9, 0, "session", "s_1").await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));
        Ok(())
    }
}
