//! Wallet business logic - the single source of truth for "can this actor afford X".
//!
//! Every balance mutation happens in one atomic unit with its ledger append: a
//! crash or concurrent conflict can never leave a balance changed without its
//! matching entry, or vice versa. Debits are guarded at the SQL level
//! (`balance = balance - X .. WHERE balance >= X`), so concurrent debits
//! against one owner serialize on the row and can never race the balance
//! negative.
//!
//! The `apply_*` functions are generic over the connection so compound units
//! (billing ticks, bookings, gift sends) can run them inside their own
//! transaction; the plain `credit`/`debit` wrappers open one themselves.

use crate::{
    entities::{LedgerEntry, LedgerKind, Wallet, ledger_entry, wallet},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};

/// Finds the owner's wallet, creating an empty one on first touch.
pub async fn get_or_create_wallet<C>(db: &C, owner_id: i64) -> Result<wallet::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = Wallet::find()
        .filter(wallet::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    let model = wallet::ActiveModel {
        owner_id: Set(owner_id),
        balance_cents: Set(0),
        updated_at: Set(Utc::now()),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

async fn append_entry<C>(
    db: &C,
    owner_id: i64,
    kind: LedgerKind,
    amount_cents: i64,
    ref_type: &str,
    ref_id: &str,
) -> Result<()>
where
    C: ConnectionTrait,
{
    ledger_entry::ActiveModel {
        owner_id: Set(owner_id),
        kind: Set(kind),
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

async fn refreshed<C>(db: &C, wallet_id: i64, owner_id: i64) -> Result<wallet::Model>
where
    C: ConnectionTrait,
{
    Wallet::find_by_id(wallet_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "wallet",
            id: owner_id.to_string(),
        })
}

/// Increases the owner's balance and appends the matching ledger entry.
///
/// Runs on the caller's connection; wrap in a transaction for atomicity with
/// other writes. `kind` distinguishes plain credits from refunds and
/// adjustments - all are balance increases here.
pub async fn apply_credit<C>(
    db: &C,
    owner_id: i64,
    amount_cents: i64,
    kind: LedgerKind,
    ref_type: &str,
    ref_id: &str,
) -> Result<wallet::Model>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    if amount_cents <= 0 {
        return Err(Error::InvalidAmount {
            amount: amount_cents,
        });
    }

    let wallet = get_or_create_wallet(db, owner_id).await?;

    Wallet::update_many()
        .col_expr(
            wallet::Column::BalanceCents,
            Expr::col(wallet::Column::BalanceCents).add(amount_cents),
        )
        .col_expr(wallet::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(wallet::Column::Id.eq(wallet.id))
        .exec(db)
        .await?;

    append_entry(db, owner_id, kind, amount_cents, ref_type, ref_id).await?;

    refreshed(db, wallet.id, owner_id).await
}

/// Decreases the owner's balance and appends the matching `debit` entry.
///
/// Fails with [`Error::InsufficientFunds`] if the balance cannot cover the
/// amount; no partial debit occurs. The decrement is a single guarded UPDATE
/// (`WHERE balance >= amount`), which is what closes the concurrent
/// negative-balance race.
pub async fn apply_debit<C>(
    db: &C,
    owner_id: i64,
    amount_cents: i64,
    ref_type: &str,
    ref_id: &str,
) -> Result<wallet::Model>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    if amount_cents <= 0 {
        return Err(Error::InvalidAmount {
            amount: amount_cents,
        });
    }

    let wallet = get_or_create_wallet(db, owner_id).await?;

    let update = Wallet::update_many()
        .col_expr(
            wallet::Column::BalanceCents,
            Expr::col(wallet::Column::BalanceCents).sub(amount_cents),
        )
        .col_expr(wallet::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(wallet::Column::Id.eq(wallet.id))
        .filter(wallet::Column::BalanceCents.gte(amount_cents))
        .exec(db)
        .await?;

    if update.rows_affected == 0 {
        return Err(Error::InsufficientFunds {
            balance: wallet.balance_cents,
            required: amount_cents,
        });
    }

    append_entry(db, owner_id, LedgerKind::Debit, amount_cents, ref_type, ref_id).await?;

    refreshed(db, wallet.id, owner_id).await
}

/// Credits the owner's wallet in its own transaction.
pub async fn credit(
    db: &DatabaseConnection,
    owner_id: i64,
    amount_cents: i64,
    ref_type: &str,
    ref_id: &str,
) -> Result<wallet::Model> {
    let txn = db.begin().await?;
    let wallet = apply_credit(
        &txn,
        owner_id,
        amount_cents,
        LedgerKind::Credit,
        ref_type,
        ref_id,
    )
    .await?;
    txn.commit().await?;
    Ok(wallet)
}

/// Debits the owner's wallet in its own transaction.
pub async fn debit(
    db: &DatabaseConnection,
    owner_id: i64,
    amount_cents: i64,
    ref_type: &str,
    ref_id: &str,
) -> Result<wallet::Model> {
    let txn = db.begin().await?;
    let wallet = apply_debit(&txn, owner_id, amount_cents, ref_type, ref_id).await?;
    txn.commit().await?;
    Ok(wallet)
}

/// Consumes a funding event from the payment gateway: credits the wallet
/// tagged with the payment reference, enforcing the minimum deposit.
pub async fn deposit(
    db: &DatabaseConnection,
    owner_id: i64,
    amount_cents: i64,
    payment_ref: &str,
    deposit_min_cents: i64,
) -> Result<wallet::Model> {
    if amount_cents < deposit_min_cents {
        return Err(Error::InvalidAmount {
            amount: amount_cents,
        });
    }
    credit(db, owner_id, amount_cents, "payment_intent", payment_ref).await
}

/// Current balance in cents; zero for an owner with no wallet yet.
pub async fn balance(db: &DatabaseConnection, owner_id: i64) -> Result<i64> {
    Ok(Wallet::find()
        .filter(wallet::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
        .map_or(0, |w| w.balance_cents))
}

/// The owner's ledger, newest first.
pub async fn ledger(db: &DatabaseConnection, owner_id: i64) -> Result<Vec<ledger_entry::Model>> {
    LedgerEntry::find()
        .filter(ledger_entry::Column::OwnerId.eq(owner_id))
        .order_by_desc(ledger_entry::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
