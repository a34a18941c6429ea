//! Creating transactions and moving them through their lifecycle.
//!
//! Every operation that writes runs in one [LedgerStore::atomically] unit, so
//! a transaction's status and the counters derived from it are always changed
//! together or not at all.

use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{TransactionId, UserId},
    transaction::{
        AggregateSide, LedgerStore, NewTransaction, Transaction, TransactionStatus,
        reconcile::delta,
    },
    user::{GateDecision, check_allowed},
};

/// Record a new pending purchase.
///
/// The buyer must pass the scammer gate. The buyer's and creator's user rows
/// are created if this is the first time they are seen, and their display
/// names are refreshed when given. Nothing is written if any step fails.
///
/// # Errors
/// This function will return a:
/// - [Error::ScammerDenied] if the buyer is flagged as a scammer,
/// - a validation error from [NewTransaction::validate],
/// - or [Error::SqlError] if the transaction cannot be stored.
pub fn create_transaction(
    new_transaction: NewTransaction,
    store: &impl LedgerStore,
) -> Result<Transaction, Error> {
    let buyer_id = new_transaction.buyer_id;

    let transaction = store.atomically(|store| {
        if let GateDecision::Denied { notes } = check_allowed(buyer_id, store)? {
            tracing::warn!("Rejected a purchase by user {buyer_id}, who is flagged as a scammer");
            return Err(Error::ScammerDenied {
                user_id: buyer_id,
                notes,
            });
        }

        let validated = new_transaction.validate()?;

        store.ensure_user(validated.buyer_id(), validated.buyer_name())?;
        if let Some(creator_id) = validated.creator_id() {
            store.ensure_user(creator_id, validated.creator_name())?;
        }

        store.insert_transaction(&validated, OffsetDateTime::now_utc())
    })?;

    tracing::info!(
        "Created transaction #{} for user {}: {} × {} = {}",
        transaction.id,
        transaction.buyer_id,
        transaction.quantity,
        transaction.item,
        transaction.total_amount
    );

    Ok(transaction)
}

/// Move transaction `id` to `requested` and reconcile the buyer and seller totals.
///
/// The stored status is read, the counter changes are worked out by
/// [delta](crate::transaction::reconcile::delta), applied to the buyer and (if
/// there is one) the creator, and the new status is written, all inside one
/// atomic unit. Repeating a request is harmless: the second call sees the
/// status the first one wrote and changes nothing.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to a transaction,
/// - [Error::InvalidTransition] if the transaction cannot move to `requested`,
/// - or a persistence error, in which case nothing was changed.
pub fn transition_transaction(
    id: TransactionId,
    requested: TransactionStatus,
    store: &impl LedgerStore,
) -> Result<Transaction, Error> {
    let (previous, transaction) = store.atomically(|store| {
        let current = store.load_transaction(id)?;
        let change = delta(current.status, requested, current.total_amount)?;

        if !change.is_zero() {
            store.adjust_user_aggregate(current.buyer_id, AggregateSide::Buyer, change.buyer)?;

            if let Some(creator_id) = current.creator_id {
                store.adjust_user_aggregate(creator_id, AggregateSide::Seller, change.seller)?;
            }
        }

        if current.status == requested {
            return Ok((current.status, current));
        }

        store.save_transaction_status(id, requested, OffsetDateTime::now_utc())?;

        Ok((current.status, store.load_transaction(id)?))
    })?;

    if previous == transaction.status {
        tracing::debug!("Transaction #{id} is already {requested}");
    } else {
        tracing::info!("Transaction #{id} moved from {previous} to {requested}");
    }

    Ok(transaction)
}

/// Like [transition_transaction], but parses `requested` from a status name.
///
/// # Errors
/// Returns an [Error::UnknownStatus] if `requested` is not a status name, and
/// otherwise the same errors as [transition_transaction].
pub fn transition_transaction_named(
    id: TransactionId,
    requested: &str,
    store: &impl LedgerStore,
) -> Result<Transaction, Error> {
    let requested: TransactionStatus = requested.parse()?;

    transition_transaction(id, requested, store)
}

/// Retrieve a transaction by its `id`.
///
/// # Errors
/// Returns an [Error::TransactionNotFound] if `id` does not refer to a transaction.
pub fn get_transaction_by_id(
    id: TransactionId,
    store: &impl LedgerStore,
) -> Result<Transaction, Error> {
    store.load_transaction(id)
}

/// Retrieve the transactions `user_id` bought or sold, newest first.
///
/// # Errors
/// Returns an [Error::SqlError] if the transactions cannot be read.
pub fn list_transactions_for_user(
    user_id: UserId,
    store: &impl LedgerStore,
) -> Result<Vec<Transaction>, Error> {
    store.list_transactions_for_user(user_id)
}
