//! Defines the ledger store trait and its SQLite implementation.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{TransactionId, UserId},
    transaction::{
        AggregateSide, CounterDelta, Transaction, TransactionStatus, ValidatedTransaction,
        core::{
            get_transaction, get_transactions_for_user, insert_transaction,
            update_transaction_status,
        },
    },
    user::{User, adjust_user_counters, find_user, update_scammer_flag, upsert_user},
};

/// Handles the storage of transactions and user aggregates.
///
/// The transaction service only talks to the database through this trait,
/// which keeps the reconciliation logic testable against an in-memory store.
pub trait LedgerStore {
    /// Run `work` as one atomic unit.
    ///
    /// Implementers must make sure that either every write `work` makes is
    /// kept or, if it returns an error, none are. Concurrent units that touch
    /// the same transaction must not interleave.
    fn atomically<T, F>(&self, work: F) -> Result<T, Error>
    where
        F: FnOnce(&Self) -> Result<T, Error>;

    /// Get a user, or `None` if they have never been seen.
    fn find_user(&self, user_id: UserId) -> Result<Option<User>, Error>;

    /// Create the user with zeroed counters if they do not exist, refreshing
    /// the display name when one is given.
    fn ensure_user(&self, user_id: UserId, display_name: Option<&str>) -> Result<(), Error>;

    /// Flag or clear the scammer flag, creating the user if needed.
    fn set_scammer_flag(
        &self,
        user_id: UserId,
        is_scammer: bool,
        notes: Option<&str>,
    ) -> Result<User, Error>;

    /// Add `delta` to one side of a user's counters.
    fn adjust_user_aggregate(
        &self,
        user_id: UserId,
        side: AggregateSide,
        delta: CounterDelta,
    ) -> Result<(), Error>;

    /// Store a new pending transaction.
    fn insert_transaction(
        &self,
        transaction: &ValidatedTransaction,
        created_at: OffsetDateTime,
    ) -> Result<Transaction, Error>;

    /// Get a transaction, failing with [Error::TransactionNotFound] if it does not exist.
    fn load_transaction(&self, id: TransactionId) -> Result<Transaction, Error>;

    /// Overwrite the status of a transaction.
    fn save_transaction_status(
        &self,
        id: TransactionId,
        status: TransactionStatus,
        updated_at: OffsetDateTime,
    ) -> Result<(), Error>;

    /// Get the transactions a user bought or sold, newest first.
    fn list_transactions_for_user(&self, user_id: UserId) -> Result<Vec<Transaction>, Error>;
}

impl LedgerStore for Connection {
    /// Runs `work` inside a `BEGIN IMMEDIATE` transaction.
    ///
    /// `IMMEDIATE` takes the database write lock before anything is read, so
    /// a second writer waits (up to the busy timeout) until this unit commits
    /// or rolls back and then reads the committed state. Dropping the
    /// transaction on error rolls it back.
    fn atomically<T, F>(&self, work: F) -> Result<T, Error>
    where
        F: FnOnce(&Self) -> Result<T, Error>,
    {
        let transaction = SqlTransaction::new_unchecked(self, TransactionBehavior::Immediate)?;

        let result = work(&*transaction)?;

        transaction.commit()?;

        Ok(result)
    }

    fn find_user(&self, user_id: UserId) -> Result<Option<User>, Error> {
        find_user(user_id, self)
    }

    fn ensure_user(&self, user_id: UserId, display_name: Option<&str>) -> Result<(), Error> {
        upsert_user(user_id, display_name, self)
    }

    fn set_scammer_flag(
        &self,
        user_id: UserId,
        is_scammer: bool,
        notes: Option<&str>,
    ) -> Result<User, Error> {
        update_scammer_flag(user_id, is_scammer, notes, self)
    }

    fn adjust_user_aggregate(
        &self,
        user_id: UserId,
        side: AggregateSide,
        delta: CounterDelta,
    ) -> Result<(), Error> {
        adjust_user_counters(user_id, side, delta, self)
    }

    fn insert_transaction(
        &self,
        transaction: &ValidatedTransaction,
        created_at: OffsetDateTime,
    ) -> Result<Transaction, Error> {
        insert_transaction(transaction, created_at, self)
    }

    fn load_transaction(&self, id: TransactionId) -> Result<Transaction, Error> {
        get_transaction(id, self)
    }

    fn save_transaction_status(
        &self,
        id: TransactionId,
        status: TransactionStatus,
        updated_at: OffsetDateTime,
    ) -> Result<(), Error> {
        update_transaction_status(id, status, updated_at, self)
    }

    fn list_transactions_for_user(&self, user_id: UserId) -> Result<Vec<Transaction>, Error> {
        get_transactions_for_user(user_id, self)
    }
}
