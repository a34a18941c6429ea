//! An in-memory [LedgerStore] for testing the transaction service without SQLite.

use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, HashMap},
};

use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{TransactionId, UserId},
    transaction::{
        AggregateSide, CounterDelta, LedgerStore, Transaction, TransactionStatus,
        ValidatedTransaction,
    },
    user::User,
};

#[derive(Debug, Clone, Default)]
struct LedgerState {
    users: HashMap<UserId, User>,
    transactions: BTreeMap<TransactionId, Transaction>,
    next_id: TransactionId,
}

/// Keeps users and transactions in memory.
///
/// [LedgerStore::atomically] snapshots the state and restores it if the work
/// fails. Every aggregate adjustment is recorded so tests can check which
/// rows were touched.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RefCell<LedgerState>,
    adjustments: RefCell<Vec<(UserId, AggregateSide, CounterDelta)>>,
    fail_adjustments_for: Cell<Option<UserId>>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every aggregate adjustment for `user_id` fail with a persistence error.
    pub fn fail_adjustments_for(&self, user_id: UserId) {
        self.fail_adjustments_for.set(Some(user_id));
    }

    /// The aggregate adjustments that were applied, in order.
    ///
    /// Adjustments from rolled back units are included.
    pub fn adjustments(&self) -> Vec<(UserId, AggregateSide, CounterDelta)> {
        self.adjustments.borrow().clone()
    }

    /// The user with `user_id`.
    ///
    /// # Panics
    /// Panics if the user does not exist.
    pub fn user(&self, user_id: UserId) -> User {
        self.state
            .borrow()
            .users
            .get(&user_id)
            .cloned()
            .expect("user should exist")
    }

    /// The number of stored transactions.
    pub fn transaction_count(&self) -> usize {
        self.state.borrow().transactions.len()
    }
}

impl LedgerStore for InMemoryLedger {
    fn atomically<T, F>(&self, work: F) -> Result<T, Error>
    where
        F: FnOnce(&Self) -> Result<T, Error>,
    {
        let snapshot = self.state.borrow().clone();

        let result = work(self);

        if result.is_err() {
            *self.state.borrow_mut() = snapshot;
        }

        result
    }

    fn find_user(&self, user_id: UserId) -> Result<Option<User>, Error> {
        Ok(self.state.borrow().users.get(&user_id).cloned())
    }

    fn ensure_user(&self, user_id: UserId, display_name: Option<&str>) -> Result<(), Error> {
        let mut state = self.state.borrow_mut();
        let user = state
            .users
            .entry(user_id)
            .or_insert_with(|| User::new(user_id, ""));

        if let Some(name) = display_name {
            user.display_name = name.to_owned();
        }

        Ok(())
    }

    fn set_scammer_flag(
        &self,
        user_id: UserId,
        is_scammer: bool,
        notes: Option<&str>,
    ) -> Result<User, Error> {
        let mut state = self.state.borrow_mut();
        let user = state
            .users
            .entry(user_id)
            .or_insert_with(|| User::new(user_id, ""));

        user.is_scammer = is_scammer;
        user.scammer_notes = if is_scammer {
            notes.map(str::to_owned)
        } else {
            None
        };

        Ok(user.clone())
    }

    fn adjust_user_aggregate(
        &self,
        user_id: UserId,
        side: AggregateSide,
        delta: CounterDelta,
    ) -> Result<(), Error> {
        self.adjustments.borrow_mut().push((user_id, side, delta));

        if self.fail_adjustments_for.get() == Some(user_id) {
            return Err(Error::DatabaseLockError);
        }

        let mut state = self.state.borrow_mut();
        let user = state.users.get_mut(&user_id).ok_or(Error::NotFound)?;

        user.apply(side, delta)
    }

    fn insert_transaction(
        &self,
        transaction: &ValidatedTransaction,
        created_at: OffsetDateTime,
    ) -> Result<Transaction, Error> {
        let mut state = self.state.borrow_mut();

        let known = |id: UserId| state.users.contains_key(&id);
        if !known(transaction.buyer_id()) || !transaction.creator_id().is_none_or(known) {
            return Err(Error::NotFound);
        }

        state.next_id += 1;
        let stored = Transaction {
            id: state.next_id,
            buyer_id: transaction.buyer_id(),
            creator_id: transaction.creator_id(),
            item: transaction.item().to_owned(),
            quantity: transaction.quantity(),
            unit_price: transaction.unit_price(),
            total_amount: transaction.total_amount(),
            status: TransactionStatus::Pending,
            created_at,
            updated_at: created_at,
        };
        state.transactions.insert(stored.id, stored.clone());

        Ok(stored)
    }

    fn load_transaction(&self, id: TransactionId) -> Result<Transaction, Error> {
        self.state
            .borrow()
            .transactions
            .get(&id)
            .cloned()
            .ok_or(Error::TransactionNotFound(id))
    }

    fn save_transaction_status(
        &self,
        id: TransactionId,
        status: TransactionStatus,
        updated_at: OffsetDateTime,
    ) -> Result<(), Error> {
        let mut state = self.state.borrow_mut();
        let transaction = state
            .transactions
            .get_mut(&id)
            .ok_or(Error::TransactionNotFound(id))?;

        transaction.status = status;
        transaction.updated_at = updated_at;

        Ok(())
    }

    fn list_transactions_for_user(&self, user_id: UserId) -> Result<Vec<Transaction>, Error> {
        Ok(self
            .state
            .borrow()
            .transactions
            .values()
            .rev()
            .filter(|transaction| {
                transaction.buyer_id == user_id || transaction.creator_id == Some(user_id)
            })
            .cloned()
            .collect())
    }
}
