//! The transaction ledger.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` record, its status and creation-time validation
//! - The reconciliation rules that turn status changes into counter changes
//! - The [LedgerStore] seam and its SQLite implementation
//! - The service functions and route handlers the chat bot calls
//! - Display summaries for transactions and transaction history

mod core;
mod create_endpoint;
mod projection;
pub mod reconcile;
mod service;
mod status;
mod status_endpoint;
mod store;
#[cfg(test)]
mod test_utils;
mod view_endpoint;

pub use core::{
    NewTransaction, Transaction, ValidatedTransaction, count_transactions, create_transaction_table,
};
pub use create_endpoint::create_transaction_endpoint;
pub use projection::{HistorySummary, TransactionSummary, status_marker};
pub use reconcile::{AggregateDelta, AggregateSide, CounterDelta};
pub use service::{
    create_transaction, get_transaction_by_id, list_transactions_for_user, transition_transaction,
    transition_transaction_named,
};
pub use status::TransactionStatus;
pub use status_endpoint::update_transaction_status_endpoint;
pub use store::LedgerStore;
pub use view_endpoint::{get_history_endpoint, get_transaction_endpoint};

#[cfg(test)]
pub use core::{
    get_transaction, get_transactions_for_user, insert_transaction, update_transaction_status,
};
#[cfg(test)]
pub use test_utils::InMemoryLedger;
