//! Tradepost is the transaction ledger behind a community trading bot.
//!
//! It records purchases between members, moves them through their lifecycle
//! (pending, completed or cancelled) and keeps each member's purchase and
//! sales totals consistent with the statuses of their transactions. Members
//! flagged as scammers are stopped from starting new purchases.
//!
//! This library provides a JSON REST API that the chat bot calls for its
//! "buy", "mark complete", "mark cancelled", "show history" and "show status"
//! commands.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod database_id;
mod db;
mod endpoints;
mod error;
mod logging;
mod routing;
mod transaction;
mod user;

pub use app_state::AppState;
pub use database_id::{TransactionId, UserId};
pub use db::{BUSY_TIMEOUT, configure as configure_db, initialize as initialize_db, open as open_db};
pub use error::{Error, ErrorKind};
pub use logging::{LOG_BODY_LENGTH_LIMIT, MAX_REQUEST_BODY_BYTES, logging_middleware};
pub use routing::build_router;
pub use transaction::{
    AggregateDelta, AggregateSide, CounterDelta, HistorySummary, LedgerStore, NewTransaction,
    Transaction, TransactionStatus, TransactionSummary, ValidatedTransaction, count_transactions,
    create_transaction, get_transaction_by_id, list_transactions_for_user, reconcile,
    status_marker, transition_transaction, transition_transaction_named,
};
pub use user::{
    GateDecision, User, UserStatus, check_allowed, count_users, get_user, set_scammer_flag,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Could not listen for ctrl+c: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("Could not listen for the terminate signal: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
