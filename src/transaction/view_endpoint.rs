//! Defines the read-only endpoints for a single transaction and a user's history.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::{TransactionId, UserId},
    transaction::{
        HistorySummary, TransactionSummary, get_transaction_by_id, list_transactions_for_user,
    },
};

/// The state needed to view transactions.
#[derive(Debug, Clone)]
pub struct ViewTransactionsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ViewTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for getting one transaction's summary.
pub async fn get_transaction_endpoint(
    State(state): State<ViewTransactionsState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<TransactionSummary>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction_by_id(transaction_id, &*connection)?;

    Ok(Json(TransactionSummary::from(&transaction)))
}

/// A route handler for the "show history" command.
pub async fn get_history_endpoint(
    State(state): State<ViewTransactionsState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<HistorySummary>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = list_transactions_for_user(user_id, &*connection)?;

    Ok(Json(HistorySummary::new(user_id, &transactions)))
}
