//! Defines the endpoint for marking a transaction completed or cancelled.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    database_id::TransactionId,
    transaction::{TransactionSummary, transition_transaction_named},
};

/// The state needed to change a transaction's status.
#[derive(Debug, Clone)]
pub struct TransactionStatusState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionStatusState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for changing a transaction's status.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    /// The status name, e.g. "completed" or "cancelled".
    ///
    /// Kept as a string so that unknown names are reported as an invalid
    /// transition rather than a malformed request.
    pub status: String,
}

/// A route handler for the "mark complete" and "mark cancelled" commands.
pub async fn update_transaction_status_endpoint(
    State(state): State<TransactionStatusState>,
    Path(transaction_id): Path<TransactionId>,
    request: Result<Json<StatusRequest>, JsonRejection>,
) -> Response {
    let request = match request {
        Ok(Json(request)) => request,
        Err(rejection) => return Error::from(rejection).into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match transition_transaction_named(transaction_id, &request.status, &*connection) {
        Ok(transaction) => Json(TransactionSummary::from(&transaction)).into_response(),
        Err(error) => {
            tracing::debug!(
                "could not move transaction {transaction_id} to {}: {error}",
                request.status
            );
            error.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json,
        extract::{Path, State, rejection::JsonRejection},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use rust_decimal_macros::dec;

    use crate::{
        database_id::UserId,
        db::initialize,
        transaction::{
            Transaction, TransactionStatus, create_transaction, get_transaction,
            status_endpoint::{StatusRequest, TransactionStatusState},
            update_transaction_status_endpoint,
        },
        user::get_user,
    };

    fn get_test_state() -> TransactionStatusState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        create_transaction(
            Transaction::build(UserId::new(1), "Sword", 2, dec!(10.00))
                .creator(Some(UserId::new(2))),
            &conn,
        )
        .unwrap();

        TransactionStatusState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    fn request(status: &str) -> Result<Json<StatusRequest>, JsonRejection> {
        Ok(Json(StatusRequest {
            status: status.to_owned(),
        }))
    }

    #[tokio::test]
    async fn completes_transaction() {
        let state = get_test_state();

        let response =
            update_transaction_status_endpoint(State(state.clone()), Path(1), request("completed"))
                .await;

        assert_eq!(response.status(), StatusCode::OK);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_transaction(1, &connection).unwrap().status,
            TransactionStatus::Completed
        );
        assert_eq!(get_user(UserId::new(2), &connection).unwrap().sales_count, 1);
    }

    #[tokio::test]
    async fn unknown_status_is_conflict() {
        let state = get_test_state();

        let response =
            update_transaction_status_endpoint(State(state.clone()), Path(1), request("shipped"))
                .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn missing_transaction_is_not_found() {
        let state = get_test_state();

        let response =
            update_transaction_status_endpoint(State(state), Path(99), request("cancelled")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
