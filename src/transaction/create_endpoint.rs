//! Defines the endpoint for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    transaction::{NewTransaction, TransactionSummary, create_transaction},
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for the "buy" command, responds with the new transaction's summary.
///
/// A body that does not deserialize into a [NewTransaction] is reported with the
/// same JSON error body as any other validation failure.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    request: Result<Json<NewTransaction>, JsonRejection>,
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

    match create_transaction(request, &*connection) {
        Ok(transaction) => (
            StatusCode::CREATED,
            Json(TransactionSummary::from(&transaction)),
        )
            .into_response(),
        Err(error) => {
            tracing::debug!("could not create transaction: {error}");
            error.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, body::to_bytes, extract::State, http::StatusCode, response::Response};
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use serde_json::Value;

    use crate::{
        database_id::UserId,
        db::initialize,
        transaction::{
            Transaction, count_transactions, create_endpoint::CreateTransactionState,
            create_transaction_endpoint, get_transaction,
        },
        user::update_scammer_flag,
    };

    fn get_test_state() -> CreateTransactionState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        CreateTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let state = get_test_state();
        let request = Transaction::build(UserId::new(1), "Sword", 2, dec!(10.00))
            .creator(Some(UserId::new(2)));

        let response = create_transaction_endpoint(State(state.clone()), Ok(Json(request))).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["id"], 1);
        assert_eq!(body["total_amount"], "20.00");
        assert_eq!(body["status"], "pending");
        assert_eq!(body["marker"], "⏳");

        let connection = state.db_connection.lock().unwrap();
        let transaction = get_transaction(1, &connection).unwrap();
        assert_eq!(transaction.item, "Sword");
    }

    #[tokio::test]
    async fn rejects_zero_quantity() {
        let state = get_test_state();
        let request = Transaction::build(UserId::new(1), "Sword", 0, dec!(10.00));

        let response = create_transaction_endpoint(State(state.clone()), Ok(Json(request))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection), Ok(0));
    }

    #[tokio::test]
    async fn rejects_flagged_buyer() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            update_scammer_flag(UserId::new(1), true, None, &connection).unwrap();
        }
        let request = Transaction::build(UserId::new(1), "Sword", 1, dec!(10.00));

        let response = create_transaction_endpoint(State(state.clone()), Ok(Json(request))).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("not allowed"));
    }
}
