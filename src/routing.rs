//! Application router configuration.

use axum::{
    Router, middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};

use crate::{
    AppState, Error, endpoints,
    logging::logging_middleware,
    transaction::{
        create_transaction_endpoint, get_history_endpoint, get_transaction_endpoint,
        update_transaction_status_endpoint,
    },
    user::{get_gate_decision_endpoint, get_user_status_endpoint, set_scammer_flag_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            endpoints::TRANSACTIONS_API,
            post(create_transaction_endpoint),
        )
        .route(endpoints::TRANSACTION, get(get_transaction_endpoint))
        .route(
            endpoints::TRANSACTION_STATUS,
            put(update_transaction_status_endpoint),
        )
        .route(endpoints::USER, get(get_user_status_endpoint))
        .route(endpoints::USER_TRANSACTIONS, get(get_history_endpoint))
        .route(endpoints::USER_GATE, get(get_gate_decision_endpoint))
        .route(endpoints::USER_SCAMMER, put(set_scammer_flag_endpoint))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
