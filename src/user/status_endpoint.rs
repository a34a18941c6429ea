//! Defines the read-only user endpoints: the "show status" projection and the gate check.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::UserId,
    transaction::LedgerStore,
    user::{GateDecision, UserStatus, check_allowed},
};

/// The state needed to look up users.
#[derive(Debug, Clone)]
pub struct UserStatusState {
    /// The database connection for reading users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UserStatusState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for the "show status" command.
///
/// Users that have never bought or sold anything are reported as not found.
pub async fn get_user_status_endpoint(
    State(state): State<UserStatusState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<UserStatus>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let user = connection.find_user(user_id)?.ok_or(Error::NotFound)?;

    Ok(Json(UserStatus::from(&user)))
}

/// A route handler that asks the scammer gate about `user_id`.
pub async fn get_gate_decision_endpoint(
    State(state): State<UserStatusState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<GateDecision>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    check_allowed(user_id, &*connection).map(Json)
}
