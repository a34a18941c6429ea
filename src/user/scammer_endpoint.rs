//! Defines the moderator endpoint for flagging and clearing scammers.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State, rejection::JsonRejection},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    database_id::UserId,
    user::{UserStatus, set_scammer_flag},
};

/// The state needed to flag users.
#[derive(Debug, Clone)]
pub struct ScammerFlagState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ScammerFlagState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for setting the scammer flag.
#[derive(Debug, Deserialize)]
pub struct ScammerFlagRequest {
    /// `true` to flag the user, `false` to clear the flag.
    pub is_scammer: bool,
    /// Why the user was flagged. Ignored when clearing.
    #[serde(default)]
    pub notes: Option<String>,
}

/// A route handler that sets or clears the scammer flag, responds with the user's status.
pub async fn set_scammer_flag_endpoint(
    State(state): State<ScammerFlagState>,
    Path(user_id): Path<UserId>,
    request: Result<Json<ScammerFlagRequest>, JsonRejection>,
) -> Result<Json<UserStatus>, Error> {
    let Json(request) = request?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let user = set_scammer_flag(
        user_id,
        request.is_scammer,
        request.notes.as_deref(),
        &*connection,
    )?;

    Ok(Json(UserStatus::from(&user)))
}
