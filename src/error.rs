//! Defines the app level error type and its conversion to JSON responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    database_id::{TransactionId, UserId},
    transaction::TransactionStatus,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A transaction was requested with a quantity of zero.
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(u32),

    /// A transaction was requested with a unit price that is zero or negative.
    #[error("unit price must be greater than zero, got {0}")]
    InvalidUnitPrice(Decimal),

    /// An empty string was used as the item label of a transaction.
    #[error("item name cannot be empty")]
    EmptyItemName,

    /// The total amount (quantity × unit price) does not fit in a decimal.
    #[error("the total amount is too large")]
    AmountOverflow,

    /// A request body was not valid JSON or did not have the expected fields.
    #[error("invalid request body: {0}")]
    InvalidRequestBody(String),

    /// A request body was larger than the server accepts.
    #[error("the request body is too large")]
    RequestBodyTooLarge,

    /// No transaction exists with the given ID.
    #[error("transaction #{0} could not be found")]
    TransactionNotFound(TransactionId),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The requested status change is not part of the transaction lifecycle.
    #[error("cannot move a transaction from {from} to {to}")]
    InvalidTransition {
        /// The status currently stored for the transaction.
        from: TransactionStatus,
        /// The status that was requested.
        to: TransactionStatus,
    },

    /// A status string did not name a known transaction status.
    #[error("\"{0}\" is not a valid transaction status")]
    UnknownStatus(String),

    /// The buyer has been flagged as a scammer and may not start new transactions.
    #[error("user {user_id} is flagged as a scammer")]
    ScammerDenied {
        /// The flagged user.
        user_id: UserId,
        /// The moderator notes recorded with the flag, if any.
        notes: Option<String>,
    },

    /// Applying an aggregate delta would have made a user's counters negative.
    ///
    /// The reconciliation rules never produce this, so it indicates that the
    /// stored counters were edited outside the ledger.
    #[error("the aggregate counters for user {0} would become negative")]
    NegativeAggregate(UserId),

    /// Applying an aggregate delta would have pushed a user's counters past
    /// the largest value they can hold.
    #[error("the aggregate counters for user {0} are too large")]
    AggregateOverflow(UserId),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequestBody(rejection.body_text())
    }
}

/// The broad categories of [Error] that callers react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input when creating a transaction.
    Validation,
    /// An unknown transaction or user.
    NotFound,
    /// A status change outside the transaction lifecycle.
    InvalidTransition,
    /// The scammer gate rejected the buyer.
    ScammerDenied,
    /// The store is unavailable or rejected a write.
    Persistence,
}

impl Error {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidQuantity(_)
            | Error::InvalidUnitPrice(_)
            | Error::EmptyItemName
            | Error::AmountOverflow
            | Error::InvalidRequestBody(_)
            | Error::RequestBodyTooLarge => ErrorKind::Validation,
            Error::TransactionNotFound(_) | Error::NotFound => ErrorKind::NotFound,
            Error::InvalidTransition { .. } | Error::UnknownStatus(_) => {
                ErrorKind::InvalidTransition
            }
            Error::ScammerDenied { .. } => ErrorKind::ScammerDenied,
            Error::NegativeAggregate(_)
            | Error::AggregateOverflow(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => ErrorKind::Persistence,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::Validation if matches!(self, Error::RequestBodyTooLarge) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidTransition => StatusCode::CONFLICT,
            ErrorKind::ScammerDenied => StatusCode::FORBIDDEN,
            ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match self {
            Error::ScammerDenied { .. } => {
                "You are not allowed to make purchases. Contact a moderator.".to_owned()
            }
            // Internal details are only meant for the server logs.
            error if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("An unexpected error occurred: {}", error);
                "Something went wrong, please try again later.".to_owned()
            }
            error => error.to_string(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
