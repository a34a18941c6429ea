//! The lifecycle states of a transaction.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Where a transaction is in its lifecycle.
///
/// Only `Pending`, `Completed` and `Cancelled` can be reached through
/// [transition_transaction](crate::transaction::transition_transaction).
/// `Failed` and `Disputed` are recognised so that they can be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Waiting for a moderator to confirm payment.
    Pending,
    /// Payment was confirmed; counted in the buyer and seller totals.
    Completed,
    /// The purchase will not go ahead.
    Cancelled,
    /// Display only.
    Failed,
    /// Display only.
    Disputed,
}

impl TransactionStatus {
    /// The lowercase name used in the database and in requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Cancelled => "cancelled",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Disputed => "disputed",
        }
    }

    /// A capitalised name for display.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "Pending",
            TransactionStatus::Completed => "Completed",
            TransactionStatus::Cancelled => "Cancelled",
            TransactionStatus::Failed => "Failed",
            TransactionStatus::Disputed => "Disputed",
        }
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = Error;

    /// Parse a status name, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(TransactionStatus::Pending),
            "completed" => Ok(TransactionStatus::Completed),
            "cancelled" => Ok(TransactionStatus::Cancelled),
            "failed" => Ok(TransactionStatus::Failed),
            "disputed" => Ok(TransactionStatus::Disputed),
            _ => Err(Error::UnknownStatus(s.to_owned())),
        }
    }
}

impl ToSql for TransactionStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;

        raw.parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}
