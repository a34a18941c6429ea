//! Opening and initializing the ledger database.

use std::{path::Path, time::Duration};

use rusqlite::{Connection, Row, Transaction as SqlTransaction, TransactionBehavior, types::Type};
use rust_decimal::Decimal;

use crate::{Error, transaction::create_transaction_table, user::create_user_table};

/// How long a connection waits for another writer to release the database
/// before giving up with `SQLITE_BUSY`.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open a connection to the SQLite database at `path` and create the ledger
/// tables if they do not exist yet.
///
/// Foreign keys are enforced and the connection waits up to [BUSY_TIMEOUT]
/// for concurrent writers.
///
/// # Errors
/// Returns an [Error::SqlError] if the database cannot be opened or initialized.
pub fn open(path: impl AsRef<Path>) -> Result<Connection, Error> {
    let connection = Connection::open(path)?;
    configure(&connection)?;
    initialize(&connection)?;

    Ok(connection)
}

/// Apply the connection settings the ledger relies on.
///
/// # Errors
/// Returns an [Error::SqlError] if a pragma cannot be set.
pub fn configure(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", true)?;
    connection.busy_timeout(BUSY_TIMEOUT)?;

    Ok(())
}

/// Create the tables for the domain models.
///
/// This is idempotent, so it is safe to call on every start up.
///
/// # Errors
/// Returns an [Error::SqlError] if a table cannot be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Read a decimal amount stored as text in column `index`.
pub(crate) fn get_decimal(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let raw: String = row.get(index)?;

    raw.parse::<Decimal>().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
    })
}
