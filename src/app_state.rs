//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, db::initialize};

/// The state of the REST server.
///
/// Route handlers take the smaller per-endpoint state structs, which are
/// extracted from this one with `FromRef`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the user and
    /// transaction tables if they do not exist yet.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{AppState, transaction::count_transactions, user::count_users};

    #[test]
    fn new_initializes_database() {
        let state = AppState::new(Connection::open_in_memory().unwrap()).unwrap();

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_users(&connection), Ok(0));
        assert_eq!(count_transactions(&connection), Ok(0));
    }
}
