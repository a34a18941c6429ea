//! The user aggregate model and its database queries.

use rusqlite::{Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::UserId,
    db::get_decimal,
    transaction::{AggregateSide, CounterDelta},
};

// ============================================================================
// MODELS
// ============================================================================

/// A member of the community and their running purchase and sales totals.
///
/// The counters are only ever changed by applying a [CounterDelta] computed
/// by the reconciliation rules, so they always equal the totals over the
/// user's completed transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The caller-supplied ID of the user.
    pub id: UserId,
    /// The name last reported for the user. May be empty.
    pub display_name: String,
    /// Whether a moderator has flagged the user as a scammer.
    pub is_scammer: bool,
    /// Free text the moderator left with the flag.
    pub scammer_notes: Option<String>,
    /// How many completed transactions the user bought.
    pub purchases_count: i64,
    /// The total amount of the user's completed purchases.
    pub amount_spent: Decimal,
    /// How many completed transactions the user sold.
    pub sales_count: i64,
    /// The total amount of the user's completed sales.
    pub amount_earned: Decimal,
}

impl User {
    /// A user with no activity and no flag.
    pub fn new(id: UserId, display_name: &str) -> Self {
        Self {
            id,
            display_name: display_name.to_owned(),
            is_scammer: false,
            scammer_notes: None,
            purchases_count: 0,
            amount_spent: Decimal::ZERO,
            sales_count: 0,
            amount_earned: Decimal::ZERO,
        }
    }

    /// Add `delta` to the counters for `side`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NegativeAggregate] if a counter would drop below zero,
    /// - or [Error::AggregateOverflow] if a counter would not fit its type,
    ///
    /// in which case `self` is left unchanged.
    pub fn apply(&mut self, side: AggregateSide, delta: CounterDelta) -> Result<(), Error> {
        let (count, amount) = match side {
            AggregateSide::Buyer => (self.purchases_count, self.amount_spent),
            AggregateSide::Seller => (self.sales_count, self.amount_earned),
        };

        let (Some(new_count), Some(new_amount)) = (
            count.checked_add(delta.count),
            amount.checked_add(delta.amount),
        ) else {
            return Err(Error::AggregateOverflow(self.id));
        };

        if new_count < 0 || new_amount < Decimal::ZERO {
            return Err(Error::NegativeAggregate(self.id));
        }

        match side {
            AggregateSide::Buyer => {
                self.purchases_count = new_count;
                self.amount_spent = new_amount;
            }
            AggregateSide::Seller => {
                self.sales_count = new_count;
                self.amount_earned = new_amount;
            }
        }

        Ok(())
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                display_name TEXT NOT NULL DEFAULT '',
                is_scammer INTEGER NOT NULL DEFAULT 0,
                scammer_notes TEXT,
                purchases_count INTEGER NOT NULL DEFAULT 0 CHECK (purchases_count >= 0),
                amount_spent TEXT NOT NULL DEFAULT '0',
                sales_count INTEGER NOT NULL DEFAULT 0 CHECK (sales_count >= 0),
                amount_earned TEXT NOT NULL DEFAULT '0',
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create the user if they do not exist yet.
///
/// If `display_name` is given it replaces the stored name, otherwise the
/// stored name is kept. Counters and flags are never touched.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn upsert_user(
    user_id: UserId,
    display_name: Option<&str>,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO user (id, display_name, created_at) VALUES (?1, COALESCE(?2, ''), ?3)
         ON CONFLICT(id) DO UPDATE SET display_name = COALESCE(?2, display_name)",
        (user_id, display_name, OffsetDateTime::now_utc()),
    )?;

    Ok(())
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a known user ([Error::NotFound]),
/// - there was an error trying to access the store.
pub fn get_user(user_id: UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, display_name, is_scammer, scammer_notes, purchases_count, amount_spent,
                    sales_count, amount_earned
             FROM user WHERE id = :id",
        )?
        .query_row(&[(":id", &user_id)], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user with `user_id`, or `None` if they have never been seen.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn find_user(user_id: UserId, connection: &Connection) -> Result<Option<User>, Error> {
    let user = connection
        .prepare(
            "SELECT id, display_name, is_scammer, scammer_notes, purchases_count, amount_spent,
                    sales_count, amount_earned
             FROM user WHERE id = :id",
        )?
        .query_row(&[(":id", &user_id)], map_user_row)
        .optional()?;

    Ok(user)
}

/// Flag or clear the scammer flag for `user_id`, creating the user if needed.
///
/// Clearing the flag also clears the notes.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn update_scammer_flag(
    user_id: UserId,
    is_scammer: bool,
    notes: Option<&str>,
    connection: &Connection,
) -> Result<User, Error> {
    let notes = if is_scammer { notes } else { None };

    connection.execute(
        "INSERT INTO user (id, is_scammer, scammer_notes, created_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET is_scammer = ?2, scammer_notes = ?3",
        (user_id, is_scammer, notes, OffsetDateTime::now_utc()),
    )?;

    get_user(user_id, connection)
}

/// Add `delta` to the buyer or seller counters of `user_id`.
///
/// The amounts are stored as text to keep them exact, so the new totals are
/// computed here rather than in SQL. Callers must hold a write transaction.
///
/// # Errors
///
/// This function will return a:
/// - [Error::NotFound] if `user_id` does not refer to a known user,
/// - [Error::NegativeAggregate] if a counter would drop below zero,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn adjust_user_counters(
    user_id: UserId,
    side: AggregateSide,
    delta: CounterDelta,
    connection: &Connection,
) -> Result<(), Error> {
    let mut user = get_user(user_id, connection)?;
    user.apply(side, delta)?;

    let (count, amount) = match side {
        AggregateSide::Buyer => (user.purchases_count, user.amount_spent),
        AggregateSide::Seller => (user.sales_count, user.amount_earned),
    };

    let query = match side {
        AggregateSide::Buyer => {
            "UPDATE user SET purchases_count = ?1, amount_spent = ?2 WHERE id = ?3"
        }
        AggregateSide::Seller => {
            "UPDATE user SET sales_count = ?1, amount_earned = ?2 WHERE id = ?3"
        }
    };

    connection.execute(query, (count, amount.to_string(), user_id))?;

    Ok(())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: row.get(0)?,
        display_name: row.get(1)?,
        is_scammer: row.get(2)?,
        scammer_notes: row.get(3)?,
        purchases_count: row.get(4)?,
        amount_spent: get_decimal(row, 5)?,
        sales_count: row.get(6)?,
        amount_earned: get_decimal(row, 7)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::{
        Error,
        database_id::UserId,
        transaction::{AggregateSide, CounterDelta},
        user::core::{
            User, adjust_user_counters, count_users, create_user_table, find_user, get_user,
            update_scammer_flag, upsert_user,
        },
    };

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    #[test]
    fn upsert_creates_zeroed_user() {
        let conn = get_db_connection();
        let id = UserId::new(42);

        upsert_user(id, Some("Alice"), &conn).unwrap();

        assert_eq!(get_user(id, &conn), Ok(User::new(id, "Alice")));
    }

    #[test]
    fn upsert_keeps_name_when_none_given() {
        let conn = get_db_connection();
        let id = UserId::new(42);
        upsert_user(id, Some("Alice"), &conn).unwrap();

        upsert_user(id, None, &conn).unwrap();

        assert_eq!(get_user(id, &conn).unwrap().display_name, "Alice");
        assert_eq!(count_users(&conn), Ok(1));
    }

    #[test]
    fn upsert_renames_existing_user_without_touching_counters() {
        let conn = get_db_connection();
        let id = UserId::new(42);
        upsert_user(id, Some("Alice"), &conn).unwrap();
        adjust_user_counters(
            id,
            AggregateSide::Buyer,
            CounterDelta::new(1, dec!(5.00)),
            &conn,
        )
        .unwrap();

        upsert_user(id, Some("Alicia"), &conn).unwrap();

        let user = get_user(id, &conn).unwrap();
        assert_eq!(user.display_name, "Alicia");
        assert_eq!(user.purchases_count, 1);
        assert_eq!(user.amount_spent, dec!(5.00));
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let conn = get_db_connection();

        assert_eq!(get_user(UserId::new(42), &conn), Err(Error::NotFound));
        assert_eq!(find_user(UserId::new(42), &conn), Ok(None));
    }

    #[test]
    fn flagging_creates_user_and_stores_notes() {
        let conn = get_db_connection();
        let id = UserId::new(7);

        let user = update_scammer_flag(id, true, Some("charged back twice"), &conn).unwrap();

        assert!(user.is_scammer);
        assert_eq!(user.scammer_notes.as_deref(), Some("charged back twice"));
    }

    #[test]
    fn clearing_flag_clears_notes() {
        let conn = get_db_connection();
        let id = UserId::new(7);
        update_scammer_flag(id, true, Some("charged back twice"), &conn).unwrap();

        let user = update_scammer_flag(id, false, Some("ignored"), &conn).unwrap();

        assert!(!user.is_scammer);
        assert_eq!(user.scammer_notes, None);
    }

    #[test]
    fn adjust_updates_only_requested_side() {
        let conn = get_db_connection();
        let id = UserId::new(1);
        upsert_user(id, None, &conn).unwrap();

        adjust_user_counters(
            id,
            AggregateSide::Seller,
            CounterDelta::new(1, dec!(20.00)),
            &conn,
        )
        .unwrap();

        let user = get_user(id, &conn).unwrap();
        assert_eq!(user.sales_count, 1);
        assert_eq!(user.amount_earned, dec!(20.00));
        assert_eq!(user.purchases_count, 0);
        assert_eq!(user.amount_spent, dec!(0));
    }

    #[test]
    fn adjust_rejects_negative_result() {
        let conn = get_db_connection();
        let id = UserId::new(1);
        upsert_user(id, None, &conn).unwrap();

        let result = adjust_user_counters(
            id,
            AggregateSide::Buyer,
            CounterDelta::new(-1, dec!(-5.00)),
            &conn,
        );

        assert_eq!(result, Err(Error::NegativeAggregate(id)));
        assert_eq!(get_user(id, &conn).unwrap(), User::new(id, ""));
    }

    #[test]
    fn apply_rejects_amount_overflow() {
        let mut user = User::new(UserId::new(1), "Alice");
        user.purchases_count = 1;
        user.amount_spent = Decimal::MAX;

        let result = user.apply(AggregateSide::Buyer, CounterDelta::new(1, dec!(1)));

        assert_eq!(result, Err(Error::AggregateOverflow(UserId::new(1))));
        assert_eq!(user.purchases_count, 1);
        assert_eq!(user.amount_spent, Decimal::MAX);
    }

    #[test]
    fn apply_rejects_count_overflow() {
        let mut user = User::new(UserId::new(1), "Alice");
        user.sales_count = i64::MAX;

        let result = user.apply(AggregateSide::Seller, CounterDelta::new(1, dec!(1)));

        assert_eq!(result, Err(Error::AggregateOverflow(UserId::new(1))));
        assert_eq!(user.sales_count, i64::MAX);
        assert_eq!(user.amount_earned, Decimal::ZERO);
    }

    #[test]
    fn adjust_fails_for_unknown_user() {
        let conn = get_db_connection();

        let result = adjust_user_counters(
            UserId::new(99),
            AggregateSide::Buyer,
            CounterDelta::new(1, dec!(1)),
            &conn,
        );

        assert_eq!(result, Err(Error::NotFound));
    }
}
