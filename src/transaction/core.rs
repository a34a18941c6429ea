//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{TransactionId, UserId},
    db::get_decimal,
    transaction::TransactionStatus,
};

// ============================================================================
// MODELS
// ============================================================================

/// A purchase of an item by a buyer, optionally from a creator who sold it.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user who is buying.
    pub buyer_id: UserId,
    /// The user who sold the item, if any.
    pub creator_id: Option<UserId>,
    /// What was bought.
    pub item: String,
    /// How many units were bought. Always at least one.
    pub quantity: u32,
    /// The price of one unit. Always greater than zero.
    pub unit_price: Decimal,
    /// `quantity × unit_price`, fixed when the transaction is created.
    pub total_amount: Decimal,
    /// Where the transaction is in its lifecycle.
    pub status: TransactionStatus,
    /// When the transaction was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the status last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// Start describing a new purchase.
    ///
    /// Shortcut for [NewTransaction] for discoverability.
    pub fn build(
        buyer_id: UserId,
        item: &str,
        quantity: u32,
        unit_price: Decimal,
    ) -> NewTransaction {
        NewTransaction {
            buyer_id,
            buyer_name: None,
            creator_id: None,
            creator_name: None,
            item: item.to_owned(),
            quantity,
            unit_price,
        }
    }
}

/// A request to record a purchase, before it has been validated.
///
/// # Examples
///
/// ```ignore
/// use rust_decimal_macros::dec;
///
/// let request = Transaction::build(UserId::new(1), "Sword", 2, dec!(10.00))
///     .creator(Some(UserId::new(2)))
///     .buyer_name("Alice");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    /// The user who is buying.
    pub buyer_id: UserId,
    /// The buyer's current display name, used to refresh the stored name.
    #[serde(default)]
    pub buyer_name: Option<String>,
    /// The user who sold the item. `None` means nobody is credited with a sale.
    #[serde(default)]
    pub creator_id: Option<UserId>,
    /// The creator's current display name.
    #[serde(default)]
    pub creator_name: Option<String>,
    /// What is being bought.
    pub item: String,
    /// How many units are being bought.
    pub quantity: u32,
    /// The price of one unit.
    pub unit_price: Decimal,
}

impl NewTransaction {
    /// Set the creator who is credited with the sale.
    pub fn creator(mut self, creator_id: Option<UserId>) -> Self {
        self.creator_id = creator_id;
        self
    }

    /// Set the buyer's display name.
    pub fn buyer_name(mut self, name: &str) -> Self {
        self.buyer_name = Some(name.to_owned());
        self
    }

    /// Set the creator's display name.
    pub fn creator_name(mut self, name: &str) -> Self {
        self.creator_name = Some(name.to_owned());
        self
    }

    /// Check the request and compute the total amount.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidQuantity] if `quantity` is zero,
    /// - [Error::InvalidUnitPrice] if `unit_price` is not greater than zero,
    /// - [Error::EmptyItemName] if `item` is empty or whitespace,
    /// - or [Error::AmountOverflow] if the total does not fit in a decimal.
    pub fn validate(self) -> Result<ValidatedTransaction, Error> {
        if self.quantity < 1 {
            return Err(Error::InvalidQuantity(self.quantity));
        }

        if self.unit_price <= Decimal::ZERO {
            return Err(Error::InvalidUnitPrice(self.unit_price));
        }

        let item = self.item.trim();
        if item.is_empty() {
            return Err(Error::EmptyItemName);
        }

        let total_amount = Decimal::from(self.quantity)
            .checked_mul(self.unit_price)
            .ok_or(Error::AmountOverflow)?;

        Ok(ValidatedTransaction {
            buyer_id: self.buyer_id,
            buyer_name: self.buyer_name,
            creator_id: self.creator_id,
            creator_name: self.creator_name,
            item: item.to_owned(),
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_amount,
        })
    }
}

/// A purchase request that passed [NewTransaction::validate].
///
/// The fields are private so that one can only be made by validating.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTransaction {
    buyer_id: UserId,
    buyer_name: Option<String>,
    creator_id: Option<UserId>,
    creator_name: Option<String>,
    item: String,
    quantity: u32,
    unit_price: Decimal,
    total_amount: Decimal,
}

impl ValidatedTransaction {
    /// The user who is buying.
    pub fn buyer_id(&self) -> UserId {
        self.buyer_id
    }

    /// The buyer's display name, if the caller supplied one.
    pub fn buyer_name(&self) -> Option<&str> {
        self.buyer_name.as_deref()
    }

    /// The user credited with the sale.
    pub fn creator_id(&self) -> Option<UserId> {
        self.creator_id
    }

    /// The creator's display name, if the caller supplied one.
    pub fn creator_name(&self) -> Option<&str> {
        self.creator_name.as_deref()
    }

    /// The trimmed item label.
    pub fn item(&self) -> &str {
        &self.item
    }

    /// How many units are being bought.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// The price of one unit.
    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// `quantity × unit_price`.
    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Insert a pending transaction.
///
/// The buyer and creator must already exist in the user table.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the buyer or creator is not a known user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn insert_transaction(
    transaction: &ValidatedTransaction,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "INSERT INTO \"transaction\"
                (buyer_id, creator_id, item, quantity, unit_price, total_amount, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
             RETURNING id, buyer_id, creator_id, item, quantity, unit_price, total_amount, status, created_at, updated_at",
        )?
        .query_row(
            (
                transaction.buyer_id,
                transaction.creator_id,
                &transaction.item,
                transaction.quantity,
                transaction.unit_price.to_string(),
                transaction.total_amount.to_string(),
                TransactionStatus::Pending,
                created_at,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::NotFound,
            error => error.into(),
        })
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    connection
        .prepare(
            "SELECT id, buyer_id, creator_id, item, quantity, unit_price, total_amount, status, created_at, updated_at
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::TransactionNotFound(id),
            error => error.into(),
        })
}

/// Retrieve the transactions a user bought or sold, newest first.
///
/// Transactions created in the same instant are ordered by ID.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transactions_for_user(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, buyer_id, creator_id, item, quantity, unit_price, total_amount, status, created_at, updated_at
             FROM \"transaction\"
             WHERE buyer_id = :user_id OR creator_id = :user_id
             ORDER BY created_at DESC, id DESC",
        )?
        .query_map(&[(":user_id", &user_id)], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Overwrite the status of transaction `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction_status(
    id: TransactionId,
    status: TransactionStatus,
    updated_at: OffsetDateTime,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE \"transaction\" SET status = ?1, updated_at = ?2 WHERE id = ?3",
        (status, updated_at, id),
    )?;

    if rows_affected == 0 {
        return Err(Error::TransactionNotFound(id));
    }

    Ok(())
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                buyer_id INTEGER NOT NULL,
                creator_id INTEGER,
                item TEXT NOT NULL,
                quantity INTEGER NOT NULL CHECK (quantity >= 1),
                unit_price TEXT NOT NULL,
                total_amount TEXT NOT NULL,
                status TEXT NOT NULL
                    CHECK (status IN ('pending', 'completed', 'cancelled', 'failed', 'disputed')),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(buyer_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE RESTRICT,
                FOREIGN KEY(creator_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE RESTRICT
                );

        CREATE INDEX IF NOT EXISTS idx_transaction_buyer ON \"transaction\"(buyer_id);
        CREATE INDEX IF NOT EXISTS idx_transaction_creator ON \"transaction\"(creator_id);",
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        buyer_id: row.get(1)?,
        creator_id: row.get(2)?,
        item: row.get(3)?,
        quantity: row.get(4)?,
        unit_price: get_decimal(row, 5)?,
        total_amount: get_decimal(row, 6)?,
        status: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
