//! Defines the core data models and database queries for transactions.
//!
//! Every query is scoped to an owner: a transaction can only be read, changed
//! or deleted by the user that recorded it, and it can only use one of that
//! user's categories.

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    auth::UserID,
    category::{CategoryId, CategoryKind},
};

/// Database identifier for a transaction.
pub type TransactionId = i64;

/// The longest a transaction title may be, counted in characters.
pub const MAX_TITLE_LENGTH: usize = 100;

/// The smallest amount a transaction may have.
pub const MIN_AMOUNT: f64 = 0.01;

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that recorded the transaction.
    pub user_id: UserID,
    /// The ID of the category the transaction belongs to.
    pub category_id: CategoryId,
    /// The name of the category, loaded alongside the transaction for display.
    pub category_name: String,
    /// Whether money came in or went out.
    pub kind: CategoryKind,
    /// A short description of what the transaction was for.
    pub title: String,
    /// The positive amount of money spent or earned.
    ///
    /// The sign is implied by [Transaction::kind], see [Transaction::signed_amount].
    pub amount: f64,
    /// When the transaction happened.
    pub date: Date,
    /// Free text notes, empty if the user gave none.
    pub notes: String,
}

impl Transaction {
    /// Start building a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        category_id: CategoryId,
        kind: CategoryKind,
        amount: f64,
        date: Date,
        title: &str,
    ) -> TransactionBuilder {
        TransactionBuilder {
            category_id,
            kind,
            amount,
            date,
            title: title.to_owned(),
            notes: String::new(),
        }
    }

    /// The amount as it contributes to net: positive for income and negative for expenses.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            CategoryKind::Income => self.amount,
            CategoryKind::Expense => -self.amount,
        }
    }
}

/// The unchecked fields for a new or updated [Transaction].
///
/// Call [TransactionBuilder::finalize] to check the fields and get a
/// [NewTransaction] that can be saved.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    pub category_id: CategoryId,
    pub kind: CategoryKind,
    pub amount: f64,
    pub date: Date,
    pub title: String,
    pub notes: String,
}

impl TransactionBuilder {
    /// Set the notes for the transaction.
    pub fn notes(mut self, notes: &str) -> Self {
        self.notes = notes.to_owned();
        self
    }

    /// Check the fields against the rules for transactions.
    ///
    /// The title and notes are trimmed and the amount is rounded to cents.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::EmptyTitle] if the title is blank,
    /// - [Error::TitleTooLong] if the title is longer than [MAX_TITLE_LENGTH] characters,
    /// - [Error::InvalidAmount] if the amount is less than [MIN_AMOUNT] or not a number,
    /// - [Error::FutureDate] if the date is after `today`.
    pub fn finalize(self, today: Date) -> Result<NewTransaction, Error> {
        let title = self.title.trim();

        if title.is_empty() {
            return Err(Error::EmptyTitle);
        }

        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(Error::TitleTooLong(MAX_TITLE_LENGTH));
        }

        let amount = (self.amount * 100.0).round() / 100.0;

        if !amount.is_finite() || amount < MIN_AMOUNT {
            return Err(Error::InvalidAmount);
        }

        if self.date > today {
            return Err(Error::FutureDate(self.date));
        }

        Ok(NewTransaction {
            category_id: self.category_id,
            kind: self.kind,
            amount,
            date: self.date,
            title: title.to_owned(),
            notes: self.notes.trim().to_owned(),
        })
    }
}

/// A checked transaction ready to be inserted or to replace an existing one.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    category_id: CategoryId,
    kind: CategoryKind,
    amount: f64,
    date: Date,
    title: String,
    notes: String,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const SELECT_TRANSACTION: &str = "SELECT t.id, t.user_id, t.category_id, c.name, t.kind, \
    t.title, t.amount, t.date, t.notes
    FROM \"transaction\" t
    INNER JOIN category c ON c.id = t.category_id";

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            category_id INTEGER NOT NULL REFERENCES category(id) ON DELETE RESTRICT,
            kind TEXT NOT NULL CHECK (kind IN ('Income', 'Expense')),
            title TEXT NOT NULL,
            amount REAL NOT NULL CHECK (amount > 0),
            date TEXT NOT NULL,
            notes TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_date
            ON \"transaction\"(user_id, date, id);

        CREATE INDEX IF NOT EXISTS idx_transaction_category
            ON \"transaction\"(category_id);",
    )?;

    Ok(())
}

/// Create a new transaction for `owner`.
///
/// The insert only happens if the category belongs to `owner` and has the
/// same kind as the transaction, checked in the same statement.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if the category does not exist or belongs to another user,
/// - [Error::CategoryKindMismatch] if the category's kind differs from the transaction's,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    owner: UserID,
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let rows_inserted = connection.execute(
        "INSERT INTO \"transaction\" (user_id, category_id, kind, title, amount, date, notes)
         SELECT ?1, c.id, ?3, ?4, ?5, ?6, ?7
         FROM category c
         WHERE c.id = ?2 AND c.user_id = ?1 AND c.kind = ?3",
        (
            owner.as_i64(),
            new_transaction.category_id,
            new_transaction.kind,
            &new_transaction.title,
            new_transaction.amount,
            new_transaction.date,
            &new_transaction.notes,
        ),
    )?;

    if rows_inserted == 0 {
        return Err(explain_category_rejection(
            owner,
            new_transaction.category_id,
            new_transaction.kind,
            connection,
        ));
    }

    get_transaction(owner, connection.last_insert_rowid(), connection)
}

/// Retrieve one of `owner`'s transactions by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to one of `owner`'s transactions,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    owner: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "{SELECT_TRANSACTION} WHERE t.id = :id AND t.user_id = :user_id"
        ))?
        .query_one(
            &[(":id", &id), (":user_id", &owner.as_i64())],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Replace the fields of one of `owner`'s transactions.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if `id` does not refer to one of `owner`'s transactions,
/// - [Error::InvalidCategory] or [Error::CategoryKindMismatch] as for [create_transaction],
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    owner: UserID,
    id: TransactionId,
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let rows_affected = connection.execute(
        "UPDATE \"transaction\"
         SET category_id = ?1, kind = ?2, title = ?3, amount = ?4, date = ?5, notes = ?6
         WHERE id = ?7 AND user_id = ?8
            AND EXISTS (
                SELECT 1 FROM category c WHERE c.id = ?1 AND c.user_id = ?8 AND c.kind = ?2
            )",
        (
            new_transaction.category_id,
            new_transaction.kind,
            &new_transaction.title,
            new_transaction.amount,
            new_transaction.date,
            &new_transaction.notes,
            id,
            owner.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        let exists = connection
            .query_row(
                "SELECT 1 FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
                (id, owner.as_i64()),
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        if !exists {
            return Err(Error::UpdateMissingTransaction);
        }

        return Err(explain_category_rejection(
            owner,
            new_transaction.category_id,
            new_transaction.kind,
            connection,
        ));
    }

    get_transaction(owner, id, connection)
}

/// Delete one of `owner`'s transactions.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to one of `owner`'s transactions,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    owner: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, owner.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Get the number of transactions `owner` has recorded.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(owner: UserID, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE user_id = ?1",
            (owner.as_i64(),),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Work out why `category_id` could not be used for a transaction of kind `kind`.
fn explain_category_rejection(
    owner: UserID,
    category_id: CategoryId,
    kind: CategoryKind,
    connection: &Connection,
) -> Error {
    let category_kind: Result<Option<CategoryKind>, rusqlite::Error> = connection
        .query_row(
            "SELECT kind FROM category WHERE id = ?1 AND user_id = ?2",
            (category_id, owner.as_i64()),
            |row| row.get(0),
        )
        .optional();

    match category_kind {
        Ok(Some(category_kind)) if category_kind != kind => Error::CategoryKindMismatch {
            category: category_kind,
            transaction: kind,
        },
        Ok(_) => Error::InvalidCategory(Some(category_id)),
        Err(error) => error.into(),
    }
}

/// Map a database row to a Transaction.
///
/// Expects the columns in the order of `SELECT_TRANSACTION`.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category_id: row.get(2)?,
        category_name: row.get(3)?,
        kind: row.get(4)?,
        title: row.get(5)?,
        amount: row.get(6)?,
        date: row.get(7)?,
        notes: row.get(8)?,
    })
}

/// The columns and joins used to load transactions, for queries that add their own filters.
pub(crate) fn select_transaction_sql() -> &'static str {
    SELECT_TRANSACTION
}

// ============================================================================
// TESTS
// ============================================================================
