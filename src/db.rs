//! Creates the application's database schema.

use rusqlite::{
    Connection, Transaction as SqlTransaction, TransactionBehavior, functions::FunctionFlags,
};

use crate::{
    Error, auth::create_user_table, category::create_category_table,
    transaction::create_transaction_table,
};

/// Turn on foreign key enforcement, register the SQL functions the app's
/// queries use, and create any missing tables and indexes.
///
/// Safe to call on every start-up since every statement uses `IF NOT EXISTS`.
///
/// # Errors
/// Returns an [Error::SqlError] if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Foreign keys are a per-connection setting and cannot be changed inside a transaction.
    connection.pragma_update(None, "foreign_keys", "ON")?;
    register_casefold(connection)?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Register `casefold(text)`, which lowercases all of Unicode rather than
/// just ASCII like SQLite's `lower`. `NULL` stays `NULL`.
fn register_casefold(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.create_scalar_function(
        "casefold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |context| {
            let text: Option<String> = context.get(0)?;
            Ok(text.map(|text| text.to_lowercase()))
        },
    )
}
