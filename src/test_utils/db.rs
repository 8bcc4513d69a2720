use rusqlite::Connection;
use time::Date;

use crate::{
    auth::{CurrentUser, NewUser, PasswordHash, UserID, Username, create_user},
    category::Category,
    currency::Currency,
    db::initialize,
    transaction::{Transaction, create_transaction},
};

/// An in-memory database with every table created and foreign keys on.
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");
    connection
}

pub(crate) fn insert_test_user(connection: &Connection, username: &str) -> UserID {
    create_user(
        NewUser {
            username: Username::new_unchecked(username),
            email: None,
            password_hash: PasswordHash::new_unchecked("hunter2"),
            currency: Currency::GBP,
        },
        connection,
    )
    .expect("Could not create test user")
    .id
}

pub(crate) fn test_current_user(user_id: UserID) -> CurrentUser {
    CurrentUser {
        id: user_id,
        username: "ada".to_owned(),
        currency: "GBP".to_owned(),
    }
}

/// Insert a transaction titled after its category, using the category's kind.
pub(crate) fn insert_test_transaction(
    connection: &Connection,
    owner: UserID,
    category: &Category,
    amount: f64,
    date: Date,
) -> Transaction {
    let new_transaction = Transaction::build(
        category.id,
        category.kind,
        amount,
        date,
        category.name.as_ref(),
    )
    .finalize(date)
    .expect("Invalid test transaction");

    create_transaction(owner, new_transaction, connection)
        .expect("Could not create test transaction")
}
