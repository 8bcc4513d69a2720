//! User accounts: the user table, queries and the user attached to each request.

use std::fmt::Display;

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::PasswordHash,
    currency::{Currency, currency_symbol},
};

/// The longest username a user may sign up with.
pub const MAX_USERNAME_LENGTH: usize = 150;

/// A newtype wrapper for integer user IDs.
///
/// Every owned row in the database is keyed by a `UserID`, so keeping it
/// distinct from category and transaction IDs stops them being mixed up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A trimmed, non-empty username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    /// Trim `raw_username` and check that it is usable.
    ///
    /// # Errors
    ///
    /// Returns an [Error::EmptyUsername] if nothing is left after trimming
    /// or the name is longer than [MAX_USERNAME_LENGTH] characters.
    pub fn new(raw_username: &str) -> Result<Self, Error> {
        let username = raw_username.trim();

        if username.is_empty() || username.chars().count() > MAX_USERNAME_LENGTH {
            Err(Error::EmptyUsername)
        } else {
            Ok(Self(username.to_owned()))
        }
    }

    /// Wrap a username loaded from the database.
    pub fn new_unchecked(raw_username: &str) -> Self {
        Self(raw_username.to_owned())
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserID,
    pub username: Username,
    pub email: Option<String>,
    pub password_hash: PasswordHash,
    /// The ISO 4217 code of the user's display currency, e.g. "GBP".
    pub currency: String,
}

/// The logged in user, inserted into each request by the auth guard.
///
/// Handlers receive it with `Extension(user): Extension<CurrentUser>`.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: UserID,
    pub username: String,
    pub currency: String,
}

impl CurrentUser {
    /// The symbol to prefix the user's money with, falling back to the
    /// default symbol when the currency is unset or unknown.
    pub fn currency_symbol(&self) -> &str {
        currency_symbol(&self.currency)
    }
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username.to_string(),
            currency: user.currency,
        }
    }
}

/// The data needed to register a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Username,
    pub email: Option<String>,
    pub password_hash: PasswordHash,
    pub currency: Currency,
}

/// Create the user table.
///
/// Usernames are unique ignoring case.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE COLLATE NOCASE,
                email TEXT,
                password TEXT NOT NULL,
                currency TEXT NOT NULL DEFAULT 'GBP'
                )",
        (),
    )?;

    Ok(())
}

/// Insert a new user into the database.
///
/// # Errors
///
/// Returns an [Error::DuplicateUsername] if the username is taken, ignoring
/// case, or an [Error::SqlError] for other SQL errors.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    let email = new_user
        .email
        .map(|email| email.trim().to_owned())
        .filter(|email| !email.is_empty());

    connection.execute(
        "INSERT INTO user (username, email, password, currency) VALUES (?1, ?2, ?3, ?4)",
        (
            new_user.username.as_ref(),
            &email,
            new_user.password_hash.as_ref(),
            new_user.currency.code(),
        ),
    )?;

    Ok(User {
        id: UserID::new(connection.last_insert_rowid()),
        username: new_user.username,
        email,
        password_hash: new_user.password_hash,
        currency: new_user.currency.code().to_owned(),
    })
}

/// Get the user with the ID `user_id`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if there is no such user.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, email, password, currency FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user whose username matches `username`, ignoring case.
///
/// Returns `Ok(None)` when nobody has that username.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<Option<User>, Error> {
    connection
        .prepare(
            "SELECT id, username, email, password, currency FROM user WHERE username = :username",
        )?
        .query_row(&[(":username", username.trim())], map_user_row)
        .optional()
        .map_err(|error| error.into())
}

/// Set the display currency of a user.
///
/// # Errors
///
/// Returns an [Error::NotFound] if there is no such user.
pub fn update_user_currency(
    user_id: UserID,
    currency: Currency,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET currency = ?1 WHERE id = ?2",
        (currency.code(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Replace the password hash of a user.
///
/// # Errors
///
/// Returns an [Error::NotFound] if there is no such user.
pub fn update_user_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Get the number of registered users.
pub fn count_users(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let id = UserID::new(row.get(0)?);
    let raw_username: String = row.get(1)?;
    let email = row.get(2)?;
    let raw_password_hash: String = row.get(3)?;
    let currency = row.get(4)?;

    Ok(User {
        id,
        username: Username::new_unchecked(&raw_username),
        email,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        currency,
    })
}
