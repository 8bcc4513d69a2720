//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use time::Date;

use crate::{
    alert::Alert,
    category::{CategoryId, CategoryKind},
    error_page::ErrorPage,
};

/// The message shown when a user tries to delete a category that still has transactions.
pub const CATEGORY_IN_USE_MESSAGE: &str = "You can’t delete this category because it has transactions. \
    Delete or reassign those transactions first.";

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The username is not registered or the password does not match it.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// The auth token could not be parsed or it has expired.
    #[error("the auth token is invalid or has expired")]
    InvalidToken,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An empty string was used as a username.
    #[error("Username cannot be empty")]
    EmptyUsername,

    /// The username is already taken by another user.
    #[error("A user with that username already exists.")]
    DuplicateUsername,

    /// The currency code is not one of the supported currencies.
    #[error("\"{0}\" is not a supported currency")]
    InvalidCurrency(String),

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// A category name exceeded the maximum length.
    #[error("Category name cannot be longer than {0} characters")]
    CategoryNameTooLong(usize),

    /// A category kind other than "Income" or "Expense" was given.
    #[error("\"{0}\" is not a valid type, choose Income or Expense")]
    InvalidCategoryKind(String),

    /// The user already has a category with the same name and kind.
    #[error("You already have a category with this name for this type.")]
    DuplicateCategoryName,

    /// The category ID used for a transaction does not refer to one of the user's categories.
    #[error("That category could not be found. Choose one of your categories.")]
    InvalidCategory(Option<CategoryId>),

    /// The kind of the chosen category does not match the kind of the transaction.
    #[error("Selected category is '{category}'. It must match '{transaction}'.")]
    CategoryKindMismatch {
        /// The kind of the category that was chosen.
        category: CategoryKind,
        /// The kind of the transaction.
        transaction: CategoryKind,
    },

    /// Tried to change the kind of a category that transactions already rely on.
    #[error("You can’t change the type of a category that has transactions.")]
    CategoryKindInUse,

    /// Tried to delete a category that is still referenced by transactions.
    #[error(
        "You can’t delete this category because it has transactions. Delete or reassign those transactions first."
    )]
    CategoryInUse,

    /// Neither an existing category nor a new category name was given for a transaction.
    #[error("Pick a category or type a new one.")]
    MissingCategory,

    /// Both an existing category and a new category name were given for a transaction.
    #[error("Leave the new category blank if you choose an existing category.")]
    AmbiguousCategory,

    /// A transaction amount was zero, negative or not a number.
    #[error("Amount must be at least 0.01")]
    InvalidAmount,

    /// An empty string was used as a transaction title.
    #[error("Title cannot be empty")]
    EmptyTitle,

    /// A transaction title exceeded the maximum length.
    #[error("Title cannot be longer than {0} characters")]
    TitleTooLong(usize),

    /// A date in the future was used to create a transaction.
    ///
    /// Transactions record events that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// An error occurred while writing the CSV export.
    #[error("could not write CSV: {0}")]
    CsvError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("category.name") =>
            {
                Error::DuplicateCategoryName
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("user.username") =>
            {
                Error::DuplicateUsername
            }
            // An `ON DELETE RESTRICT` violation is reported as code 1811
            // (SQLITE_CONSTRAINT_TRIGGER), other foreign key failures as 787.
            // The only restricted reference is a transaction's category.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.code == rusqlite::ErrorCode::ConstraintViolation
                    && desc.contains("FOREIGN KEY constraint failed") =>
            {
                Error::CategoryInUse
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        tracing::error!("could not write CSV: {value}");
        Error::CsvError(value.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => ErrorPage::NOT_FOUND.into_response(),
            Error::InvalidTimezoneError(timezone) => ErrorPage::internal(
                "Invalid Timezone Settings",
                &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            )
            .into_response(),
            Error::DatabaseLockError => ErrorPage::INTERNAL.into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                ErrorPage::INTERNAL.into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::FutureDate(date) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid transaction date".to_owned(),
                    details: format!(
                        "{date} is a date in the future, which is not allowed. \
                        Change the date to today or earlier."
                    ),
                },
            ),
            Error::InvalidCategory(category_id) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid category".to_owned(),
                    details: match category_id {
                        Some(id) => format!("Could not find a category with the ID {id}."),
                        None => "Could not find the category.".to_owned(),
                    },
                },
            ),
            Error::CategoryInUse => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: "Could not delete category".to_owned(),
                    details: CATEGORY_IN_USE_MESSAGE.to_owned(),
                },
            ),
            Error::CategoryKindInUse => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: "Could not update category".to_owned(),
                    details: Error::CategoryKindInUse.to_string(),
                },
            ),
            Error::UpdateMissingTransaction => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update transaction".to_owned(),
                    details: "The transaction could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete transaction".to_owned(),
                    details: "The transaction could not be found. \
                    Try refreshing the page to see if the transaction has already been deleted."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update category".to_owned(),
                    details: "The category could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete category".to_owned(),
                    details: "The category could not be found. \
                    Try refreshing the page to see if the category has already been deleted."
                        .to_owned(),
                },
            ),
            Error::InvalidCurrency(code) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid currency".to_owned(),
                    details: format!("\"{code}\" is not a supported currency."),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        };

        (status_code, alert.into_html()).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::http::StatusCode;
    use scraper::Selector;

    use crate::{
        Error,
        error::CATEGORY_IN_USE_MESSAGE,
        test_utils::parse_html_fragment,
    };

    #[tokio::test]
    async fn category_in_use_renders_conflict_alert() {
        let response = Error::CategoryInUse.into_alert_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let html = parse_html_fragment(response).await;
        let paragraphs = html
            .select(&Selector::parse("p").unwrap())
            .map(|p| p.text().collect::<String>().trim().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(paragraphs[0], "Could not delete category");
        assert_eq!(paragraphs[1], CATEGORY_IN_USE_MESSAGE);
    }

    #[tokio::test]
    async fn unexpected_error_hides_details() {
        let response = Error::DatabaseLockError.into_alert_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = parse_html_fragment(response).await;
        let message = html
            .select(&Selector::parse("p").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert_eq!(message.trim(), "Something went wrong");
    }

    #[test]
    fn unique_username_violation_maps_to_duplicate_username() {
        let connection = rusqlite::Connection::open_in_memory().unwrap();
        connection
            .execute_batch("CREATE TABLE user (username TEXT UNIQUE); INSERT INTO user VALUES ('a');")
            .unwrap();

        let error: Error = connection
            .execute("INSERT INTO user VALUES ('a')", [])
            .unwrap_err()
            .into();

        assert_eq!(error, Error::DuplicateUsername);
    }
}
