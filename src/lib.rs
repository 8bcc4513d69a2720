//! Ledgerly is a web app for tracking personal income and spending.
//!
//! Users record transactions against their own income and expense
//! categories, then review them through a filtered transaction list, a
//! dashboard of totals and charts, and a Profit & Loss report with CSV export.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

mod aggregation;
mod alert;
mod app_state;
mod auth;
mod category;
mod currency;
mod dashboard;
mod db;
mod endpoints;
mod error;
mod error_page;
mod filter;
mod html;
mod logging;
mod navigation;
mod pagination;
mod report;
mod routing;
mod settings;
mod shutdown;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{
    NewUser, PasswordHash, User, UserID, Username, ValidatedPassword, create_user,
    get_user_by_id, get_user_by_username, update_user_password,
};
pub use category::{Category, CategoryKind, CategoryName, create_category};
pub use currency::Currency;
pub use db::initialize as initialize_db;
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use routing::build_router;
pub use shutdown::graceful_shutdown;
pub use transaction::{Transaction, create_transaction};
