//! Transaction management for Ledgerly.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Owner-scoped database functions for storing and managing transactions
//! - The shared transaction form, including the "Other…" category shortcut
//! - View handlers for transaction-related web pages

mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod form;
mod transactions_page;

pub use core::{
    Transaction, TransactionId, count_transactions, create_transaction, create_transaction_table,
    delete_transaction, get_transaction, map_transaction_row,
};
pub(crate) use core::select_transaction_sql;
pub use create_endpoint::create_transaction_endpoint;
pub use create_page::get_new_transaction_page;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::update_transaction_endpoint;
pub use edit_page::get_edit_transaction_page;
pub use transactions_page::get_transactions_page;
