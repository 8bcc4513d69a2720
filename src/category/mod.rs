//! Categories group a user's transactions into named income or expense buckets.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod form;
mod list;

pub use create::{create_category_endpoint, get_new_category_page};
pub use db::{
    count_transactions_per_category, create_category, create_category_table, delete_category,
    get_categories, get_category, get_or_create_category, update_category,
};
pub use delete::delete_category_endpoint;
pub use domain::{Category, CategoryId, CategoryKind, CategoryName, MAX_CATEGORY_NAME_LENGTH};
pub use edit::{get_edit_category_page, update_category_endpoint};
pub use form::kind_radio_group;
pub(crate) use list::kind_badge;
pub use list::get_categories_page;
