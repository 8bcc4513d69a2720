//! Dashboard module
//!
//! Provides an overview page showing totals and charts for a date range.

mod cards;
mod charts;
mod handlers;

pub(crate) use cards::kpi_cards;
pub use handlers::get_dashboard_page;
