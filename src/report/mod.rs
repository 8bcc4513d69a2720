//! Profit & Loss reporting for a date range, with a CSV download.

mod export;
mod page;
mod statement;

pub use export::export_report_csv;
pub use page::get_report_page;
