//! The Profit & Loss statement for a date range.

use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, macros::format_description};

use crate::{
    Error,
    aggregation::{CategoryTotal, Kpis, LedgerEntry, category_totals},
    auth::UserID,
    category::CategoryKind,
    filter::{TransactionFilter, filtered_ledger_entries, resolve_date_range},
};

/// The number of days a report covers when no start date is given.
const DEFAULT_REPORT_DAYS: i64 = 30;

/// The raw report query string, shared by the page and the CSV export.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl ReportQuery {
    /// The inclusive range to report on.
    ///
    /// The end defaults to `today` and the start to 29 days before the end.
    pub fn date_range(&self, today: Date) -> (Date, Date) {
        resolve_date_range(
            self.date_from.as_deref(),
            self.date_to.as_deref(),
            today,
            DEFAULT_REPORT_DAYS,
        )
    }
}

/// Income and expense totals for a date range, broken down by category.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfitAndLoss {
    pub date_from: Date,
    pub date_to: Date,
    /// The totals are the sums of the category breakdowns, so the two always
    /// agree.
    pub kpis: Kpis,
    /// Largest first.
    pub income_by_category: Vec<CategoryTotal>,
    /// Largest first.
    pub expense_by_category: Vec<CategoryTotal>,
}

impl ProfitAndLoss {
    pub fn from_entries(entries: &[LedgerEntry], date_from: Date, date_to: Date) -> Self {
        let income_by_category = category_totals(entries, Some(CategoryKind::Income));
        let expense_by_category = category_totals(entries, Some(CategoryKind::Expense));
        let kpis = Kpis::new(
            income_by_category.iter().map(|total| total.total).sum(),
            expense_by_category.iter().map(|total| total.total).sum(),
        );

        Self {
            date_from,
            date_to,
            kpis,
            income_by_category,
            expense_by_category,
        }
    }

    /// Every category row, income before expense, each group largest first.
    pub fn rows(&self) -> impl Iterator<Item = &CategoryTotal> {
        self.income_by_category
            .iter()
            .chain(self.expense_by_category.iter())
    }

    /// The download name for this report, e.g. "pl_export_20240101_20240131.csv".
    pub fn csv_file_name(&self) -> String {
        let format = format_description!("[year][month][day]");

        format!(
            "pl_export_{}_{}.csv",
            self.date_from.format(format).unwrap_or_default(),
            self.date_to.format(format).unwrap_or_default()
        )
    }
}

/// Build the owner's Profit & Loss statement for `date_from..=date_to`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn get_profit_and_loss(
    owner: UserID,
    date_from: Date,
    date_to: Date,
    connection: &Connection,
) -> Result<ProfitAndLoss, Error> {
    let filter = TransactionFilter::date_range(Some(date_from), Some(date_to));
    let entries = filtered_ledger_entries(owner, &filter, connection)?;

    Ok(ProfitAndLoss::from_entries(&entries, date_from, date_to))
}
