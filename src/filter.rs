//! Narrows a user's transactions by kind, category, date range and search text.
//!
//! Every query here is scoped to one owner, so a filter can never reach
//! another user's transactions, whatever the query string says.

use rusqlite::{Connection, params_from_iter, types::Value};
use serde::Deserialize;
use time::{Date, Duration, macros::format_description};

use crate::{
    Error,
    aggregation::{Kpis, LedgerEntry},
    auth::UserID,
    category::{CategoryId, CategoryKind},
    pagination::PageRequest,
    transaction::{Transaction, map_transaction_row, select_transaction_sql},
};

const FROM_TRANSACTIONS: &str =
    "FROM \"transaction\" t INNER JOIN category c ON c.id = t.category_id";

/// The raw query string of the transactions page.
///
/// Every field is kept as a string so that a bad value can be ignored rather
/// than rejecting the whole request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub q: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

/// The predicates a set of transactions must all match.
///
/// A `None` field does not filter anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub kind: Option<CategoryKind>,
    pub category_id: Option<CategoryId>,
    /// Inclusive.
    pub date_from: Option<Date>,
    /// Inclusive.
    pub date_to: Option<Date>,
    /// Matched against the title, notes and category name, ignoring case.
    pub search: Option<String>,
}

impl TransactionFilter {
    /// Build a filter from the query string, ignoring values that do not parse.
    ///
    /// "Both", or any other unknown type, means no type filter. If the dates
    /// are in the wrong order they are swapped.
    pub fn from_query(query: &FilterQuery) -> Self {
        let kind = query
            .kind
            .as_deref()
            .and_then(|kind| kind.parse::<CategoryKind>().ok());
        let category_id = query
            .category
            .as_deref()
            .and_then(|id| id.trim().parse::<CategoryId>().ok());
        let search = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_owned);

        Self {
            kind,
            category_id,
            search,
            ..Self::date_range(
                parse_date(query.date_from.as_deref()),
                parse_date(query.date_to.as_deref()),
            )
        }
    }

    /// A filter that only restricts the date range.
    pub fn date_range(date_from: Option<Date>, date_to: Option<Date>) -> Self {
        let (date_from, date_to) = match (date_from, date_to) {
            (Some(from), Some(to)) if from > to => (Some(to), Some(from)),
            range => range,
        };

        Self {
            date_from,
            date_to,
            ..Default::default()
        }
    }

    /// Whether any predicate is set.
    pub fn is_active(&self) -> bool {
        self != &Self::default()
    }

    /// The query string pairs that reproduce this filter.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(kind) = self.kind {
            pairs.push(("type", kind.to_string()));
        }
        if let Some(category_id) = self.category_id {
            pairs.push(("category", category_id.to_string()));
        }
        if let Some(date_from) = self.date_from {
            pairs.push(("date_from", date_from.to_string()));
        }
        if let Some(date_to) = self.date_to {
            pairs.push(("date_to", date_to.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("q", search.clone()));
        }

        pairs
    }

    fn where_clause(&self, owner: UserID) -> (String, Vec<Value>) {
        let mut conditions = vec!["t.user_id = ?"];
        let mut parameters = vec![Value::Integer(owner.as_i64())];

        if let Some(kind) = self.kind {
            conditions.push("t.kind = ?");
            parameters.push(Value::Text(kind.as_str().to_owned()));
        }

        if let Some(category_id) = self.category_id {
            conditions.push("t.category_id = ?");
            parameters.push(Value::Integer(category_id));
        }

        if let Some(date_from) = self.date_from {
            conditions.push("t.date >= ?");
            parameters.push(Value::Text(date_from.to_string()));
        }

        if let Some(date_to) = self.date_to {
            conditions.push("t.date <= ?");
            parameters.push(Value::Text(date_to.to_string()));
        }

        if let Some(search) = &self.search {
            // `LIKE` only ignores the case of ASCII letters.
            conditions.push(
                "(instr(casefold(t.title), ?) > 0 OR instr(casefold(t.notes), ?) > 0 \
                OR instr(c.name_key, ?) > 0)",
            );
            let term = Value::Text(search.to_lowercase());
            parameters.extend(std::iter::repeat_n(term, 3));
        }

        (format!("WHERE {}", conditions.join(" AND ")), parameters)
    }
}

/// Parse a date in the "YYYY-MM-DD" format, returning `None` for anything else.
pub fn parse_date(text: Option<&str>) -> Option<Date> {
    let text = text?.trim();

    Date::parse(text, format_description!("[year]-[month]-[day]")).ok()
}

/// Resolve a report date range from raw query values.
///
/// The end defaults to `today` and the start to `span_days - 1` days before
/// the end, so the range covers `span_days` days. Reversed dates are swapped.
pub fn resolve_date_range(
    date_from: Option<&str>,
    date_to: Option<&str>,
    today: Date,
    span_days: i64,
) -> (Date, Date) {
    let date_to = parse_date(date_to).unwrap_or(today);
    let date_from = parse_date(date_from)
        .unwrap_or_else(|| date_to.saturating_sub(Duration::days(span_days - 1)));

    if date_from > date_to {
        (date_to, date_from)
    } else {
        (date_from, date_to)
    }
}

/// Get the owner's transactions that match `filter`, newest first.
///
/// Transactions on the same date are ordered by ID, newest first. If `page`
/// is given only that page of results is returned.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn filter_transactions(
    owner: UserID,
    filter: &TransactionFilter,
    page: Option<PageRequest>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let (where_clause, mut parameters) = filter.where_clause(owner);
    let mut query = format!(
        "{} {where_clause} ORDER BY t.date DESC, t.id DESC",
        select_transaction_sql()
    );

    if let Some(page) = page {
        query.push_str(" LIMIT ? OFFSET ?");
        parameters.push(Value::Integer(page.per_page as i64));
        parameters.push(Value::Integer(page.offset() as i64));
    }

    connection
        .prepare(&query)?
        .query_map(params_from_iter(parameters.iter()), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Count the owner's transactions that match `filter`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn count_filtered_transactions(
    owner: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<u32, Error> {
    let (where_clause, parameters) = filter.where_clause(owner);

    connection
        .query_row(
            &format!("SELECT COUNT(t.id) {FROM_TRANSACTIONS} {where_clause}"),
            params_from_iter(parameters.iter()),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Total income, expense and net over every transaction matching `filter`,
/// regardless of pagination.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn filtered_kpis(
    owner: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Kpis, Error> {
    let (where_clause, parameters) = filter.where_clause(owner);

    let (income, expense) = connection.query_row(
        &format!(
            "SELECT \
                COALESCE(SUM(CASE WHEN t.kind = 'Income' THEN t.amount ELSE 0 END), 0), \
                COALESCE(SUM(CASE WHEN t.kind = 'Expense' THEN t.amount ELSE 0 END), 0) \
            {FROM_TRANSACTIONS} {where_clause}"
        ),
        params_from_iter(parameters.iter()),
        |row| Ok((row.get::<_, f64>(0)?, row.get::<_, f64>(1)?)),
    )?;

    Ok(Kpis::new(income, expense))
}

/// Get the date, kind, amount and category name of every transaction
/// matching `filter`, oldest first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn filtered_ledger_entries(
    owner: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<LedgerEntry>, Error> {
    let (where_clause, parameters) = filter.where_clause(owner);

    connection
        .prepare(&format!(
            "SELECT t.date, t.kind, t.amount, c.name {FROM_TRANSACTIONS} {where_clause} \
            ORDER BY t.date ASC, t.id ASC"
        ))?
        .query_map(params_from_iter(parameters.iter()), |row| {
            Ok(LedgerEntry {
                date: row.get(0)?,
                kind: row.get(1)?,
                amount: row.get(2)?,
                category_name: row.get(3)?,
            })
        })?
        .map(|maybe_entry| maybe_entry.map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod filter_query_tests {
    use time::macros::date;

    use crate::category::CategoryKind;

    use super::{FilterQuery, TransactionFilter, parse_date, resolve_date_range};

    fn query(raw: &str) -> FilterQuery {
        serde_html_form::from_str(raw).unwrap()
    }

    #[test]
    fn empty_query_is_inactive() {
        let filter = TransactionFilter::from_query(&FilterQuery::default());

        assert!(!filter.is_active());
    }

    #[test]
    fn parses_all_fields() {
        let filter = TransactionFilter::from_query(&query(
            "type=income&category=7&date_from=2024-01-01&date_to=2024-01-31&q=++coffee+",
        ));

        assert_eq!(
            filter,
            TransactionFilter {
                kind: Some(CategoryKind::Income),
                category_id: Some(7),
                date_from: Some(date!(2024 - 01 - 01)),
                date_to: Some(date!(2024 - 01 - 31)),
                search: Some("coffee".to_owned()),
            }
        );
    }

    #[test]
    fn ignores_values_that_do_not_parse() {
        let filter = TransactionFilter::from_query(&query(
            "type=Both&category=groceries&date_from=yesterday&date_to=2024-13-01&q=+++",
        ));

        assert_eq!(filter, TransactionFilter::default());
    }

    #[test]
    fn untouched_filter_form_is_inactive() {
        let filter = TransactionFilter::from_query(&query(
            "type=Both&category=&date_from=&date_to=&q=",
        ));

        assert!(!filter.is_active());
    }

    #[test]
    fn swaps_reversed_dates() {
        let filter = TransactionFilter::from_query(&query(
            "date_from=2024-02-01&date_to=2024-01-01",
        ));

        assert_eq!(filter.date_from, Some(date!(2024 - 01 - 01)));
        assert_eq!(filter.date_to, Some(date!(2024 - 02 - 01)));
    }

    #[test]
    fn query_pairs_round_trip() {
        let filter = TransactionFilter {
            kind: Some(CategoryKind::Expense),
            category_id: Some(3),
            date_from: Some(date!(2024 - 03 - 01)),
            date_to: None,
            search: Some("50% off".to_owned()),
        };

        let raw = serde_urlencoded::to_string(filter.query_pairs()).unwrap();
        let got = TransactionFilter::from_query(&query(&raw));

        assert_eq!(got, filter);
    }

    #[test]
    fn date_range_defaults_to_span_ending_today() {
        let today = date!(2024 - 03 - 31);

        assert_eq!(
            resolve_date_range(None, None, today, 90),
            (date!(2024 - 01 - 02), today)
        );
        assert_eq!(
            resolve_date_range(None, Some("2024-01-30"), today, 30),
            (date!(2024 - 01 - 01), date!(2024 - 01 - 30))
        );
    }

    #[test]
    fn date_range_swaps_and_ignores_bad_input() {
        let today = date!(2024 - 03 - 31);

        assert_eq!(
            resolve_date_range(Some("2024-03-01"), Some("2024-02-01"), today, 30),
            (date!(2024 - 02 - 01), date!(2024 - 03 - 01))
        );
        assert_eq!(
            resolve_date_range(Some("soon"), Some("later"), today, 30),
            (date!(2024 - 03 - 02), today)
        );
    }

    #[test]
    fn parse_date_trims_whitespace() {
        assert_eq!(parse_date(Some(" 2024-01-05 ")), Some(date!(2024 - 01 - 05)));
        assert_eq!(parse_date(Some("")), None);
        assert_eq!(parse_date(None), None);
    }
}
