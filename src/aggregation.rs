//! Rolls ledger entries up into time buckets, per-category totals and KPIs.
//!
//! Everything here works on plain [LedgerEntry] values so that the same
//! functions drive the dashboard charts, the transactions page and the
//! profit and loss report.

use std::collections::HashMap;

use time::{Date, Duration};

use crate::{category::CategoryKind, transaction::Transaction};

/// The label used for entries whose category name is blank.
pub const UNCATEGORISED: &str = "Uncategorised";

/// The minimum information needed to aggregate a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub date: Date,
    pub kind: CategoryKind,
    /// A positive magnitude, the kind decides the sign.
    pub amount: f64,
    pub category_name: String,
}

impl From<&Transaction> for LedgerEntry {
    fn from(transaction: &Transaction) -> Self {
        Self {
            date: transaction.date,
            kind: transaction.kind,
            amount: transaction.amount,
            category_name: transaction.category_name.clone(),
        }
    }
}

/// The width of a time bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bucket {
    /// Monday to Sunday.
    #[default]
    Weekly,
    /// Calendar months.
    Monthly,
}

impl Bucket {
    /// Parse a bucket from a query parameter, falling back to [Bucket::Weekly]
    /// for anything other than "weekly" or "monthly".
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("monthly") => Bucket::Monthly,
            _ => Bucket::Weekly,
        }
    }

    pub fn as_query_value(&self) -> &'static str {
        match self {
            Bucket::Weekly => "weekly",
            Bucket::Monthly => "monthly",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Bucket::Weekly => "Weekly",
            Bucket::Monthly => "Monthly",
        }
    }
}

/// The first day of the bucket containing `date`.
pub fn bucket_start(date: Date, bucket: Bucket) -> Date {
    match bucket {
        Bucket::Weekly => {
            date - Duration::days(date.weekday().number_days_from_monday() as i64)
        }
        Bucket::Monthly => date - Duration::days(date.day() as i64 - 1),
    }
}

fn next_bucket_start(start: Date, bucket: Bucket) -> Option<Date> {
    match bucket {
        Bucket::Weekly => start.checked_add(Duration::weeks(1)),
        // 31 days after the 1st always lands somewhere in the following month.
        Bucket::Monthly => start
            .checked_add(Duration::days(31))
            .map(|date| bucket_start(date, Bucket::Monthly)),
    }
}

/// Every bucket start from the bucket containing `start` up to and including `end`.
///
/// The dates are swapped if `start` is after `end`.
pub fn bucket_starts(start: Date, end: Date, bucket: Bucket) -> Vec<Date> {
    let (start, end) = if start > end { (end, start) } else { (start, end) };

    let mut starts = Vec::new();
    let mut current = Some(bucket_start(start, bucket));

    while let Some(date) = current {
        if date > end {
            break;
        }

        starts.push(date);
        current = next_bucket_start(date, bucket);
    }

    starts
}

/// A display label for the bucket beginning on `anchor`.
///
/// Weeks use the ISO week date, e.g. "2025-W01", and months use "2025-01".
pub fn bucket_label(anchor: Date, bucket: Bucket) -> String {
    match bucket {
        Bucket::Weekly => {
            let (year, week, _) = anchor.to_iso_week_date();
            format!("{year}-W{week:02}")
        }
        Bucket::Monthly => format!("{}-{:02}", anchor.year(), anchor.month() as u8),
    }
}

/// Income and expense totals for one time bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketTotals {
    pub start: Date,
    pub label: String,
    pub income: f64,
    pub expense: f64,
    pub net: f64,
}

/// Sum `entries` into one [BucketTotals] per bucket between `start` and `end`.
///
/// Buckets with no entries are included with zero totals, so the result has
/// exactly one item per bucket in chronological order. Entries dated outside
/// `start..=end` are ignored.
pub fn aggregate_by_bucket(
    entries: &[LedgerEntry],
    start: Date,
    end: Date,
    bucket: Bucket,
) -> Vec<BucketTotals> {
    let (start, end) = if start > end { (end, start) } else { (start, end) };

    let mut totals: Vec<BucketTotals> = bucket_starts(start, end, bucket)
        .into_iter()
        .map(|bucket_start| BucketTotals {
            start: bucket_start,
            label: bucket_label(bucket_start, bucket),
            income: 0.0,
            expense: 0.0,
            net: 0.0,
        })
        .collect();

    let index_by_start: HashMap<Date, usize> = totals
        .iter()
        .enumerate()
        .map(|(index, totals)| (totals.start, index))
        .collect();

    for entry in entries {
        if entry.date < start || entry.date > end {
            continue;
        }

        let Some(&index) = index_by_start.get(&bucket_start(entry.date, bucket)) else {
            continue;
        };

        match entry.kind {
            CategoryKind::Income => totals[index].income += entry.amount,
            CategoryKind::Expense => totals[index].expense += entry.amount,
        }
    }

    for bucket_totals in &mut totals {
        bucket_totals.income = round_cents(bucket_totals.income);
        bucket_totals.expense = round_cents(bucket_totals.expense);
        bucket_totals.net = round_cents(bucket_totals.income - bucket_totals.expense);
    }

    totals
}

/// The total amount recorded against one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub name: String,
    pub kind: CategoryKind,
    pub total: f64,
}

/// Sum `entries` per category, optionally keeping only one kind.
///
/// The result is sorted by total, largest first, with ties broken by name and
/// then kind.
pub fn category_totals(entries: &[LedgerEntry], kind: Option<CategoryKind>) -> Vec<CategoryTotal> {
    let mut totals: HashMap<(String, CategoryKind), f64> = HashMap::new();

    for entry in entries {
        if kind.is_some_and(|kind| kind != entry.kind) {
            continue;
        }

        let name = entry.category_name.trim();
        let name = if name.is_empty() { UNCATEGORISED } else { name };

        *totals.entry((name.to_owned(), entry.kind)).or_default() += entry.amount;
    }

    let mut totals: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|((name, kind), total)| CategoryTotal {
            name,
            kind,
            total: round_cents(total),
        })
        .collect();

    totals.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.kind.cmp(&b.kind))
    });

    totals
}

/// Headline totals for a set of transactions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Kpis {
    pub income: f64,
    pub expense: f64,
    /// Always `income - expense`.
    pub net: f64,
}

impl Kpis {
    pub fn new(income: f64, expense: f64) -> Self {
        let income = round_cents(income);
        let expense = round_cents(expense);

        Self {
            income,
            expense,
            net: round_cents(income - expense),
        }
    }

    pub fn from_entries(entries: &[LedgerEntry]) -> Self {
        let (income, expense) =
            entries
                .iter()
                .fold((0.0, 0.0), |(income, expense), entry| match entry.kind {
                    CategoryKind::Income => (income + entry.amount, expense),
                    CategoryKind::Expense => (income, expense + entry.amount),
                });

        Self::new(income, expense)
    }

    /// Whether the net total is below zero.
    pub fn is_loss(&self) -> bool {
        self.net < 0.0
    }
}

/// Round to the nearest cent so float noise does not leak into totals.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
