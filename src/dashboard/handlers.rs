//! Dashboard HTTP handler and view rendering.
//!
//! The dashboard summarises one date range: headline totals, a cash flow
//! line chart over weekly or monthly buckets and a donut of spending by
//! category.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, Duration};

use crate::{
    AppState, Error,
    aggregation::{Bucket, Kpis, aggregate_by_bucket, category_totals},
    auth::CurrentUser,
    category::CategoryKind,
    dashboard::{
        cards::kpi_cards,
        charts::{
            DashboardChart, ECHARTS_SCRIPT_URL, cash_flow_chart, charts_script, charts_view,
            expense_donut_chart,
        },
    },
    endpoints,
    filter::{TransactionFilter, filtered_ledger_entries, resolve_date_range},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement,
        PAGE_CONTAINER_STYLE, base, link,
    },
    navigation::NavBar,
    timezone::get_local_today,
    transaction::count_transactions,
};

/// The number of days the dashboard covers when no start date is given.
const DEFAULT_RANGE_DAYS: i64 = 90;

/// The longest range the dashboard charts, about five years of weekly buckets.
const MAX_RANGE_DAYS: i64 = 5 * 366;

/// Shorten a range longer than [MAX_RANGE_DAYS] by moving its start date,
/// so the most recent part of the range is kept.
fn clamp_range(date_from: Date, date_to: Date) -> (Date, Date) {
    let earliest = date_to.saturating_sub(Duration::days(MAX_RANGE_DAYS - 1));

    (date_from.max(earliest), date_to)
}

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The raw dashboard query string. Values that do not parse fall back to the
/// defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub bucket: Option<String>,
}

/// Holds all the data needed to render the dashboard.
struct DashboardData {
    date_from: Date,
    date_to: Date,
    bucket: Bucket,
    kpis: Kpis,
    charts: Vec<DashboardChart>,
    has_expenses: bool,
}

/// Display a page with an overview of the user's income and spending.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, Error> {
    let today = get_local_today(&state.local_timezone)
        .inspect_err(|error| tracing::error!("could not get local date: {error}"))?;
    let (date_from, date_to) = resolve_date_range(
        query.date_from.as_deref(),
        query.date_to.as_deref(),
        today,
        DEFAULT_RANGE_DAYS,
    );
    let (date_from, date_to) = clamp_range(date_from, date_to);
    let bucket = Bucket::parse_lenient(query.bucket.as_deref());

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW);

    if count_transactions(user.id, &connection)? == 0 {
        return Ok(dashboard_no_data_view(nav_bar).into_response());
    }

    let filter = TransactionFilter::date_range(Some(date_from), Some(date_to));
    let entries = filtered_ledger_entries(user.id, &filter, &connection)
        .inspect_err(|error| tracing::error!("could not get dashboard entries: {error}"))?;
    drop(connection);

    let currency_symbol = user.currency_symbol();
    let expense_totals = category_totals(&entries, Some(CategoryKind::Expense));
    let buckets = aggregate_by_bucket(&entries, date_from, date_to, bucket);

    let mut charts = vec![DashboardChart {
        id: "cash-flow-chart",
        options: cash_flow_chart(&buckets, bucket, currency_symbol).to_string(),
    }];
    if !expense_totals.is_empty() {
        charts.push(DashboardChart {
            id: "expenses-chart",
            options: expense_donut_chart(&expense_totals, currency_symbol).to_string(),
        });
    }

    let data = DashboardData {
        date_from,
        date_to,
        bucket,
        kpis: Kpis::from_entries(&entries),
        charts,
        has_expenses: !expense_totals.is_empty(),
    };

    Ok(dashboard_view(nav_bar, &data, currency_symbol).into_response())
}

/// Renders the dashboard page when the user has no transactions.
fn dashboard_no_data_view(nav_bar: NavBar) -> Markup {
    let nav_bar = nav_bar.into_html();
    let new_transaction_link = link(endpoints::NEW_TRANSACTION_VIEW, "adding a transaction");

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE) data-empty-state="no-transactions"
        {
            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "Charts will show up here once you record some income or spending.
                Get started by " (new_transaction_link) "."
            }
        }
    );

    base("Dashboard", &[], &content)
}

fn range_form(data: &DashboardData) -> Markup {
    html! {
        form
            method="get"
            action=(endpoints::DASHBOARD_VIEW)
            class="grid grid-cols-1 sm:grid-cols-4 gap-3 items-end w-full
                bg-gray-50 dark:bg-gray-800 p-4 rounded-lg"
            aria-label="Dashboard range"
        {
            div
            {
                label for="date_from" class=(FORM_LABEL_STYLE) { "From" }
                input
                    type="date"
                    id="date_from"
                    name="date_from"
                    value=(data.date_from)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="date_to" class=(FORM_LABEL_STYLE) { "To" }
                input
                    type="date"
                    id="date_to"
                    name="date_to"
                    value=(data.date_to)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="bucket" class=(FORM_LABEL_STYLE) { "Group by" }
                select id="bucket" name="bucket" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for bucket in [Bucket::Weekly, Bucket::Monthly] {
                        option value=(bucket.as_query_value()) selected[data.bucket == bucket]
                        {
                            (bucket.label())
                        }
                    }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Update" }
        }
    }
}

/// Renders the main dashboard page with the range form, totals and charts.
fn dashboard_view(nav_bar: NavBar, data: &DashboardData, currency_symbol: &str) -> Markup {
    let nav_bar = nav_bar.into_html();

    let content = html!(
        (nav_bar)

        div
            id="dashboard-content"
            class="flex flex-col items-center gap-6 px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            h1 class="text-xl font-bold self-start" { "Dashboard" }

            (range_form(data))

            (kpi_cards(&data.kpis, currency_symbol))

            (charts_view(&data.charts))

            @if !data.has_expenses {
                p class="text-sm text-gray-600 dark:text-gray-400" data-empty-state="no-expenses"
                {
                    "No expenses in this range."
                }
            }
        }
    );

    let scripts = [
        HeadElement::ScriptLink(ECHARTS_SCRIPT_URL.to_owned()),
        charts_script(&data.charts),
    ];

    base("Dashboard", &scripts, &content)
}

#[cfg(test)]
mod dashboard_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
    };
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        auth::CurrentUser,
        category::{CategoryKind, CategoryName, create_category},
        test_utils::{
            assert_valid_html, get_test_connection, insert_test_transaction, insert_test_user,
            parse_html_document, test_current_user,
        },
    };

    use super::{DashboardQuery, DashboardState, clamp_range, get_dashboard_page};

    fn january_query() -> Query<DashboardQuery> {
        Query(DashboardQuery {
            date_from: Some("2024-01-01".to_owned()),
            date_to: Some("2024-01-31".to_owned()),
            bucket: Some("monthly".to_owned()),
        })
    }

    fn kpi(html: &Html, key: &str) -> String {
        let selector = Selector::parse(&format!("[data-kpi='{key}'] [data-kpi-value]")).unwrap();
        html.select(&selector)
            .next()
            .unwrap_or_else(|| panic!("no KPI card for {key}"))
            .text()
            .collect::<String>()
            .trim()
            .to_owned()
    }

    #[track_caller]
    fn assert_chart_exists(html: &Html, chart_id: &str) {
        let selector = Selector::parse(&format!("#{chart_id}")).unwrap();
        assert!(
            html.select(&selector).next().is_some(),
            "Chart with id '{chart_id}' not found"
        );
    }

    /// User A records groceries in January, user B records nothing.
    fn two_users() -> (DashboardState, CurrentUser, CurrentUser) {
        let connection = get_test_connection();
        let user_a = test_current_user(insert_test_user(&connection, "ada"));
        let user_b = test_current_user(insert_test_user(&connection, "bob"));
        let groceries = create_category(
            user_a.id,
            CategoryName::new_unchecked("Groceries"),
            CategoryKind::Expense,
            &connection,
        )
        .unwrap();
        insert_test_transaction(
            &connection,
            user_a.id,
            &groceries,
            50.0,
            date!(2024 - 01 - 05),
        );

        let state = DashboardState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        (state, user_a, user_b)
    }

    #[tokio::test]
    async fn january_groceries_show_in_totals() {
        let (state, user_a, _) = two_users();

        let response = get_dashboard_page(State(state), Extension(user_a), january_query())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(kpi(&html, "income"), "£0.00");
        assert_eq!(kpi(&html, "expense"), "£50.00");
        assert_eq!(kpi(&html, "net"), "-£50.00");
        assert_chart_exists(&html, "cash-flow-chart");
        assert_chart_exists(&html, "expenses-chart");
        assert!(html.html().contains("Groceries"));
    }

    #[tokio::test]
    async fn other_users_see_none_of_it() {
        let (state, _, user_b) = two_users();

        let response = get_dashboard_page(State(state), Extension(user_b), january_query())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        let selector = Selector::parse("[data-empty-state='no-transactions']").unwrap();
        assert!(html.select(&selector).next().is_some());
        assert!(!html.html().contains("Groceries"));
    }

    #[tokio::test]
    async fn range_without_expenses_has_no_donut() {
        let (state, user_a, _) = two_users();
        let query = Query(DashboardQuery {
            date_from: Some("2024-02-01".to_owned()),
            date_to: Some("2024-02-29".to_owned()),
            bucket: None,
        });

        let response = get_dashboard_page(State(state), Extension(user_a), query)
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_eq!(kpi(&html, "expense"), "£0.00");
        assert_chart_exists(&html, "cash-flow-chart");
        let donut = Selector::parse("#expenses-chart").unwrap();
        assert!(html.select(&donut).next().is_none());
        let message = Selector::parse("[data-empty-state='no-expenses']").unwrap();
        assert!(html.select(&message).next().is_some());
    }

    #[tokio::test]
    async fn range_form_reflects_query() {
        let (state, user_a, _) = two_users();
        let query = Query(DashboardQuery {
            date_from: Some("2024-01-31".to_owned()),
            date_to: Some("2024-01-01".to_owned()),
            bucket: Some("MONTHLY".to_owned()),
        });

        let response = get_dashboard_page(State(state), Extension(user_a), query)
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let date_from = Selector::parse("input[name='date_from']").unwrap();
        let date_to = Selector::parse("input[name='date_to']").unwrap();
        let bucket = Selector::parse("select[name='bucket'] option[selected]").unwrap();
        assert_eq!(
            html.select(&date_from).next().unwrap().value().attr("value"),
            Some("2024-01-01")
        );
        assert_eq!(
            html.select(&date_to).next().unwrap().value().attr("value"),
            Some("2024-01-31")
        );
        assert_eq!(
            html.select(&bucket).next().unwrap().value().attr("value"),
            Some("monthly")
        );
    }

    #[test]
    fn long_ranges_keep_their_most_recent_years() {
        assert_eq!(
            clamp_range(date!(1900 - 01 - 01), date!(2024 - 12 - 31)),
            (date!(2019 - 12 - 29), date!(2024 - 12 - 31))
        );
        assert_eq!(
            clamp_range(date!(2024 - 01 - 01), date!(2024 - 12 - 31)),
            (date!(2024 - 01 - 01), date!(2024 - 12 - 31))
        );
    }

    #[tokio::test]
    async fn huge_range_is_shortened() {
        let (state, user_a, _) = two_users();
        let query = Query(DashboardQuery {
            date_from: Some("0001-01-01".to_owned()),
            date_to: Some("9999-12-31".to_owned()),
            bucket: Some("weekly".to_owned()),
        });

        let response = get_dashboard_page(State(state), Extension(user_a), query)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        let date_from = Selector::parse("input[name='date_from']").unwrap();
        assert_eq!(
            html.select(&date_from).next().unwrap().value().attr("value"),
            Some("9994-12-28")
        );
    }
}
