//! Defines the route handler for the Profit & Loss report page.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    aggregation::CategoryTotal,
    auth::CurrentUser,
    dashboard::kpi_cards,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_currency,
    },
    navigation::NavBar,
    report::statement::{ProfitAndLoss, ReportQuery, get_profit_and_loss},
    timezone::get_local_today,
};

/// The state needed for the report page and its CSV export.
#[derive(Debug, Clone)]
pub struct ReportState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Load the statement for the query's range under the database lock.
pub(super) fn load_report(
    state: &ReportState,
    user: &CurrentUser,
    query: &ReportQuery,
) -> Result<ProfitAndLoss, Error> {
    let today = get_local_today(&state.local_timezone)
        .inspect_err(|error| tracing::error!("could not get local date: {error}"))?;
    let (date_from, date_to) = query.date_range(today);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_profit_and_loss(user.id, date_from, date_to, &connection)
        .inspect_err(|error| tracing::error!("could not build report: {error}"))
}

/// Render the Profit & Loss report for the requested range.
pub async fn get_report_page(
    State(state): State<ReportState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, Error> {
    let report = load_report(&state, &user, &query)?;

    Ok(report_view(&report, user.currency_symbol()).into_response())
}

fn export_url(report: &ProfitAndLoss) -> String {
    let query = [
        ("date_from", report.date_from.to_string()),
        ("date_to", report.date_to.to_string()),
    ];

    match serde_urlencoded::to_string(query) {
        Ok(query) => format!("{}?{query}", endpoints::REPORT_CSV),
        Err(error) => {
            tracing::error!("could not encode report export query: {error}");
            endpoints::REPORT_CSV.to_owned()
        }
    }
}

fn breakdown_table(
    caption: &str,
    key: &str,
    totals: &[CategoryTotal],
    currency_symbol: &str,
) -> Markup {
    html! {
        section class="w-full" data-breakdown=(key)
        {
            h2 class="text-lg font-semibold mb-2" { (caption) }

            @if totals.is_empty() {
                p class="text-sm text-gray-600 dark:text-gray-400" { "Nothing recorded in this range." }
            } @else {
                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Total" }
                        }
                    }

                    tbody
                    {
                        @for total in totals {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (total.name) }
                                td class={ (TABLE_CELL_STYLE) " text-right tabular-nums" }
                                {
                                    (format_currency(total.total, currency_symbol))
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn report_view(report: &ProfitAndLoss, currency_symbol: &str) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORT_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Profit & Loss" }

                    a href=(export_url(report)) class=(LINK_STYLE) download
                    {
                        "Export CSV"
                    }
                }

                form
                    method="get"
                    action=(endpoints::REPORT_VIEW)
                    class="grid grid-cols-1 sm:grid-cols-3 gap-3 items-end
                        bg-gray-50 dark:bg-gray-800 p-4 rounded-lg"
                    aria-label="Report range"
                {
                    div
                    {
                        label for="date_from" class=(FORM_LABEL_STYLE) { "From" }
                        input
                            type="date"
                            id="date_from"
                            name="date_from"
                            value=(report.date_from)
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div
                    {
                        label for="date_to" class=(FORM_LABEL_STYLE) { "To" }
                        input
                            type="date"
                            id="date_to"
                            name="date_to"
                            value=(report.date_to)
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Update" }
                }

                (kpi_cards(&report.kpis, currency_symbol))

                div class="grid grid-cols-1 lg:grid-cols-2 gap-6"
                {
                    (breakdown_table("Income by Category", "income", &report.income_by_category, currency_symbol))
                    (breakdown_table("Expense by Category", "expense", &report.expense_by_category, currency_symbol))
                }
            }
        }
    );

    base("Profit & Loss", &[], &content)
}
