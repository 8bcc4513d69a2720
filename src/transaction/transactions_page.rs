//! Defines the route handler for the page that lists and filters transactions.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    AppState, Error,
    aggregation::Kpis,
    auth::CurrentUser,
    category::{Category, CategoryKind, get_categories, kind_badge},
    dashboard::kpi_cards,
    endpoints::{self, format_endpoint},
    filter::{
        FilterQuery, TransactionFilter, count_filtered_transactions, filter_transactions,
        filtered_kpis,
    },
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, amount_class,
        base, date_datetime_attr, edit_delete_action_links, format_currency, link,
    },
    navigation::NavBar,
    pagination::{
        PageRequest, PaginationConfig, PaginationIndicator, create_pagination_indicators,
        pagination_nav,
    },
    transaction::{Transaction, count_transactions},
};

/// The max number of graphemes to display in the transaction table rows before
/// truncating and displaying ellipses.
const MAX_TITLE_GRAPHEMES: usize = 32;

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsViewState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Configuration for pagination controls.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionsViewState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// Everything the transactions page shows, loaded under one database lock.
struct TransactionsPageData {
    filter: TransactionFilter,
    page: PageRequest,
    indicators: Vec<PaginationIndicator>,
    transactions: Vec<Transaction>,
    match_count: u32,
    kpis: Kpis,
    categories: Vec<Category>,
    has_any_transactions: bool,
}

/// Render the user's transactions, narrowed by the filters in the query string.
///
/// The KPI cards are totals over every matching transaction, not just the
/// current page.
pub async fn get_transactions_page(
    State(state): State<TransactionsViewState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<FilterQuery>,
) -> Result<Response, Error> {
    let filter = TransactionFilter::from_query(&query);
    let page = PageRequest::from_query(
        query.page.as_deref(),
        query.per_page.as_deref(),
        &state.pagination_config,
    );

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let match_count = count_filtered_transactions(user.id, &filter, &connection)
        .inspect_err(|error| tracing::error!("could not count transactions: {error}"))?;
    let page_count = page.page_count(match_count as u64);
    let page = page.clamp_to(page_count);

    let transactions = filter_transactions(user.id, &filter, Some(page), &connection)
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;
    let kpis = filtered_kpis(user.id, &filter, &connection)
        .inspect_err(|error| tracing::error!("could not sum transactions: {error}"))?;
    let categories = get_categories(user.id, None, &connection)?;
    let has_any_transactions = if filter.is_active() {
        count_transactions(user.id, &connection)? > 0
    } else {
        match_count > 0
    };

    let data = TransactionsPageData {
        indicators: create_pagination_indicators(
            page.page,
            page_count,
            state.pagination_config.max_pages,
        ),
        filter,
        page,
        transactions,
        match_count,
        kpis,
        categories,
        has_any_transactions,
    };

    Ok(transactions_view(&data, user.currency_symbol()).into_response())
}

fn page_url(filter: &TransactionFilter, page: u64, per_page: u64) -> String {
    let mut pairs = filter.query_pairs();
    pairs.push(("page", page.to_string()));
    pairs.push(("per_page", per_page.to_string()));

    match serde_urlencoded::to_string(&pairs) {
        Ok(query) => format!("{}?{query}", endpoints::TRANSACTIONS_VIEW),
        Err(error) => {
            tracing::error!("could not encode transactions page query: {error}");
            endpoints::TRANSACTIONS_VIEW.to_owned()
        }
    }
}

fn truncate_title(title: &str) -> String {
    let mut graphemes = title.graphemes(true);
    let truncated: String = graphemes.by_ref().take(MAX_TITLE_GRAPHEMES).collect();

    if graphemes.next().is_some() {
        format!("{truncated}…")
    } else {
        truncated
    }
}

fn transactions_view(data: &TransactionsPageData, currency_symbol: &str) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let per_page = data.page.per_page;
    let new_transaction_link = link(endpoints::NEW_TRANSACTION_VIEW, "Create one now");

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Transactions" }

                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                    {
                        "Create Transaction"
                    }
                }

                @if !data.has_any_transactions {
                    p data-empty-state="no-transactions"
                    {
                        "You have not recorded any transactions yet. " (new_transaction_link) "."
                    }
                } @else {
                    (filter_form(&data.filter, &data.categories, per_page))

                    (kpi_cards(&data.kpis, currency_symbol))

                    p class="text-sm text-gray-600 dark:text-gray-400" data-match-count
                    {
                        (data.match_count)
                        @if data.match_count == 1 { " transaction" } @else { " transactions" }
                    }

                    @if data.transactions.is_empty() {
                        p data-empty-state="no-matches"
                        {
                            "No transactions match these filters. "
                            a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE) { "Clear filters" }
                        }
                    } @else {
                        (transaction_cards_view(&data.transactions, currency_symbol))
                        (transaction_table_view(&data.transactions, currency_symbol))
                    }

                    (pagination_nav(&data.indicators, |page| page_url(&data.filter, page, per_page)))
                }
            }
        }
    );

    base("Transactions", &[], &content)
}

fn filter_form(filter: &TransactionFilter, categories: &[Category], per_page: u64) -> Markup {
    let date_from = filter.date_from.map(|date| date.to_string());
    let date_to = filter.date_to.map(|date| date.to_string());

    html! {
        form
            method="get"
            action=(endpoints::TRANSACTIONS_VIEW)
            class="grid grid-cols-1 md:grid-cols-3 lg:grid-cols-6 gap-3 items-end
                bg-gray-50 dark:bg-gray-800 p-4 rounded-lg"
            aria-label="Filter transactions"
        {
            input type="hidden" name="per_page" value=(per_page);

            div
            {
                label for="type" class=(FORM_LABEL_STYLE) { "Type" }
                select id="type" name="type" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="Both" selected[filter.kind.is_none()] { "Both" }
                    @for kind in CategoryKind::ALL {
                        option value=(kind) selected[filter.kind == Some(kind)] { (kind) }
                    }
                }
            }

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }
                select id="category" name="category" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[filter.category_id.is_none()] { "All categories" }
                    @for category in categories {
                        option
                            value=(category.id)
                            selected[filter.category_id == Some(category.id)]
                        {
                            (category.name) " (" (category.kind) ")"
                        }
                    }
                }
            }

            div
            {
                label for="date_from" class=(FORM_LABEL_STYLE) { "From" }
                input
                    type="date"
                    id="date_from"
                    name="date_from"
                    value=[date_from.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="date_to" class=(FORM_LABEL_STYLE) { "To" }
                input
                    type="date"
                    id="date_to"
                    name="date_to"
                    value=[date_to.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="q" class=(FORM_LABEL_STYLE) { "Search" }
                input
                    type="search"
                    id="q"
                    name="q"
                    placeholder="Title, notes or category"
                    value=[filter.search.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="flex gap-3 items-center"
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Apply" }

                @if filter.is_active() {
                    a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE) { "Clear" }
                }
            }
        }
    }
}

fn confirm_message(transaction: &Transaction) -> String {
    format!(
        "Are you sure you want to delete '{}'? This cannot be undone.",
        transaction.title
    )
}

fn transaction_cards_view(transactions: &[Transaction], currency_symbol: &str) -> Markup {
    html! {
        ul class="lg:hidden space-y-4"
        {
            @for transaction in transactions {
                @let edit_url = format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id);
                @let delete_url = format_endpoint(endpoints::TRANSACTION, transaction.id);
                @let signed_amount = transaction.signed_amount();

                li class="rounded border border-gray-200 bg-white px-4 py-3 shadow-sm dark:border-gray-700 dark:bg-gray-800"
                    data-transaction-card="true"
                {
                    div class="flex items-start justify-between gap-3"
                    {
                        div
                        {
                            p class="font-medium text-gray-900 dark:text-white" title=(transaction.title)
                            {
                                (truncate_title(&transaction.title))
                            }
                            p class="text-xs text-gray-500 dark:text-gray-400"
                            {
                                time datetime=(date_datetime_attr(transaction.date)) { (transaction.date) }
                                " · " (transaction.category_name)
                            }
                        }

                        span class={ "text-sm tabular-nums " (amount_class(signed_amount)) }
                        {
                            (format_currency(signed_amount, currency_symbol))
                        }
                    }

                    div class="mt-2 flex items-center gap-4 text-sm"
                    {
                        (edit_delete_action_links(
                            &edit_url,
                            &delete_url,
                            &confirm_message(transaction),
                            "closest [data-transaction-card='true']",
                            "outerHTML",
                        ))
                    }
                }
            }
        }
    }
}

fn transaction_table_view(transactions: &[Transaction], currency_symbol: &str) -> Markup {
    html! {
        div class="hidden lg:block dark:bg-gray-800"
        {
            table class="w-full text-sm text-left rtl:text-right
                text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Title" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                        th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @for transaction in transactions {
                        @let edit_url = format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id);
                        @let delete_url = format_endpoint(endpoints::TRANSACTION, transaction.id);
                        @let signed_amount = transaction.signed_amount();

                        tr class=(TABLE_ROW_STYLE) data-transaction-row=(transaction.id)
                        {
                            td class=(TABLE_CELL_STYLE)
                            {
                                time datetime=(date_datetime_attr(transaction.date)) { (transaction.date) }
                            }
                            td class=(TABLE_CELL_STYLE) title=(transaction.title)
                            {
                                (truncate_title(&transaction.title))
                            }
                            td class=(TABLE_CELL_STYLE) { (transaction.category_name) }
                            td class=(TABLE_CELL_STYLE) { (kind_badge(transaction.kind)) }
                            td class={ (TABLE_CELL_STYLE) " text-right tabular-nums " (amount_class(signed_amount)) }
                            {
                                (format_currency(signed_amount, currency_symbol))
                            }
                            td class=(TABLE_CELL_STYLE)
                            {
                                div class="flex gap-4"
                                {
                                    (edit_delete_action_links(
                                        &edit_url,
                                        &delete_url,
                                        &confirm_message(transaction),
                                        "closest tr",
                                        "delete",
                                    ))
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
