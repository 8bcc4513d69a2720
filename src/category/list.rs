//! Categories listing page, grouped into income and expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::CurrentUser,
    category::{Category, CategoryKind, count_transactions_per_category, get_categories},
    endpoints,
    html::{
        EXPENSE_BADGE_STYLE, INCOME_BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, edit_delete_action_links,
    },
    navigation::NavBar,
};

/// The state needed for the categories listing page.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A category with the URLs and counts needed to render it.
#[derive(Debug, Clone)]
struct CategoryRow {
    category: Category,
    edit_url: String,
    delete_url: String,
    transaction_count: u32,
}

impl CategoryRow {
    fn confirm_message(&self) -> String {
        format!(
            "Are you sure you want to delete '{}'? This cannot be undone.",
            self.category.name
        )
    }
}

/// Render the categories listing page with transaction counts.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_categories(user.id, None, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    let transactions_per_category = count_transactions_per_category(user.id, &connection)
        .inspect_err(|error| {
            tracing::error!("Could not count transactions per category: {error}")
        })?;

    let rows = categories
        .into_iter()
        .map(|category| CategoryRow {
            edit_url: endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category.id),
            delete_url: endpoints::format_endpoint(endpoints::CATEGORY, category.id),
            transaction_count: transactions_per_category
                .get(&category.id)
                .copied()
                .unwrap_or(0),
            category,
        })
        .collect::<Vec<_>>();

    Ok(categories_view(&rows).into_response())
}

/// A coloured pill showing whether something is income or expense.
pub(crate) fn kind_badge(kind: CategoryKind) -> Markup {
    let style = match kind {
        CategoryKind::Income => INCOME_BADGE_STYLE,
        CategoryKind::Expense => EXPENSE_BADGE_STYLE,
    };

    html!( span class=(style) { (kind) } )
}

fn categories_view(rows: &[CategoryRow]) -> Markup {
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Categories" }

                    a href=(endpoints::NEW_CATEGORY_VIEW) class=(LINK_STYLE)
                    {
                        "Create Category"
                    }
                }

                @for kind in CategoryKind::ALL {
                    (kind_section(kind, rows))
                }
            }
        }
    );

    base("Categories", &[], &content)
}

fn kind_section(kind: CategoryKind, rows: &[CategoryRow]) -> Markup {
    let rows = rows
        .iter()
        .filter(|row| row.category.kind == kind)
        .collect::<Vec<_>>();
    let heading = match kind {
        CategoryKind::Income => "Income categories",
        CategoryKind::Expense => "Expense categories",
    };
    let empty_message = match kind {
        CategoryKind::Income => "No income categories yet. ",
        CategoryKind::Expense => "No expense categories yet. ",
    };

    html!(
        section class="space-y-3" data-category-kind=(kind)
        {
            h2 class="text-lg font-semibold" { (heading) }

            (category_cards_view(&rows, empty_message))

            div class="hidden lg:block dark:bg-gray-800"
            {
                table class="w-full text-sm text-left rtl:text-right
                    text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Transactions" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                        }
                    }

                    tbody
                    {
                        @for row in &rows {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (row.category.name) }
                                td class=(TABLE_CELL_STYLE) { (kind_badge(row.category.kind)) }
                                td class=(TABLE_CELL_STYLE) { (row.transaction_count) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    div class="flex gap-4"
                                    {
                                        (edit_delete_action_links(
                                            &row.edit_url,
                                            &row.delete_url,
                                            &row.confirm_message(),
                                            "closest tr",
                                            "delete",
                                        ))
                                    }
                                }
                            }
                        }

                        @if rows.is_empty() {
                            tr
                            {
                                td
                                    colspan="4"
                                    class="px-6 py-4 text-center
                                        text-gray-500 dark:text-gray-400"
                                {
                                    (empty_message)
                                    a href=(endpoints::NEW_CATEGORY_VIEW) class=(LINK_STYLE)
                                    {
                                        "Create your first category"
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    )
}

fn category_cards_view(rows: &[&CategoryRow], empty_message: &str) -> Markup {
    html!(
        ul class="lg:hidden space-y-4"
        {
            @for row in rows {
                li class="rounded border border-gray-200 bg-white px-4 py-3 shadow-sm dark:border-gray-700 dark:bg-gray-800"
                    data-category-card="true"
                {
                    div class="flex items-start justify-between gap-3"
                    {
                        span class="font-medium text-gray-900 dark:text-white" { (row.category.name) }
                        span class="text-sm tabular-nums text-gray-900 dark:text-white"
                        { (row.transaction_count) }
                    }

                    div class="mt-2 flex items-center gap-4 text-sm"
                    {
                        (edit_delete_action_links(
                            &row.edit_url,
                            &row.delete_url,
                            &row.confirm_message(),
                            "closest [data-category-card='true']",
                            "outerHTML",
                        ))
                    }
                }
            }

            @if rows.is_empty() {
                li class="rounded border border-dashed border-gray-300 bg-white px-4 py-6 text-center text-sm text-gray-500 dark:border-gray-700 dark:bg-gray-800 dark:text-gray-400"
                {
                    (empty_message)
                    a href=(endpoints::NEW_CATEGORY_VIEW) class=(LINK_STYLE)
                    {
                        "Create your first category"
                    }
                }
            }
        }
    )
}

#[cfg(test)]
mod categories_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        auth::CurrentUser,
        category::{CategoryKind, CategoryName, create_category, get_categories_page},
        endpoints,
        test_utils::{
            assert_content_type, assert_valid_html, get_test_connection, insert_test_transaction,
            insert_test_user, parse_html_document, test_current_user,
        },
    };

    use super::CategoriesPageState;

    fn get_state() -> (CategoriesPageState, CurrentUser) {
        let connection = get_test_connection();
        let user = test_current_user(insert_test_user(&connection, "ada"));

        (
            CategoriesPageState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user,
        )
    }

    fn table_rows(html: &Html, kind: &str) -> Vec<Vec<String>> {
        let selector =
            Selector::parse(&format!("section[data-category-kind='{kind}'] table tbody tr"))
                .unwrap();
        let cell_selector = Selector::parse("td").unwrap();

        html.select(&selector)
            .map(|row| {
                row.select(&cell_selector)
                    .map(|cell| cell.text().collect::<String>().trim().to_owned())
                    .collect()
            })
            .collect()
    }

    #[tokio::test]
    async fn lists_categories_grouped_by_kind_with_counts() {
        let (state, user) = get_state();
        {
            let connection = state.db_connection.lock().unwrap();
            let salary = create_category(
                user.id,
                CategoryName::new_unchecked("Salary"),
                CategoryKind::Income,
                &connection,
            )
            .unwrap();
            create_category(
                user.id,
                CategoryName::new_unchecked("Rent"),
                CategoryKind::Expense,
                &connection,
            )
            .unwrap();
            insert_test_transaction(&connection, user.id, &salary, 3000.0, date!(2025 - 01 - 31));
            insert_test_transaction(&connection, user.id, &salary, 3000.0, date!(2025 - 02 - 28));
        }

        let response = get_categories_page(State(state), Extension(user))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let income_rows = table_rows(&html, "Income");
        assert_eq!(income_rows.len(), 1);
        assert_eq!(income_rows[0][0], "Salary");
        assert_eq!(income_rows[0][2], "2");

        let expense_rows = table_rows(&html, "Expense");
        assert_eq!(expense_rows.len(), 1);
        assert_eq!(expense_rows[0][0], "Rent");
        assert_eq!(expense_rows[0][2], "0");
    }

    #[tokio::test]
    async fn does_not_show_other_users_categories() {
        let (state, user) = get_state();
        {
            let connection = state.db_connection.lock().unwrap();
            let other_user = insert_test_user(&connection, "grace");
            create_category(
                other_user,
                CategoryName::new_unchecked("Secret"),
                CategoryKind::Expense,
                &connection,
            )
            .unwrap();
        }

        let response = get_categories_page(State(state), Extension(user))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let expense_rows = table_rows(&html, "Expense");
        assert_eq!(expense_rows.len(), 1);
        assert!(expense_rows[0][0].starts_with("No expense categories yet."));
    }

    #[tokio::test]
    async fn delete_buttons_target_category_api() {
        let (state, user) = get_state();
        let category = create_category(
            user.id,
            CategoryName::new_unchecked("Rent"),
            CategoryKind::Expense,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response = get_categories_page(State(state), Extension(user))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let want_url = endpoints::format_endpoint(endpoints::CATEGORY, category.id);
        let selector = Selector::parse("button[hx-delete]").unwrap();
        let buttons = html.select(&selector).collect::<Vec<_>>();
        // One for the table row and one for the mobile card.
        assert_eq!(buttons.len(), 2);
        for button in buttons {
            assert_eq!(button.value().attr("hx-delete"), Some(want_url.as_str()));
        }
    }
}
