//! Defines the route handler for the page for editing a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::CurrentUser,
    category::{Category, get_categories},
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, base, currency_input_styles},
    navigation::NavBar,
    timezone::get_local_today,
    transaction::{
        TransactionId,
        form::{FormTarget, TransactionFormDefaults, transaction_form},
        get_transaction,
    },
};

/// The state needed for the edit transaction page.
#[derive(Debug, Clone)]
pub struct EditTransactionPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for accessing transactions and categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for editing a transaction.
///
/// Transactions that do not exist or belong to another user get the 404 page.
pub async fn get_edit_transaction_page(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<EditTransactionPageState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, Error> {
    let today = get_local_today(&state.local_timezone)
        .inspect_err(|_| tracing::error!("Invalid timezone {}", state.local_timezone))?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(user.id, transaction_id, &connection)?;
    let categories = get_categories(user.id, None, &connection).inspect_err(|error| {
        tracing::error!("Failed to retrieve categories for edit transaction page: {error}")
    })?;

    let defaults = TransactionFormDefaults {
        kind: transaction.kind,
        amount: Some(transaction.amount),
        date: transaction.date,
        title: &transaction.title,
        notes: &transaction.notes,
        category_id: Some(transaction.category_id),
        new_category: "",
        max_date: today,
    };

    Ok(edit_transaction_view(
        transaction_id,
        &defaults,
        &categories,
        user.currency_symbol(),
    )
    .into_response())
}

fn edit_transaction_view(
    transaction_id: TransactionId,
    defaults: &TransactionFormDefaults<'_>,
    categories: &[Category],
    currency_symbol: &str,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::EDIT_TRANSACTION_VIEW).into_html();
    let update_endpoint = format_endpoint(endpoints::TRANSACTION, transaction_id);
    let form = transaction_form(
        FormTarget::Update(&update_endpoint),
        defaults,
        categories,
        "",
    );

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-4"
            {
                h2 class="text-xl font-bold" { "Edit Transaction" }

                (form)
            }
        }
    };

    base(
        "Edit Transaction",
        &[currency_input_styles(currency_symbol)],
        &content,
    )
}

#[cfg(test)]
mod edit_transaction_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use time::macros::date;

    use crate::{
        category::{CategoryKind, CategoryName, create_category},
        endpoints::{self, format_endpoint},
        test_utils::{
            assert_form_input_with_value, assert_form_radio_checked, assert_form_select,
            assert_form_submit_button_with_text, assert_hx_endpoint, assert_valid_html,
            get_test_connection, insert_test_transaction, insert_test_user, must_get_form,
            parse_html_document, test_current_user,
        },
        transaction::edit_page::{EditTransactionPageState, get_edit_transaction_page},
    };

    #[tokio::test]
    async fn renders_form_with_transaction_values() {
        let connection = get_test_connection();
        let user = test_current_user(insert_test_user(&connection, "ada"));
        let category = create_category(
            user.id,
            CategoryName::new_unchecked("Salary"),
            CategoryKind::Income,
            &connection,
        )
        .unwrap();
        let transaction =
            insert_test_transaction(&connection, user.id, &category, 1234.5, date!(2025 - 01 - 31));
        let state = EditTransactionPageState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response =
            get_edit_transaction_page(Path(transaction.id), State(state), Extension(user))
                .await
                .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &format_endpoint(endpoints::TRANSACTION, transaction.id),
            "hx-put",
        );
        assert_form_radio_checked(&form, "kind", "Income");
        assert_form_input_with_value(&form, "amount", "number", "1234.50");
        assert_form_input_with_value(&form, "date", "date", "2025-01-31");
        assert_form_input_with_value(&form, "title", "text", "Salary");
        assert_form_select(&form, "category_id", &category.id.to_string());
        assert_form_submit_button_with_text(&form, "Update Transaction");
    }

    #[tokio::test]
    async fn another_users_transaction_is_not_found() {
        let connection = get_test_connection();
        let owner = insert_test_user(&connection, "ada");
        let category = create_category(
            owner,
            CategoryName::new_unchecked("Salary"),
            CategoryKind::Income,
            &connection,
        )
        .unwrap();
        let transaction =
            insert_test_transaction(&connection, owner, &category, 10.0, date!(2025 - 01 - 31));
        let other_user = test_current_user(insert_test_user(&connection, "grace"));
        let state = EditTransactionPageState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response =
            get_edit_transaction_page(Path(transaction.id), State(state), Extension(other_user))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
