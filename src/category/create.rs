//! Category creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::CurrentUser,
    category::{
        CategoryKind, CategoryName, create_category, domain::CategoryFormData,
        form::category_form_fields,
    },
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_ERROR_STYLE, base},
    navigation::NavBar,
};

/// The state needed for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the category creation page.
pub async fn get_new_category_page() -> Response {
    new_category_view().into_response()
}

/// Handle category creation form submission.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryEndpointState>,
    Extension(user): Extension<CurrentUser>,
    Form(new_category): Form<CategoryFormData>,
) -> Response {
    let name = match CategoryName::new(&new_category.name) {
        Ok(name) => name,
        Err(error) => {
            return new_category_form_view(
                &new_category.name,
                new_category.kind,
                &format!("Error: {error}"),
            )
            .into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_category(user.id, name, new_category.kind, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::DuplicateCategoryName) => new_category_form_view(
            &new_category.name,
            new_category.kind,
            &format!("Error: {}", Error::DuplicateCategoryName),
        )
        .into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");

            error.into_alert_response()
        }
    }
}

fn new_category_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_CATEGORY_VIEW).into_html();
    let form = new_category_form_view("", CategoryKind::Expense, "");

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Create Category", &[], &content)
}

fn new_category_form_view(name: &str, kind: CategoryKind, error_message: &str) -> Markup {
    html! {
        form
            hx-post=(endpoints::CATEGORIES_API)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (category_form_fields(name, kind))

            @if !error_message.is_empty() {
                p class=(FORM_ERROR_STYLE)
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Category" }
        }
    }
}


#[cfg(test)]
mod create_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Form,
        extract::State,
        http::{StatusCode, header::CONTENT_TYPE},
        response::IntoResponse,
    };

    use crate::{
        auth::CurrentUser,
        category::{
            CategoryKind, CategoryName, create::CreateCategoryEndpointState,
            create_category_endpoint, domain::CategoryFormData, get_categories,
        },
        endpoints,
        test_utils::{
            assert_form_error_message, assert_hx_redirect, assert_valid_html, get_header,
            get_test_connection, insert_test_user, must_get_form, parse_html_fragment,
            test_current_user,
        },
    };

    fn get_state() -> (CreateCategoryEndpointState, CurrentUser) {
        let connection = get_test_connection();
        let user = test_current_user(insert_test_user(&connection, "ada"));

        (
            CreateCategoryEndpointState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user,
        )
    }

    fn form(name: &str, kind: CategoryKind) -> CategoryFormData {
        CategoryFormData {
            name: name.to_owned(),
            kind,
        }
    }

    #[tokio::test]
    async fn can_create_category() {
        let (state, user) = get_state();

        let response = create_category_endpoint(
            State(state.clone()),
            Extension(user.clone()),
            Form(form("  Eating   out ", CategoryKind::Expense)),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::CATEGORIES_VIEW);
        let categories = get_categories(user.id, None, &state.db_connection.lock().unwrap())
            .unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, CategoryName::new_unchecked("Eating out"));
        assert_eq!(categories[0].kind, CategoryKind::Expense);
        assert_eq!(categories[0].user_id, user.id);
    }

    #[tokio::test]
    async fn create_category_fails_on_empty_name() {
        let (state, user) = get_state();

        let response = create_category_endpoint(
            State(state),
            Extension(user),
            Form(form(" ", CategoryKind::Income)),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            get_header(&response, CONTENT_TYPE.as_str()),
            "text/html; charset=utf-8"
        );
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_form_error_message(&form, "Error: Category name cannot be empty");
    }

    #[tokio::test]
    async fn create_category_fails_on_duplicate_name() {
        let (state, user) = get_state();
        create_category_endpoint(
            State(state.clone()),
            Extension(user.clone()),
            Form(form("Salary", CategoryKind::Income)),
        )
        .await;

        let response = create_category_endpoint(
            State(state),
            Extension(user),
            Form(form("SALARY", CategoryKind::Income)),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let form = must_get_form(&html);
        assert_form_error_message(
            &form,
            "Error: You already have a category with this name for this type.",
        );
    }
}
