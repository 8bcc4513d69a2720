//! Category deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::CurrentUser,
    category::{CategoryId, delete_category},
};

/// The state needed for deleting a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle category deletion. Returns a success alert or an error alert.
///
/// Categories that still have transactions are kept and a 409 alert explains why.
pub async fn delete_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<DeleteCategoryEndpointState>,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_category(user.id, category_id, &connection) {
        Ok(_) => Alert::SuccessSimple {
            message: "Category deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error @ (Error::CategoryInUse | Error::DeleteMissingCategory)) => {
            tracing::debug!("Refused to delete category {category_id}: {error}");
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use scraper::Html;
    use time::macros::date;

    use crate::{
        auth::CurrentUser,
        category::{
            Category, CategoryKind, CategoryName, create_category, delete_category_endpoint,
            get_category,
        },
        error::CATEGORY_IN_USE_MESSAGE,
        test_utils::{
            assert_valid_html, get_header, get_test_connection, insert_test_transaction,
            insert_test_user, parse_html_fragment, test_current_user,
        },
    };

    use super::DeleteCategoryEndpointState;

    fn get_state() -> (DeleteCategoryEndpointState, CurrentUser, Category) {
        let connection = get_test_connection();
        let user = test_current_user(insert_test_user(&connection, "ada"));
        let category = create_category(
            user.id,
            CategoryName::new_unchecked("Test Category"),
            CategoryKind::Expense,
            &connection,
        )
        .expect("Could not create test category");

        (
            DeleteCategoryEndpointState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user,
            category,
        )
    }

    #[tokio::test]
    async fn delete_category_endpoint_succeeds() {
        let (state, user, category) = get_state();

        let response =
            delete_category_endpoint(Path(category.id), State(state.clone()), Extension(user.clone()))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(get_category(user.id, category.id, &state.db_connection.lock().unwrap()).is_err());
    }

    #[tokio::test]
    async fn delete_category_in_use_returns_conflict() {
        let (state, user, category) = get_state();
        insert_test_transaction(
            &state.db_connection.lock().unwrap(),
            user.id,
            &category,
            50.0,
            date!(2024 - 01 - 05),
        );

        let response =
            delete_category_endpoint(Path(category.id), State(state.clone()), Extension(user.clone()))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let paragraphs = paragraphs(&html);
        assert_eq!(paragraphs[0], "Could not delete category");
        assert_eq!(paragraphs[1], CATEGORY_IN_USE_MESSAGE);
        assert!(get_category(user.id, category.id, &state.db_connection.lock().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn delete_another_users_category_returns_not_found() {
        let (state, _, category) = get_state();
        let other_user =
            test_current_user(insert_test_user(&state.db_connection.lock().unwrap(), "grace"));

        let response = delete_category_endpoint(Path(category.id), State(state), Extension(other_user))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            get_header(&response, "content-type"),
            "text/html; charset=utf-8"
        );

        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert_eq!(paragraphs(&html)[0], "Could not delete category");
    }

    fn paragraphs(html: &Html) -> Vec<String> {
        html.select(&scraper::Selector::parse("p").unwrap())
            .map(|p| p.text().collect::<String>().trim().to_owned())
            .collect()
    }
}
