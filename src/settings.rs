//! The currency settings page and the endpoint that saves the user's choice.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::{CurrentUser, update_user_currency},
    currency::Currency,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
};

/// The state needed for saving the currency setting.
#[derive(Debug, Clone)]
pub struct SettingsState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SettingsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The currency settings form.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyForm {
    /// An ISO 4217 code, e.g. "GBP".
    pub currency: String,
}

/// Render the page where users pick their display currency.
pub async fn get_currency_settings_page(Extension(user): Extension<CurrentUser>) -> Response {
    let selected = user.currency.parse::<Currency>().unwrap_or_default();

    currency_settings_view(selected).into_response()
}

/// Save the user's display currency.
pub async fn update_currency_endpoint(
    State(state): State<SettingsState>,
    Extension(user): Extension<CurrentUser>,
    Form(form): Form<CurrencyForm>,
) -> Response {
    let currency = match form.currency.parse::<Currency>() {
        Ok(currency) => currency,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_user_currency(user.id, currency, &connection) {
        Ok(()) => Alert::Success {
            message: "Currency updated".to_owned(),
            details: format!("Amounts are now shown in {}.", currency.label()),
        }
        .into_response(),
        Err(error) => {
            tracing::error!("could not update currency for user {}: {error}", user.id);
            error.into_alert_response()
        }
    }
}

fn currency_settings_view(selected: Currency) -> Markup {
    let nav_bar = NavBar::new(endpoints::CURRENCY_SETTINGS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="mb-4 text-xl font-bold" { "Settings" }

            form
                hx-put=(endpoints::CURRENCY_SETTINGS_API)
                hx-target-error="#alert-container"
                hx-swap="none"
                class="w-full space-y-4 md:space-y-6"
            {
                div
                {
                    label for="currency" class=(FORM_LABEL_STYLE) { "Display currency" }

                    select id="currency" name="currency" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for currency in Currency::ALL {
                            option value=(currency.code()) selected[currency == selected]
                            {
                                (currency.label())
                            }
                        }
                    }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
            }
        }
    };

    base("Settings", &[], &content)
}

#[cfg(test)]
mod settings_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Form, extract::State, http::StatusCode};

    use crate::{
        auth::{CurrentUser, get_user_by_id},
        endpoints,
        test_utils::{
            assert_form_select, assert_hx_endpoint, assert_status_ok, assert_valid_html,
            get_test_connection, insert_test_user, must_get_form, parse_html_document,
            test_current_user,
        },
    };

    use super::{CurrencyForm, SettingsState, get_currency_settings_page, update_currency_endpoint};

    fn get_state() -> (SettingsState, CurrentUser) {
        let connection = get_test_connection();
        let user = test_current_user(insert_test_user(&connection, "ada"));

        (
            SettingsState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user,
        )
    }

    #[tokio::test]
    async fn page_selects_current_currency() {
        let (_, mut user) = get_state();
        user.currency = "KES".to_owned();

        let response = get_currency_settings_page(Extension(user)).await;

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::CURRENCY_SETTINGS_API, "hx-put");
        assert_form_select(&form, "currency", "KES");
    }

    #[tokio::test]
    async fn saves_chosen_currency() {
        let (state, user) = get_state();

        let response = update_currency_endpoint(
            State(state.clone()),
            Extension(user.clone()),
            Form(CurrencyForm {
                currency: "usd".to_owned(),
            }),
        )
        .await;

        assert_status_ok(&response);
        let saved = get_user_by_id(user.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(saved.currency, "USD");
    }

    #[tokio::test]
    async fn rejects_unknown_currency() {
        let (state, user) = get_state();

        let response = update_currency_endpoint(
            State(state.clone()),
            Extension(user.clone()),
            Form(CurrencyForm {
                currency: "DOGE".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let saved = get_user_by_id(user.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(saved.currency, "GBP");
    }
}
