//! The sign-up page and the endpoint that creates a new user account.

use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::{
        NewUser, PasswordHash, SessionState, Username, ValidatedPassword, create_user,
        set_auth_cookie,
    },
    currency::Currency,
    endpoints,
    error_page::get_internal_server_error_redirect,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, base,
        loading_spinner, log_in_register, password_input,
    },
};

/// The minimum number of characters the password should have to be considered valid on the
/// client side (server-side validation is done on top of this validation).
const PASSWORD_INPUT_MIN_LENGTH: u8 = 14;

/// The raw data entered by the user in the sign-up form.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    /// The ISO 4217 code of the chosen display currency.
    #[serde(default)]
    pub currency: String,
}

/// A field of the sign-up form that can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Username,
    Password,
    ConfirmPassword,
    Currency,
}

/// The message to show next to the first rejected field of the sign-up form.
#[derive(Debug, PartialEq)]
struct FieldError {
    field: Field,
    message: String,
}

impl FieldError {
    fn new(field: Field, message: impl ToString) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }

    fn message_for(error: Option<&Self>, field: Field) -> Option<&str> {
        error
            .filter(|error| error.field == field)
            .map(|error| error.message.as_str())
    }
}

/// The checked values of a sign-up form, before the password is hashed.
struct Registration {
    username: Username,
    email: Option<String>,
    password: ValidatedPassword,
    currency: Currency,
}

/// Check the sign-up form field by field, stopping at the first problem.
///
/// The password may not contain the username or email address.
fn validate_registration(form: &RegisterForm) -> Result<Registration, FieldError> {
    let username =
        Username::new(&form.username).map_err(|error| FieldError::new(Field::Username, error))?;

    let currency = form
        .currency
        .parse::<Currency>()
        .map_err(|error| FieldError::new(Field::Currency, error))?;

    let email = form.email.trim();
    let password = ValidatedPassword::new(&form.password, &[username.as_ref(), email])
        .map_err(|error| FieldError::new(Field::Password, error))?;

    if form.password != form.confirm_password {
        return Err(FieldError::new(
            Field::ConfirmPassword,
            "Passwords do not match",
        ));
    }

    Ok(Registration {
        username,
        email: Some(email.to_owned()),
        password,
        currency,
    })
}

fn field_error(error_message: Option<&str>) -> Markup {
    html! {
        @if let Some(error_message) = error_message
        {
            p class="text-red-500 text-base" { (error_message) }
        }
    }
}

fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm-password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()]
            ;

            (field_error(error_message))
        }
    }
}

fn currency_select(selected: &str, error_message: Option<&str>) -> Markup {
    let selected = selected.parse::<Currency>().unwrap_or_default();

    html! {
        div
        {
            label for="currency" class=(FORM_LABEL_STYLE) { "Currency" }

            select id="currency" name="currency" class=(FORM_TEXT_INPUT_STYLE)
            {
                @for currency in Currency::ALL {
                    option value=(currency.code()) selected[currency == selected]
                    {
                        (currency.label())
                    }
                }
            }

            (field_error(error_message))
        }
    }
}

fn registration_form(values: &RegisterForm, error: Option<&FieldError>) -> Markup {
    let username_error = FieldError::message_for(error, Field::Username);

    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            div
            {
                label for="username" class=(FORM_LABEL_STYLE) { "Username" }

                input
                    type="text"
                    name="username"
                    id="username"
                    autocomplete="username"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    autofocus[username_error.is_some()]
                    value=(values.username);

                (field_error(username_error))
            }

            div
            {
                label for="email" class=(FORM_LABEL_STYLE) { "Email (optional)" }

                input
                    type="email"
                    name="email"
                    id="email"
                    autocomplete="email"
                    class=(FORM_TEXT_INPUT_STYLE)
                    value=(values.email);
            }

            (password_input(
                "",
                PASSWORD_INPUT_MIN_LENGTH,
                FieldError::message_for(error, Field::Password),
            ))
            (confirm_password_input(
                PASSWORD_INPUT_MIN_LENGTH,
                FieldError::message_for(error, Field::ConfirmPassword),
            ))
            (currency_select(
                &values.currency,
                FieldError::message_for(error, Field::Currency),
            ))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Sign up"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a href=(endpoints::LOG_IN_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the sign-up page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form(&RegisterForm::default(), None);
    let content = log_in_register("Create an account", &registration_form);
    base("Sign Up", &[], &content).into_response()
}

/// Create a user from the sign-up form, log them in and send them to the dashboard.
///
/// Invalid input re-renders the form with the problem next to the offending field.
pub async fn register_user(
    State(state): State<SessionState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let registration = match validate_registration(&user_data) {
        Ok(registration) => registration,
        Err(error) => return registration_form(&user_data, Some(&error)).into_response(),
    };

    let password_hash = match PasswordHash::new(registration.password, PasswordHash::DEFAULT_COST)
    {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");

            return get_internal_server_error_redirect();
        }
    };

    let local_offset = match state.local_offset() {
        Ok(offset) => offset,
        Err(error) => return error.into_response(),
    };

    let new_user = NewUser {
        username: registration.username,
        email: registration.email,
        password_hash,
        currency: registration.currency,
    };

    let created = match state.db_connection.lock() {
        Ok(connection) => create_user(new_user, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    let user = match created {
        Ok(user) => user,
        Err(Error::DuplicateUsername) => {
            let error = FieldError::new(Field::Username, Error::DuplicateUsername);
            return registration_form(&user_data, Some(&error)).into_response();
        }
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");
            return get_internal_server_error_redirect();
        }
    };

    tracing::info!("Created user {} ({})", user.id, user.username);

    match set_auth_cookie(jar, user.id, state.cookie_duration, local_offset) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");

            get_internal_server_error_redirect()
        }
    }
}

#[cfg(test)]
mod get_register_page_tests {
    use axum::http::StatusCode;
    use scraper::Selector;

    use crate::{
        auth::get_register_page,
        endpoints,
        test_utils::{
            assert_form_input, assert_form_select, assert_form_submit_button, assert_hx_endpoint,
            assert_valid_html, must_get_form, parse_html_document,
        },
    };

    #[tokio::test]
    async fn render_register_page() {
        let response = get_register_page().await;
        assert_eq!(response.status(), StatusCode::OK);

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::USERS, "hx-post");
        assert_form_input(&form, "username", "text");
        assert_form_input(&form, "password", "password");
        assert_form_input(&form, "confirm_password", "password");
        assert_form_select(&form, "currency", "GBP");
        assert_form_submit_button(&form);

        let email = form
            .select(&Selector::parse("input[name=email]").unwrap())
            .next()
            .expect("want an email input");
        assert_eq!(email.value().attr("type"), Some("email"));
        assert!(email.value().attr("required").is_none());

        let log_in_link = form
            .select(&Selector::parse("a[href]").unwrap())
            .next()
            .expect("want a log-in link");
        assert_eq!(log_in_link.value().attr("href"), Some(endpoints::LOG_IN_VIEW));
    }
}
