//! Tells a user who cannot log in how their password can be reset.
//!
//! Ledgerly does not send email, so a password is reset by whoever runs the
//! server, using the `reset_password` program against the database file.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

use crate::{
    endpoints,
    html::{LINK_STYLE, base, log_in_register},
};

const CODE_STYLE: &str = "block p-3 rounded bg-gray-100 dark:bg-gray-900 \
    font-mono text-sm whitespace-pre-wrap break-all";

fn reset_instructions() -> Markup {
    html! {
        div class="space-y-4 text-gray-700 dark:text-gray-300"
        {
            p {
                "Ask the person who runs this Ledgerly server to reset it for you. \
                From the directory the server runs in, they can run:"
            }

            code class=(CODE_STYLE)
            {
                "reset_password --db-path <database file> --username <your username>"
            }

            p {
                "It asks for a new password twice, then you can log in with it."
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Remembered it? "
                a href=(endpoints::LOG_IN_VIEW) class=(LINK_STYLE) { "Back to log in" }
            }
        }
    }
}

/// Display the page explaining how to reset a forgotten password.
pub async fn get_forgot_password_page() -> Response {
    let content = log_in_register("Forgot your password?", &reset_instructions());

    base("Forgot Password", &[], &content).into_response()
}
