//! Full-page error responses: the 404 page for unknown routes and missing
//! rows, and the 500 page that HTMX requests are redirected to.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{endpoints, html::error_view};

/// An error page with a short description of the problem and what to do about it.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorPage<'a> {
    status: StatusCode,
    description: &'a str,
    fix: &'a str,
}

impl ErrorPage<'static> {
    /// The page for a route or resource that does not exist or is not the user's.
    pub const NOT_FOUND: ErrorPage<'static> = ErrorPage {
        status: StatusCode::NOT_FOUND,
        description: "Page not found.",
        fix: "Sorry, we can't find that page. Head back to the dashboard to find your way.",
    };

    /// The page for errors that are not meant to be shown to the user.
    pub const INTERNAL: ErrorPage<'static> = ErrorPage {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        description: "Sorry, something went wrong.",
        fix: "Try again later or check the server logs",
    };
}

impl<'a> ErrorPage<'a> {
    /// A 500 page that explains a problem with the server's configuration.
    pub fn internal(description: &'a str, fix: &'a str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            description,
            fix,
        }
    }
}

impl IntoResponse for ErrorPage<'_> {
    fn into_response(self) -> Response {
        let title = self.status.canonical_reason().unwrap_or("Error");
        let page = error_view(title, self.status.as_str(), self.description, self.fix);

        (self.status, Html(page.into_string())).into_response()
    }
}

/// The fallback route handler.
pub async fn get_404_not_found() -> Response {
    ErrorPage::NOT_FOUND.into_response()
}

pub async fn get_internal_server_error_page() -> Response {
    ErrorPage::INTERNAL.into_response()
}

/// Send an HTMX client to the 500 page.
///
/// **Note**: only HTMX requests follow `HX-Redirect`. Handlers for full page
/// loads should return an [ErrorPage] instead.
pub fn get_internal_server_error_redirect() -> Response {
    (
        HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
        .into_response()
}
