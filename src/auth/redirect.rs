//! The page a logged out user is sent back to once they have logged in.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

/// A same-site path, query string included, that is safe to redirect to.
///
/// Absolute URLs, protocol-relative URLs and the log-in page itself are
/// rejected so the log-in form can be used neither as an open redirect nor to
/// loop back onto itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnPath(String);

impl ReturnPath {
    /// Parse a relative URL taken from a query string or form field.
    pub fn parse(raw_url: &str) -> Option<Self> {
        let uri = raw_url.parse::<Uri>().ok()?;

        if uri.scheme().is_some() || uri.authority().is_some() {
            return None;
        }

        Self::from_uri(&uri)
    }

    /// Where to return to after `request` is turned away by an auth guard.
    ///
    /// Page requests return to themselves. Requests under `/api` are sent by
    /// HTMX, so they return to the page named in `HX-Current-URL`.
    pub fn for_request(request: &Request) -> Option<Self> {
        if request.uri().path().starts_with("/api") {
            Self::from_hx_request(request)
        } else {
            Self::from_uri(request.uri())
        }
    }

    /// The log-in page URL that sends the user back here afterwards.
    pub fn log_in_url(&self) -> String {
        match serde_urlencoded::to_string([("redirect_url", self.as_str())]) {
            Ok(query) => format!("{}?{query}", endpoints::LOG_IN_VIEW),
            Err(error) => {
                tracing::error!("Could not encode redirect URL {}: {error}", self.0);
                endpoints::LOG_IN_VIEW.to_owned()
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_uri(uri: &Uri) -> Option<Self> {
        let path_and_query = uri.path_and_query()?;
        let path = path_and_query.path();
        let is_local = path.starts_with('/') && !path.starts_with("//");

        (is_local && path != endpoints::LOG_IN_VIEW).then(|| Self(path_and_query.to_string()))
    }

    fn from_hx_request(request: &Request) -> Option<Self> {
        let headers = request.headers();
        let is_hx_request = headers
            .get("hx-request")
            .and_then(|header| header.to_str().ok())
            .is_some_and(|header| header.eq_ignore_ascii_case("true"));

        if !is_hx_request {
            tracing::warn!("Missing HX-Request header for /api request.");
            return None;
        }

        let Some(current_url) = headers
            .get("hx-current-url")
            .and_then(|header| header.to_str().ok())
        else {
            tracing::warn!("Missing HX-Current-URL header for /api request.");
            return None;
        };

        // HX-Current-URL is absolute, only the path and query are kept.
        let return_path = current_url
            .parse::<Uri>()
            .ok()
            .and_then(|uri| Self::from_uri(&uri));
        if return_path.is_none() {
            tracing::warn!("Invalid HX-Current-URL header value: {current_url}");
        }

        return_path
    }
}

impl Default for ReturnPath {
    fn default() -> Self {
        Self(endpoints::DASHBOARD_VIEW.to_owned())
    }
}

impl From<ReturnPath> for String {
    fn from(return_path: ReturnPath) -> Self {
        return_path.0
    }
}
