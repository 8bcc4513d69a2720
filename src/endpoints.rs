//! The paths of every page and API route served by the app.
//!
//! Paths with a parameter such as `{category_id}` are turned into concrete
//! URLs with [format_endpoint].

// Pages
pub const ROOT: &str = "/";
/// KPIs and charts for a date range.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The filterable list of transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
pub const NEW_TRANSACTION_VIEW: &str = "/transactions/new";
pub const EDIT_TRANSACTION_VIEW: &str = "/transactions/{transaction_id}/edit";
pub const CATEGORIES_VIEW: &str = "/categories";
pub const NEW_CATEGORY_VIEW: &str = "/categories/new";
pub const EDIT_CATEGORY_VIEW: &str = "/categories/{category_id}/edit";
/// The Profit & Loss report.
pub const REPORT_VIEW: &str = "/reports/pl";
/// The Profit & Loss report as a CSV download.
pub const REPORT_CSV: &str = "/reports/pl/export.csv";
pub const CURRENCY_SETTINGS_VIEW: &str = "/settings/currency";
pub const REGISTER_VIEW: &str = "/register";
pub const LOG_IN_VIEW: &str = "/log_in";
/// Explains how to reset a forgotten password.
pub const FORGOT_PASSWORD_VIEW: &str = "/forgot_password";
pub const INTERNAL_ERROR_VIEW: &str = "/error";
pub const STATIC: &str = "/static";

// API routes called by HTMX
pub const LOG_IN_API: &str = "/api/log_in";
pub const LOG_OUT: &str = "/api/log_out";
pub const USERS: &str = "/api/users";
pub const CATEGORIES_API: &str = "/api/categories";
/// PUT updates and DELETE removes a category.
pub const CATEGORY: &str = "/api/categories/{category_id}";
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// PUT updates and DELETE removes a transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
pub const CURRENCY_SETTINGS_API: &str = "/api/settings/currency";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter starts with a left brace and ends with the next right brace,
/// e.g. '{category_id}' in '/api/categories/{category_id}'. Only the first
/// parameter is replaced.
///
/// If no parameter is found in `endpoint_path`, the original path is returned.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    #[track_caller]
    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::ROOT,
            endpoints::DASHBOARD_VIEW,
            endpoints::TRANSACTIONS_VIEW,
            endpoints::NEW_TRANSACTION_VIEW,
            endpoints::EDIT_TRANSACTION_VIEW,
            endpoints::CATEGORIES_VIEW,
            endpoints::NEW_CATEGORY_VIEW,
            endpoints::EDIT_CATEGORY_VIEW,
            endpoints::REPORT_VIEW,
            endpoints::REPORT_CSV,
            endpoints::CURRENCY_SETTINGS_VIEW,
            endpoints::REGISTER_VIEW,
            endpoints::LOG_IN_VIEW,
            endpoints::INTERNAL_ERROR_VIEW,
            endpoints::FORGOT_PASSWORD_VIEW,
            endpoints::STATIC,
            endpoints::LOG_IN_API,
            endpoints::LOG_OUT,
            endpoints::USERS,
            endpoints::CATEGORIES_API,
            endpoints::CATEGORY,
            endpoints::TRANSACTIONS_API,
            endpoints::TRANSACTION,
            endpoints::CURRENCY_SETTINGS_API,
        ] {
            assert_endpoint_is_valid_uri(endpoint);
        }
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        assert_eq!(format_endpoint("/hello/world", 1), "/hello/world");
    }

    #[test]
    fn parameter_in_middle() {
        assert_eq!(
            format_endpoint(endpoints::EDIT_CATEGORY_VIEW, 42),
            "/categories/42/edit"
        );
    }
}
