use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::CurrentUser,
    category::get_categories,
    endpoints::{self, format_endpoint},
    timezone::get_local_today,
    transaction::{
        TransactionId,
        form::{
            FormTarget, TransactionFormData, TransactionFormDefaults, is_form_error,
            save_transaction_form, transaction_form,
        },
    },
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler for updating a transaction, redirects to the transactions view on success.
pub async fn update_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<EditTransactionState>,
    Extension(user): Extension<CurrentUser>,
    Form(form): Form<TransactionFormData>,
) -> Response {
    let today = match get_local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => {
            tracing::error!("Invalid timezone {}", state.local_timezone);
            return error.into_alert_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match save_transaction_form(user.id, Some(transaction_id), form.clone(), today, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) if is_form_error(&error) => {
            tracing::debug!("rejected update to transaction {transaction_id}: {error}");

            let categories = match get_categories(user.id, None, &connection) {
                Ok(categories) => categories,
                Err(error) => return error.into_alert_response(),
            };
            let update_endpoint = format_endpoint(endpoints::TRANSACTION, transaction_id);

            transaction_form(
                FormTarget::Update(&update_endpoint),
                &TransactionFormDefaults::from_form(&form, today),
                &categories,
                &format!("Error: {error}"),
            )
            .into_response()
        }
        Err(Error::UpdateMissingTransaction) => {
            tracing::debug!("Transaction {transaction_id} not found for user {}", user.id);
            Error::UpdateMissingTransaction.into_alert_response()
        }
        Err(error) => {
            tracing::error!("Could not update transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}
