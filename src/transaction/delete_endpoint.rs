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
    transaction::{TransactionId, delete_transaction},
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Delete one of the current user's transactions and answer with an alert.
///
/// HTMX only swaps out the table row on a 200 OK, so success must not use 204.
pub async fn delete_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<DeleteTransactionState>,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    let deleted = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
        .and_then(|connection| delete_transaction(user.id, transaction_id, &connection));

    match deleted {
        Ok(()) => Alert::SuccessSimple {
            message: "Transaction deleted".to_owned(),
        }
        .into_response(),
        Err(error) => {
            if error == Error::DeleteMissingTransaction {
                tracing::debug!("user {} has no transaction {transaction_id}", user.id);
            } else {
                tracing::error!("could not delete transaction {transaction_id}: {error}");
            }

            error.into_alert_response()
        }
    }
}
