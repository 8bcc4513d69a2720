//! Stops the server cleanly on Ctrl+C or, on Unix, SIGTERM.

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

/// How long in-flight requests get to finish once shutdown starts.
const GRACE_PERIOD: Duration = Duration::from_secs(1);

/// Wait for the first shutdown signal and return its name.
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
        "ctrl+c"
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
        "terminate"
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        name = ctrl_c => name,
        name = terminate => name,
    }
}

/// Wait for a shutdown signal, then tell the server behind `handle` to stop
/// accepting connections and finish the requests it has.
///
/// Spawn this next to the server with a clone of the server's handle.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let signal = shutdown_signal().await;

    tracing::info!("Received {signal} signal, shutting down.");
    handle.graceful_shutdown(Some(GRACE_PERIOD));
}
