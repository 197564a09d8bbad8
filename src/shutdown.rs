//! Cancellation on SIGINT and SIGTERM.
//!
//! A reconciliation pass stops admitting new operations once a signal
//! arrives; in-flight transfers drain before the process exits.

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Wait for SIGINT or SIGTERM, then cancel `token`.
pub async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), finishing in-flight work...");
        }
        _ = terminate => {
            info!("Received SIGTERM, finishing in-flight work...");
        }
    }

    token.cancel();
}
