//! Graceful shutdown handling
//!
//! The serve loop stops accepting connections on SIGINT or SIGTERM and lets
//! in-flight scrapes finish.

use tokio::signal;
use tracing::{error, info};

/// Create a future that completes when a shutdown signal is received
///
/// If a handler cannot be installed the error is logged and that signal is
/// never reported.
///
/// # Examples
///
/// ```no_run
/// use qdepth_http::runtime::shutdown_signal;
/// use tokio::net::TcpListener;
/// use axum::Router;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let app = Router::new();
///     let listener = TcpListener::bind("0.0.0.0:8888").await?;
///
///     axum::serve(listener, app)
///         .with_graceful_shutdown(shutdown_signal())
///         .await?;
///
///     Ok(())
/// }
/// ```
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}
