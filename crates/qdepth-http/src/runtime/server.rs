//! Listener setup and the serve loop

use std::future::Future;

use tokio::net::TcpListener;
use tracing::info;

use crate::runtime::{
    config::ExporterConfig, handlers::ExporterState, router::router, shutdown::shutdown_signal,
};

/// Serve loop errors
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Bind `config.addr` and serve until SIGINT or SIGTERM
pub async fn serve(config: &ExporterConfig, state: ExporterState) -> Result<(), ServeError> {
    let listener = TcpListener::bind(config.addr.as_str())
        .await
        .map_err(|source| ServeError::Bind {
            addr: config.addr.clone(),
            source,
        })?;

    serve_listener(listener, state, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` completes
pub async fn serve_listener<F>(
    listener: TcpListener,
    state: ExporterState,
    shutdown: F,
) -> Result<(), ServeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local_addr = listener.local_addr()?;
    info!("Listening on {}", local_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server stopped");
    Ok(())
}
