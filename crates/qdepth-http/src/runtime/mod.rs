//! Exporter runtime: configuration, handlers, routing and the serve loop

/// Environment-based exporter configuration.
pub mod config;
/// HTTP request handlers.
pub mod handlers;
/// Route registration.
pub mod router;
/// Listener and serve loop.
pub mod server;
/// Signal-driven graceful shutdown.
pub mod shutdown;

pub use config::{ConfigError, ExporterConfig, ExporterConfigBuilder};
pub use handlers::{ExporterState, ScrapeError, health_check, metrics_endpoint};
pub use router::router;
pub use server::{ServeError, serve, serve_listener};
pub use shutdown::shutdown_signal;
