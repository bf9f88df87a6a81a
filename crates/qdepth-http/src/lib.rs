//! # qdepth HTTP Runtime
//!
//! Serves the queue-length gauge over HTTP. Each scrape polls the broker once,
//! bounded by the scrape timeout, and renders the result in the Prometheus
//! text format.
//!
//! ## Endpoints
//!
//! - `GET /metrics` and `GET /`: queue depths, one sample per queue
//! - `GET /health`: liveness probe that does not contact the broker

pub mod runtime;

pub use runtime::*;
