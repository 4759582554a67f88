//! Axum HTTP API server.
//!
//! This crate provides:
//! - Screenplay listing with filter/sort query parameters
//! - PDF upload, sequential LLM scoring, and status polling
//! - CSV export of the filtered view
//! - Rate limiting, security headers, and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{ExtractClient, IngestQueue, ScriptScorer};
pub use state::{AppState, Catalog};
