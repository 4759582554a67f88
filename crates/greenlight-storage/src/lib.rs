//! Firebase Storage (GCS) client for the Greenlight backend.
//!
//! This crate provides:
//! - Object download/upload over the GCS JSON API
//! - Collection manifests (`index.json`) and the fan-out loader
//! - Per-file error isolation with load reports

pub mod auth;
pub mod client;
pub mod error;
pub mod loader;

pub use auth::StorageAuth;
pub use client::{StorageClient, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use loader::{load_all, load_collection, CollectionIndex, LoadReport};
