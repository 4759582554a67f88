//! Firestore REST API client for the Greenlight backend.
//!
//! This crate provides:
//! - A tuned REST client with token caching and retry
//! - JSON <-> Firestore field conversion
//! - The screenplay repository (canonical records per production)

pub mod client;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod screenplay_repo;
pub mod token_cache;
pub mod types;

pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use retry::{with_retry, RetryConfig};
pub use screenplay_repo::ScreenplayRepository;
pub use token_cache::TokenCache;
pub use types::{
    fields_to_json, json_to_fields, json_to_value, value_to_json, Document, FromFirestoreValue,
    ListDocumentsResponse, ToFirestoreValue, Value,
};
