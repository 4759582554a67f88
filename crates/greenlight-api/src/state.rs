//! Application state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;

use greenlight_firestore::FirestoreClient;
use greenlight_models::Screenplay;
use greenlight_storage::{load_all, LoadReport, StorageClient};

use crate::config::ApiConfig;
use crate::services::{ExtractClient, IngestContext, IngestQueue, ScriptScorer};

/// The in-memory canonical set.
///
/// Replaced wholesale whenever the underlying raw JSON set changes; no
/// record is mutated in place after normalization.
#[derive(Debug, Default)]
pub struct Catalog {
    pub screenplays: Vec<Screenplay>,
    pub reports: Vec<LoadReport>,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl Catalog {
    /// Swap in a freshly loaded set.
    pub fn replace(&mut self, screenplays: Vec<Screenplay>, reports: Vec<LoadReport>) {
        self.screenplays = screenplays;
        self.reports = reports;
        self.loaded_at = Some(Utc::now());
    }

    pub fn total_count(&self) -> usize {
        self.screenplays.len()
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub storage: Arc<StorageClient>,
    pub firestore: Arc<FirestoreClient>,
    pub catalog: Arc<RwLock<Catalog>>,
    pub ingest: IngestQueue,
}

impl AppState {
    /// Create new application state.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let storage = Arc::new(StorageClient::from_env()?);
        let firestore = Arc::new(FirestoreClient::from_env().await?);
        let catalog = Arc::new(RwLock::new(Catalog::default()));

        let upload_folder = config
            .collection_folders
            .iter()
            .find(|f| f.as_str() == "submissions")
            .cloned()
            .unwrap_or_else(|| {
                config
                    .collection_folders
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "submissions".to_string())
            });

        let ingest = IngestQueue::start(IngestContext {
            extractor: Arc::new(ExtractClient::new()?),
            scorer: Arc::new(ScriptScorer::new()?),
            storage: Arc::clone(&storage),
            firestore: Arc::clone(&firestore),
            production_id: config.production_id.clone(),
            upload_folder,
            catalog: Arc::clone(&catalog),
        });

        Ok(Self {
            config,
            storage,
            firestore,
            catalog,
            ingest,
        })
    }

    /// Re-run the storage loader and replace the canonical set wholesale.
    /// Returns the number of records now loaded.
    pub async fn reload_catalog(&self) -> usize {
        let folders = self.config.folders();
        let (screenplays, reports) = load_all(&self.storage, &folders).await;

        let count = screenplays.len();
        let mut catalog = self.catalog.write().await;
        catalog.replace(screenplays, reports);
        info!(records = count, "Canonical set reloaded");
        count
    }
}
