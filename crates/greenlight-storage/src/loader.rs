//! Collection loading: manifests, fan-out, and per-file isolation.
//!
//! Each storage folder carries an `index.json` manifest listing its member
//! analysis files. The loader fetches the manifest, fans out over the
//! listed files, and normalizes each one. Every failure is contained: a
//! bad file is logged and skipped, a missing manifest contributes zero
//! records, and neither aborts the rest of the load.

use futures_util::future::join_all;
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use greenlight_engine::normalize;
use greenlight_engine::{dedup_by_title, ensure_unique_ids};
use greenlight_models::{Collection, RawAnalysis, Screenplay};

use crate::client::StorageClient;
use crate::error::StorageResult;

/// Per-folder manifest: the list of member analysis filenames.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionIndex {
    #[serde(default)]
    pub files: Vec<String>,
}

/// What happened while loading one folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadReport {
    pub folder: String,
    pub collection: Collection,
    /// Records normalized successfully
    pub loaded: usize,
    /// Files fetched but skipped (parse or normalization failure)
    pub skipped: usize,
    /// Files that could not be fetched at all
    pub failed_fetches: usize,
}

impl StorageClient {
    /// Fetch a folder's manifest. A missing or unreadable manifest is an
    /// error here; `load_collection` degrades it to zero records.
    pub async fn fetch_index(&self, folder: &str) -> StorageResult<CollectionIndex> {
        self.download_json(&format!("{}/index.json", folder)).await
    }

    /// Fetch and version-dispatch one raw analysis document.
    pub async fn fetch_analysis(&self, folder: &str, filename: &str) -> StorageResult<RawAnalysis> {
        let bytes = self.download_bytes(&format!("{}/{}", folder, filename)).await?;
        Ok(RawAnalysis::from_slice(&bytes)?)
    }

    /// Register a newly uploaded analysis file in its folder manifest.
    /// Read-modify-write; a missing manifest starts a fresh one.
    pub async fn append_to_index(&self, folder: &str, filename: &str) -> StorageResult<()> {
        let mut index = match self.fetch_index(folder).await {
            Ok(index) => index,
            Err(crate::error::StorageError::NotFound(_)) => CollectionIndex::default(),
            Err(e) => return Err(e),
        };

        if !index.files.iter().any(|f| f == filename) {
            index.files.push(filename.to_string());
            self.upload_json(&index, &format!("{}/index.json", folder))
                .await?;
        }
        Ok(())
    }
}

/// Load and normalize one folder.
///
/// File fetches run concurrently; results keep manifest order so the load
/// is deterministic for a given manifest.
pub async fn load_collection(
    client: &StorageClient,
    folder: &str,
    collection: Collection,
) -> (Vec<Screenplay>, LoadReport) {
    let mut report = LoadReport {
        folder: folder.to_string(),
        collection,
        loaded: 0,
        skipped: 0,
        failed_fetches: 0,
    };

    let index = match client.fetch_index(folder).await {
        Ok(index) => index,
        Err(e) => {
            // Folder contributes nothing; the rest of the load continues.
            warn!(folder = folder, "Manifest unavailable, loading zero records: {}", e);
            return (Vec::new(), report);
        }
    };

    let fetches = index
        .files
        .iter()
        .map(|filename| client.fetch_analysis(folder, filename));
    let results = join_all(fetches).await;

    let mut screenplays = Vec::with_capacity(results.len());
    for (filename, result) in index.files.iter().zip(results) {
        match result {
            Ok(raw) => match normalize(&raw, collection) {
                Ok(screenplay) => {
                    screenplays.push(screenplay);
                    report.loaded += 1;
                }
                Err(e) => {
                    warn!(folder = folder, file = %filename, "Skipping record: {}", e);
                    report.skipped += 1;
                }
            },
            Err(e) => {
                warn!(folder = folder, file = %filename, "Fetch failed: {}", e);
                report.failed_fetches += 1;
            }
        }
    }

    counter!("storage_records_loaded_total", "folder" => folder.to_string())
        .increment(report.loaded as u64);

    info!(
        folder = folder,
        loaded = report.loaded,
        skipped = report.skipped,
        failed = report.failed_fetches,
        "Folder load complete"
    );

    (screenplays, report)
}

/// Load every folder, then de-duplicate across collections and make ids
/// unique. Folders load concurrently; output order follows the folder list.
pub async fn load_all(
    client: &StorageClient,
    folders: &[(String, Collection)],
) -> (Vec<Screenplay>, Vec<LoadReport>) {
    let loads = folders
        .iter()
        .map(|(folder, collection)| load_collection(client, folder, *collection));
    let outcomes = join_all(loads).await;

    let mut screenplays = Vec::new();
    let mut reports = Vec::with_capacity(outcomes.len());
    for (folder_screenplays, report) in outcomes {
        screenplays.extend(folder_screenplays);
        reports.push(report);
    }

    let mut screenplays = dedup_by_title(screenplays);
    ensure_unique_ids(&mut screenplays);

    (screenplays, reports)
}
