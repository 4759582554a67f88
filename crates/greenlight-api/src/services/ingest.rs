//! Sequential ingest queue for screenplay uploads.
//!
//! Uploads are processed strictly one at a time: the scoring provider is
//! rate limited and a screenplay-length prompt is a long call, so there is
//! nothing to win by batching. The queue is in-process (tokio mpsc with a
//! single consumer); job state is polled via the status endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};
use tracing::{error, info, warn};
use uuid::Uuid;

use greenlight_engine::{dedup_by_title, ensure_unique_ids, normalize};
use greenlight_firestore::{FirestoreClient, ScreenplayRepository};
use greenlight_models::Collection;
use greenlight_storage::StorageClient;

use crate::error::{ApiError, ApiResult};
use crate::metrics::record_ingest_job;
use crate::services::{ExtractClient, ScriptScorer};
use crate::state::Catalog;

/// Queue depth before enqueue starts rejecting.
const QUEUE_CAPACITY: usize = 64;

/// Status of an ingest job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
    /// Waiting in the upload queue
    #[default]
    Queued,
    /// PDF text extraction in progress
    Extracting,
    /// LLM scoring call in progress
    Scoring,
    /// Normalizing and persisting the result
    Normalizing,
    /// Done; the screenplay is in the canonical set
    Completed,
    /// Failed; see `error_message`
    Failed,
}

impl IngestStatus {
    /// Returns true if the status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One ingest job's record.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IngestJob {
    pub id: String,
    pub filename: String,
    pub status: IngestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Set on completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenplay_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything the worker needs, bundled at startup.
pub struct IngestContext {
    pub extractor: Arc<ExtractClient>,
    pub scorer: Arc<ScriptScorer>,
    pub storage: Arc<StorageClient>,
    pub firestore: Arc<FirestoreClient>,
    pub production_id: String,
    pub upload_folder: String,
    pub catalog: Arc<RwLock<Catalog>>,
}

struct QueuedUpload {
    job_id: String,
    filename: String,
    pdf: Vec<u8>,
}

type JobMap = Arc<RwLock<HashMap<String, IngestJob>>>;

/// Handle to the ingest queue.
#[derive(Clone)]
pub struct IngestQueue {
    jobs: JobMap,
    tx: mpsc::Sender<QueuedUpload>,
}

impl IngestQueue {
    /// Start the single-consumer worker and return the queue handle.
    pub fn start(ctx: IngestContext) -> Self {
        let (tx, mut rx) = mpsc::channel::<QueuedUpload>(QUEUE_CAPACITY);
        let jobs: JobMap = Arc::new(RwLock::new(HashMap::new()));

        let worker_jobs = Arc::clone(&jobs);
        tokio::spawn(async move {
            // One upload at a time, in arrival order.
            while let Some(upload) = rx.recv().await {
                process_upload(&ctx, &worker_jobs, upload).await;
            }
        });

        Self { jobs, tx }
    }

    /// Enqueue one uploaded PDF. Returns the job id for polling.
    pub async fn enqueue(&self, filename: String, pdf: Vec<u8>) -> ApiResult<String> {
        let job_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let job = IngestJob {
            id: job_id.clone(),
            filename: filename.clone(),
            status: IngestStatus::Queued,
            error_message: None,
            screenplay_id: None,
            created_at: now,
            updated_at: now,
        };
        self.jobs.write().await.insert(job_id.clone(), job);

        self.tx
            .send(QueuedUpload {
                job_id: job_id.clone(),
                filename,
                pdf,
            })
            .await
            .map_err(|_| ApiError::internal("Upload queue is unavailable"))?;

        Ok(job_id)
    }

    /// Look up one job.
    pub async fn status(&self, job_id: &str) -> Option<IngestJob> {
        self.jobs.read().await.get(job_id).cloned()
    }
}

async fn set_status(
    jobs: &JobMap,
    job_id: &str,
    status: IngestStatus,
    error_message: Option<String>,
    screenplay_id: Option<String>,
) {
    let mut jobs = jobs.write().await;
    if let Some(job) = jobs.get_mut(job_id) {
        job.status = status;
        job.error_message = error_message;
        if screenplay_id.is_some() {
            job.screenplay_id = screenplay_id;
        }
        job.updated_at = Utc::now();
    }
}

async fn process_upload(ctx: &IngestContext, jobs: &JobMap, upload: QueuedUpload) {
    let job_id = upload.job_id.clone();
    info!(job = %job_id, file = %upload.filename, "Processing upload");

    match run_pipeline(ctx, jobs, upload).await {
        Ok(screenplay_id) => {
            set_status(
                jobs,
                &job_id,
                IngestStatus::Completed,
                None,
                Some(screenplay_id),
            )
            .await;
            record_ingest_job("completed");
        }
        Err(e) => {
            error!(job = %job_id, "Ingest failed: {}", e);
            set_status(jobs, &job_id, IngestStatus::Failed, Some(e.to_string()), None).await;
            record_ingest_job("failed");
        }
    }
}

/// The ingest pipeline: extract, score, normalize, persist, publish.
async fn run_pipeline(
    ctx: &IngestContext,
    jobs: &JobMap,
    upload: QueuedUpload,
) -> ApiResult<String> {
    let QueuedUpload {
        job_id,
        filename,
        pdf,
    } = upload;

    // Keep the original around before anything can fail.
    let original_key = format!("{}/originals/{}", ctx.upload_folder, filename);
    if let Err(e) = ctx
        .storage
        .upload_bytes(pdf.clone(), &original_key, "application/pdf")
        .await
    {
        warn!(job = %job_id, "Failed to store original PDF: {}", e);
    }

    set_status(jobs, &job_id, IngestStatus::Extracting, None, None).await;
    let extracted = ctx.extractor.extract(&filename, pdf).await?;

    set_status(jobs, &job_id, IngestStatus::Scoring, None, None).await;
    let raw = ctx
        .scorer
        .score_screenplay(
            &filename,
            &extracted.text,
            extracted.page_count,
            extracted.word_count,
        )
        .await?;

    set_status(jobs, &job_id, IngestStatus::Normalizing, None, None).await;
    let collection = Collection::from_label(&ctx.upload_folder);
    let screenplay = normalize(&raw, collection)
        .map_err(|e| ApiError::bad_request(format!("Analysis could not be normalized: {}", e)))?;

    // Persist the raw analysis next to the rest of the collection and
    // register it in the folder manifest so reloads pick it up.
    let analysis_filename = format!("{}_analysis_v6.json", screenplay.id);
    let raw_json = match &raw {
        greenlight_models::RawAnalysis::V5(v5) => serde_json::to_value(v5)?,
        greenlight_models::RawAnalysis::V6(v6) => serde_json::to_value(v6)?,
    };
    ctx.storage
        .upload_json(
            &raw_json,
            &format!("{}/{}", ctx.upload_folder, analysis_filename),
        )
        .await?;
    ctx.storage
        .append_to_index(&ctx.upload_folder, &analysis_filename)
        .await?;

    // Canonical record to Firestore.
    let repo = ScreenplayRepository::new((*ctx.firestore).clone(), &ctx.production_id);
    repo.upsert(&screenplay).await?;

    // Publish into the in-memory set: rebuild, dedup, replace wholesale.
    let screenplay_id = screenplay.id.clone();
    {
        let mut catalog = ctx.catalog.write().await;
        let mut combined = catalog.screenplays.clone();
        combined.push(screenplay);
        let mut combined = dedup_by_title(combined);
        ensure_unique_ids(&mut combined);
        let reports = catalog.reports.clone();
        catalog.replace(combined, reports);
    }

    info!(job = %job_id, id = %screenplay_id, "Upload ingested");
    Ok(screenplay_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(IngestStatus::Completed.is_terminal());
        assert!(IngestStatus::Failed.is_terminal());
        assert!(!IngestStatus::Queued.is_terminal());
        assert!(!IngestStatus::Scoring.is_terminal());
    }
}
