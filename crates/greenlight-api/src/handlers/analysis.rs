//! Upload and analysis-status handlers.
//!
//! `POST /api/analyze` accepts a screenplay PDF, enqueues it for the
//! sequential ingest pipeline, and returns a job id. Progress is polled
//! via `GET /api/analyze/:job_id/status`.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::services::IngestJob;
use crate::state::AppState;

/// Response from starting an analysis.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Job id for status polling
    pub job_id: String,
}

/// Accept one screenplay PDF upload.
pub async fn upload_screenplay(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|f| f.to_string())
            .ok_or_else(|| ApiError::bad_request("Upload is missing a filename"))?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;

        upload = Some((filename, bytes.to_vec()));
        break;
    }

    let (filename, pdf) = upload
        .ok_or_else(|| ApiError::bad_request("Multipart body must contain a 'file' field"))?;

    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(ApiError::bad_request("Only PDF uploads are accepted"));
    }
    if pdf.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }

    let job_id = state.ingest.enqueue(filename.clone(), pdf).await?;
    info!(job = %job_id, file = %filename, "Upload queued for analysis");

    Ok(Json(UploadResponse { job_id }))
}

/// Poll one ingest job.
pub async fn get_ingest_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<IngestJob>> {
    state
        .ingest
        .status(&job_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Ingest job {} not found", job_id)))
}
