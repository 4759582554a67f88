//! Screenplay repository: canonical records in Firestore.
//!
//! Documents live under `productions/{production_id}/screenplays/{id}`.
//! Records are stored whole via the JSON field conversion; Firestore is the
//! system of record for normalized screenplays, while the raw analysis
//! files stay in object storage.

use chrono::Utc;
use tracing::{info, warn};

use greenlight_models::Screenplay;

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{fields_to_json, json_to_fields, ToFirestoreValue};

/// Repository for screenplay documents.
pub struct ScreenplayRepository {
    client: FirestoreClient,
    production_id: String,
}

impl ScreenplayRepository {
    /// Create a new screenplay repository.
    pub fn new(client: FirestoreClient, production_id: impl Into<String>) -> Self {
        Self {
            client,
            production_id: production_id.into(),
        }
    }

    /// Collection path for this production's screenplays.
    fn collection(&self) -> String {
        format!("productions/{}/screenplays", self.production_id)
    }

    /// Get one screenplay by id.
    pub async fn get(&self, id: &str) -> FirestoreResult<Option<Screenplay>> {
        let doc = self.client.get_document(&self.collection(), id).await?;

        match doc {
            Some(d) => {
                let fields = d.fields.unwrap_or_default();
                let screenplay = serde_json::from_value(fields_to_json(&fields))
                    .map_err(|e| {
                        FirestoreError::SerializationError(format!(
                            "Failed to decode screenplay {}: {}",
                            id, e
                        ))
                    })?;
                Ok(Some(screenplay))
            }
            None => Ok(None),
        }
    }

    /// Create or update a screenplay (upsert).
    pub async fn upsert(&self, screenplay: &Screenplay) -> FirestoreResult<()> {
        let mut fields = json_to_fields(&serde_json::to_value(screenplay)?);
        fields.insert("updated_at".to_string(), Utc::now().to_firestore_value());

        // Try update first, create if the document doesn't exist yet.
        match self
            .client
            .update_document(&self.collection(), &screenplay.id, fields.clone(), None)
            .await
        {
            Ok(_) => {
                info!("Updated screenplay {}", screenplay.id);
                Ok(())
            }
            Err(FirestoreError::NotFound(_)) => {
                self.client
                    .create_document(&self.collection(), &screenplay.id, fields)
                    .await?;
                info!("Created screenplay {}", screenplay.id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Store a whole normalized set, one document per record.
    ///
    /// Individual write failures are logged and skipped; the rest of the
    /// batch proceeds. Returns the number of records written.
    pub async fn upsert_all(&self, screenplays: &[Screenplay]) -> FirestoreResult<usize> {
        let mut written = 0;
        for screenplay in screenplays {
            match self.upsert(screenplay).await {
                Ok(()) => written += 1,
                Err(e) => {
                    warn!(id = %screenplay.id, "Failed to persist screenplay: {}", e);
                }
            }
        }
        Ok(written)
    }

    /// List every screenplay in this production.
    ///
    /// Undecodable documents are logged and skipped rather than failing the
    /// whole listing.
    pub async fn list_all(&self) -> FirestoreResult<Vec<Screenplay>> {
        let collection = self.collection();
        let mut out = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .client
                .list_documents(&collection, Some(100), page_token.as_deref())
                .await?;

            for doc in page.documents.unwrap_or_default() {
                let id = doc.doc_id().unwrap_or("<unknown>").to_string();
                let fields = doc.fields.unwrap_or_default();
                match serde_json::from_value::<Screenplay>(fields_to_json(&fields)) {
                    Ok(screenplay) => out.push(screenplay),
                    Err(e) => {
                        warn!(id = %id, "Skipping undecodable screenplay document: {}", e);
                    }
                }
            }

            page_token = page.next_page_token.filter(|t| !t.is_empty());
            if page_token.is_none() {
                break;
            }
        }

        Ok(out)
    }

    /// Delete one screenplay by id.
    pub async fn delete(&self, id: &str) -> FirestoreResult<()> {
        self.client.delete_document(&self.collection(), id).await
    }
}
