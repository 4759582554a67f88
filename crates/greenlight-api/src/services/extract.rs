//! Client for the external PDF text-extraction service.
//!
//! Extraction is a black box: PDF bytes in, `{text, page_count,
//! word_count}` out. Layout analysis and OCR live in that service, not
//! here.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{ApiError, ApiResult};

/// Extraction result.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub word_count: u32,
}

/// Text-extraction service client.
pub struct ExtractClient {
    client: Client,
    base_url: String,
}

impl ExtractClient {
    /// Create from the environment (`EXTRACT_SERVICE_URL`).
    pub fn new() -> ApiResult<Self> {
        let base_url = std::env::var("EXTRACT_SERVICE_URL").map_err(|_| {
            ApiError::internal("EXTRACT_SERVICE_URL not configured. Cannot ingest uploads.")
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ApiError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Extract text from one PDF.
    pub async fn extract(&self, filename: &str, pdf: Vec<u8>) -> ApiResult<ExtractedText> {
        let url = format!(
            "{}/extract?filename={}",
            self.base_url,
            urlencoding::encode(filename)
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/pdf")
            .body(pdf)
            .send()
            .await
            .map_err(|e| ApiError::internal(format!("Extraction request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::internal(format!(
                "Extraction service returned {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::internal(format!("Failed to parse extraction response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_extract_parses_service_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/extract"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "text": "FADE IN:",
                "page_count": 98,
                "word_count": 19500
            })))
            .mount(&server)
            .await;

        let client = ExtractClient {
            client: Client::new(),
            base_url: server.uri(),
        };

        let out = client.extract("script.pdf", vec![0x25, 0x50]).await.unwrap();
        assert_eq!(out.text, "FADE IN:");
        assert_eq!(out.page_count, 98);
        assert_eq!(out.word_count, 19500);
    }

}
