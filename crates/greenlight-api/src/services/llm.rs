//! Gemini client for screenplay scoring.
//!
//! Sends extracted screenplay text plus the scoring rubric prompt to the
//! Gemini API and parses the returned analysis JSON. Tries a list of models
//! in order, stripping markdown code fences before parsing. Failures are
//! classified by HTTP status (auth / rate-limit / generic) so the caller
//! can surface distinct messages; the normalizer never sees a failed call.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use greenlight_models::RawAnalysis;

use crate::error::{ApiError, ApiResult};

/// Default Gemini endpoint; overridable for tests.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Models tried in order until one succeeds.
const MODELS: &[&str] = &["gemini-2.5-pro", "gemini-2.5-flash", "gemini-2.5-flash-lite"];

/// Gemini API client for screenplay scoring.
pub struct ScriptScorer {
    api_key: String,
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

impl ScriptScorer {
    /// Create a new scorer from the environment.
    pub fn new() -> ApiResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            ApiError::internal("GEMINI_API_KEY not configured. Cannot score screenplays.")
        })?;

        Ok(Self {
            api_key,
            client: Client::new(),
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        })
    }

    /// Score one screenplay's extracted text.
    pub async fn score_screenplay(
        &self,
        filename: &str,
        text: &str,
        page_count: u32,
        word_count: u32,
    ) -> ApiResult<RawAnalysis> {
        let prompt = build_scoring_prompt(filename, text, page_count, word_count);

        let mut last_error = None;

        for model in MODELS {
            info!("Scoring {} with model {}", filename, model);
            match self.call_api(model, &prompt).await {
                Ok(raw) => {
                    info!("Scored {} with {}", filename, model);
                    return Ok(raw.with_source_file(filename));
                }
                // Bad credentials won't get better on another model
                Err(e @ ApiError::UpstreamAuth) => return Err(e),
                Err(e) => {
                    warn!("Model {} failed: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ApiError::Upstream("All scoring models failed".to_string())))
    }

    async fn call_api(&self, model: &str, prompt: &str) -> ApiResult<RawAnalysis> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Upstream(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_upstream_status(
                status,
                format!("Gemini returned {}: {}", status, body),
            ));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Upstream(format!("Failed to parse response envelope: {}", e)))?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| ApiError::Upstream("No content in response".to_string()))?;

        let json = strip_code_fences(text);
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| ApiError::Upstream(format!("Failed to parse analysis JSON: {}", e)))?;

        RawAnalysis::from_value(value)
            .map_err(|e| ApiError::Upstream(format!("Analysis JSON has unexpected shape: {}", e)))
    }
}

/// Strip a surrounding markdown code fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

/// Assemble the scoring prompt: the rubric (from `SCORING_PROMPT`, falling
/// back to the built-in output-contract instructions) plus the screenplay.
pub fn build_scoring_prompt(filename: &str, text: &str, page_count: u32, word_count: u32) -> String {
    let rubric = std::env::var("SCORING_PROMPT").unwrap_or_else(|_| fallback_rubric_prompt());

    format!(
        "{rubric}\n\n\
         SCREENPLAY FILE: {filename}\n\
         PAGES: {page_count}\n\
         WORDS: {word_count}\n\n\
         SCREENPLAY TEXT:\n{text}",
    )
}

/// Minimal rubric instructions used when no admin prompt is configured.
/// The output contract matters more than the prose: the response must be a
/// single v6 analysis document.
fn fallback_rubric_prompt() -> String {
    r#"You are a senior script analyst. Score the screenplay below against the four-pillar rubric (execution_craft 40%, character_system 30%, conceptual_strength 20%, voice_and_tone 10%), with 1-10 sub-dimension scores and page citations for each claim. Run the false-positive trap checks and list critical failures with severities.

IMPORTANT: You must strictly follow this output format.
Return ONLY a single JSON object with this schema:
{
  "analysis_version": "v6_core_lenses",
  "metadata": {"filename": "FILE", "page_count": 0, "word_count": 0},
  "analysis": {
    "title": "Title",
    "author": "Author if known",
    "genre": "Genre",
    "subgenres": [], "themes": [], "logline": "One sentence", "tone": "Tone",
    "core_quality": {
      "execution_craft": {"weight": 0.40, "sub_dimensions": {"structure": {"score": 0, "page_citations": []}, "scene_writing": {"score": 0, "page_citations": []}, "dialogue": {"score": 0, "page_citations": []}}},
      "character_system": {"weight": 0.30, "sub_dimensions": {"protagonist": {"score": 0, "page_citations": []}, "supporting_cast": {"score": 0, "page_citations": []}, "relationships": {"score": 0, "page_citations": []}}},
      "conceptual_strength": {"weight": 0.20, "sub_dimensions": {"premise": {"score": 0, "page_citations": []}, "theme": {"score": 0, "page_citations": []}}},
      "voice_and_tone": {"weight": 0.10, "score": 0},
      "false_positive_check": {"traps": []},
      "critical_failures": [],
      "major_weaknesses": [],
      "verdict": "pass"
    },
    "lenses": {"production": {"budget_tier": "unknown"}}
  }
}"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn test_prompt_carries_file_metadata() {
        let prompt = build_scoring_prompt("script.pdf", "FADE IN:", 98, 19500);
        assert!(prompt.contains("script.pdf"));
        assert!(prompt.contains("PAGES: 98"));
        assert!(prompt.contains("FADE IN:"));
    }
}
