//! API configuration.

use std::time::Duration;

use greenlight_models::Collection;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second
    pub rate_limit_rps: u32,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max request body size (PDF uploads)
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Production (tenant) id for Firestore paths
    pub production_id: String,
    /// Storage folders holding analysis collections
    pub collection_folders: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            request_timeout: Duration::from_secs(30),
            max_body_size: 25 * 1024 * 1024, // screenplay PDFs
            environment: "development".to_string(),
            production_id: "default".to_string(),
            collection_folders: vec![
                "slate".to_string(),
                "submissions".to_string(),
                "contest".to_string(),
                "library".to_string(),
            ],
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rate_limit_rps),
            request_timeout: Duration::from_secs(
                std::env::var("REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            production_id: std::env::var("PRODUCTION_ID").unwrap_or(defaults.production_id),
            collection_folders: std::env::var("COLLECTION_FOLDERS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.collection_folders),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// Folder list paired with parsed collection labels.
    pub fn folders(&self) -> Vec<(String, Collection)> {
        self.collection_folders
            .iter()
            .map(|f| (f.clone(), Collection::from_label(f)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_folders_parse_to_collections() {
        let config = ApiConfig::default();
        let folders = config.folders();
        assert_eq!(folders.len(), 4);
        assert_eq!(folders[0].1, Collection::Slate);
        assert_eq!(folders[2].1, Collection::Contest);
    }
}
