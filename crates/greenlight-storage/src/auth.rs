//! Access-token handling for the GCS JSON API.
//!
//! Same service account as Firestore, scoped to object storage, cached with
//! a refresh margin. Public buckets (and tests against a mock server) run
//! without credentials.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StorageError, StorageResult};

/// Refresh margin: refresh 60 seconds before expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Conservative TTL when expiry is unknown.
const TOKEN_DEFAULT_TTL: Duration = Duration::from_secs(50 * 60);

/// OAuth scope for object read/write.
pub const STORAGE_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_write";

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Token source for storage requests.
pub enum StorageAuth {
    /// Service-account tokens, cached.
    Gcp {
        provider: Arc<dyn TokenProvider>,
        cache: RwLock<Option<CachedToken>>,
    },
    /// No Authorization header (public buckets, mock servers).
    Anonymous,
}

impl StorageAuth {
    /// Load the service account from the environment.
    pub fn from_env() -> StorageResult<Self> {
        let service_account = CustomServiceAccount::from_env().map_err(|e| {
            StorageError::auth_error(format!("Failed to load service account: {}", e))
        })?;

        match service_account {
            Some(sa) => Ok(Self::Gcp {
                provider: Arc::new(sa),
                cache: RwLock::new(None),
            }),
            None => Err(StorageError::auth_error(
                "GOOGLE_APPLICATION_CREDENTIALS not set. \
                 Set it to the path of your service account JSON file.",
            )),
        }
    }

    /// A bearer token for the next request, `None` when anonymous.
    pub async fn bearer(&self) -> StorageResult<Option<String>> {
        match self {
            Self::Anonymous => Ok(None),
            Self::Gcp { provider, cache } => {
                {
                    let cached = cache.read().await;
                    if let Some(token) = cached.as_ref() {
                        if Instant::now() + TOKEN_REFRESH_MARGIN < token.expires_at {
                            return Ok(Some(token.access_token.clone()));
                        }
                    }
                }

                let mut cached = cache.write().await;
                if let Some(token) = cached.as_ref() {
                    if Instant::now() + TOKEN_REFRESH_MARGIN < token.expires_at {
                        return Ok(Some(token.access_token.clone()));
                    }
                }

                let token = provider.token(&[STORAGE_SCOPE]).await.map_err(|e| {
                    StorageError::auth_error(format!("Failed to obtain auth token: {}", e))
                })?;

                let expires_at = {
                    let now = Utc::now();
                    let exp = token.expires_at();
                    if exp > now {
                        match (exp - now).to_std() {
                            Ok(ttl) => Instant::now() + ttl,
                            Err(_) => Instant::now() + TOKEN_DEFAULT_TTL,
                        }
                    } else {
                        Instant::now()
                    }
                };

                let access_token = token.as_str().to_string();
                *cached = Some(CachedToken {
                    access_token: access_token.clone(),
                    expires_at,
                });

                debug!("Refreshed storage auth token");
                Ok(Some(access_token))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_targets_object_storage() {
        assert!(STORAGE_SCOPE.contains("devstorage"));
    }

    #[tokio::test]
    async fn test_anonymous_auth_yields_no_token() {
        let auth = StorageAuth::Anonymous;
        assert_eq!(auth.bearer().await.unwrap(), None);
    }
}
