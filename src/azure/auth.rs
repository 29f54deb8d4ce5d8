//! Bearer token acquisition for Resource Manager requests.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::CredentialSource;

use super::{AzureBackendError, HTTP_CLIENT};

const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(300);
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Supplies bearer tokens, caching client-credential tokens until shortly
/// before they expire.
pub(super) struct TokenSource {
    source: CredentialSource,
    token_url: String,
    scope: String,
    cache: Mutex<Option<CachedToken>>,
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TokenSource")
            .field("source", &self.source)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl TokenSource {
    pub(super) fn new(
        source: CredentialSource,
        authority_host: &str,
        resource_manager_endpoint: &str,
    ) -> Self {
        let token_url = match &source {
            CredentialSource::ServicePrincipal { tenant_id, .. } => format!(
                "{}/{tenant_id}/oauth2/v2.0/token",
                authority_host.trim_end_matches('/')
            ),
            CredentialSource::AccessToken(_) => String::new(),
        };
        Self {
            source,
            token_url,
            scope: format!("{}/.default", resource_manager_endpoint.trim_end_matches('/')),
            cache: Mutex::new(None),
        }
    }

    /// Returns a token valid for at least the refresh margin.
    pub(super) async fn bearer(&self) -> Result<String, AzureBackendError> {
        let (client_id, client_secret) = match &self.source {
            CredentialSource::AccessToken(token) => return Ok(token.clone()),
            CredentialSource::ServicePrincipal {
                client_id,
                client_secret,
                ..
            } => (client_id, client_secret),
        };

        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref()
            && Instant::now() < cached.refresh_at
        {
            return Ok(cached.value.clone());
        }

        let fresh = self.request_token(client_id, client_secret).await?;
        let value = fresh.value.clone();
        *cache = Some(fresh);
        Ok(value)
    }

    async fn request_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<CachedToken, AzureBackendError> {
        debug!(url = %self.token_url, "requesting access token");
        let response = HTTP_CLIENT
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let detail: TokenErrorResponse = serde_json::from_str(&body).unwrap_or_default();
            return Err(AzureBackendError::Authentication {
                message: format!(
                    "token request returned {status}: {} {}",
                    detail.error, detail.error_description
                )
                .trim_end()
                .to_owned(),
            });
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|err| AzureBackendError::Decode {
                message: err.to_string(),
            })?;
        let lifetime =
            Duration::from_secs(token.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS));
        Ok(CachedToken {
            value: token.access_token,
            refresh_at: Instant::now() + lifetime.saturating_sub(TOKEN_REFRESH_MARGIN),
        })
    }
}
