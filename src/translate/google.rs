//! Google Cloud Translation (v2) batch client.

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::TranslateConfig;
use crate::error::{Result, TransfeedError};
use crate::translate::credentials::{Credentials, ServiceAccount};
use crate::translate::{LanguageTag, Translator};

/// OAuth2 scope for the translation API.
const TRANSLATION_SCOPE: &str = "https://www.googleapis.com/auth/cloud-translation";

/// Grant type for signed service account assertions.
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for service account assertions.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Access tokens are refreshed this long before they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Error bodies are truncated to this many characters in diagnostics.
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a [String],
    target: &'a str,
    format: &'static str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Deserialize)]
struct TranslateData {
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

enum Auth {
    ApiKey(String),
    ServiceAccount {
        account: ServiceAccount,
        token: Mutex<Option<CachedToken>>,
    },
}

/// Translation backend speaking the Cloud Translation v2 REST API.
pub struct GoogleTranslator {
    client: Client,
    endpoint: String,
    auth: Auth,
}

impl GoogleTranslator {
    /// Create a translator with a shared HTTP client bounded by
    /// `translate.timeout_secs`.
    pub fn new(config: &TranslateConfig, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransfeedError::Config(format!("failed to create HTTP client: {}", e)))?;

        let auth = match credentials {
            Credentials::ApiKey(key) => Auth::ApiKey(key),
            Credentials::ServiceAccount(account) => Auth::ServiceAccount {
                account,
                token: Mutex::new(None),
            },
        };

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            auth,
        })
    }

    /// Return a valid access token, exchanging a fresh assertion when the
    /// cached one is missing or about to expire.
    async fn access_token(
        &self,
        account: &ServiceAccount,
        cache: &Mutex<Option<CachedToken>>,
    ) -> Result<String> {
        let mut cached = cache.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() + TOKEN_REFRESH_MARGIN < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let now = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &account.client_email,
            scope: TRANSLATION_SCOPE,
            aud: &account.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &account.signing_key)
            .map_err(|e| TransfeedError::Translation(format!("failed to sign assertion: {}", e)))?;

        let response = self
            .client
            .post(&account.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| TransfeedError::Translation(format!("token request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(TransfeedError::Translation(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| TransfeedError::Translation(format!("malformed token response: {}", e)))?;

        tracing::debug!(expires_in = token.expires_in, "Obtained translation access token");

        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(value)
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate_batch(&self, texts: &[String], target: &LanguageTag) -> Result<Vec<String>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = TranslateRequest {
            q: texts,
            target: target.as_str(),
            format: "text",
        };
        let request = self.client.post(&self.endpoint).json(&body);
        let request = match &self.auth {
            Auth::ApiKey(key) => request.query(&[("key", key.as_str())]),
            Auth::ServiceAccount { account, token } => {
                request.bearer_auth(self.access_token(account, token).await?)
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| TransfeedError::Translation(format!("translate request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            return Err(TransfeedError::Translation(format!(
                "backend returned {}: {}",
                status, detail
            )));
        }

        let parsed: TranslateResponse = response.json().await.map_err(|e| {
            TransfeedError::Translation(format!("malformed translate response: {}", e))
        })?;

        let translations: Vec<String> = parsed
            .data
            .translations
            .into_iter()
            .map(|t| t.translated_text)
            .collect();

        if translations.len() != texts.len() {
            return Err(TransfeedError::Translation(format!(
                "backend returned {} translations for {} inputs",
                translations.len(),
                texts.len()
            )));
        }

        Ok(translations)
    }
}
