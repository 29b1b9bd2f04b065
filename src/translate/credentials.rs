//! Translation backend credentials.
//!
//! Credentials are resolved once at startup and shared by every request.

use std::fmt;

use jsonwebtoken::EncodingKey;
use serde::Deserialize;

use crate::config::TranslateConfig;
use crate::error::{Result, TransfeedError};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Google service account key file contents.
#[derive(Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// A service account with its signing key already parsed.
#[derive(Clone)]
pub struct ServiceAccount {
    /// Account email, used as the JWT issuer.
    pub client_email: String,
    /// OAuth2 token endpoint.
    pub token_uri: String,
    pub(crate) signing_key: EncodingKey,
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

/// Credentials for the translation backend.
#[derive(Clone)]
pub enum Credentials {
    /// Static API key sent as the `key` query parameter.
    ApiKey(String),
    /// Service account exchanging signed assertions for access tokens.
    ServiceAccount(ServiceAccount),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ApiKey(_) => f.write_str("ApiKey(..)"),
            Credentials::ServiceAccount(account) => {
                f.debug_tuple("ServiceAccount").field(account).finish()
            }
        }
    }
}

impl Credentials {
    /// Resolve credentials from configuration and the environment.
    ///
    /// A configured API key wins; otherwise the service account JSON is read
    /// from the environment variable named by `credentials_env`.
    pub fn resolve(config: &TranslateConfig) -> Result<Self> {
        let blob = std::env::var(&config.credentials_env).ok();
        Self::from_sources(config.api_key.as_deref(), blob.as_deref()).map_err(|e| match e {
            TransfeedError::Config(msg) if blob.is_none() && config.api_key.is_none() => {
                TransfeedError::Config(format!("{} (set {})", msg, config.credentials_env))
            }
            other => other,
        })
    }

    /// Build credentials from an optional API key and an optional service
    /// account JSON document.
    pub fn from_sources(api_key: Option<&str>, service_account_json: Option<&str>) -> Result<Self> {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            return Ok(Credentials::ApiKey(key.to_string()));
        }

        let json = service_account_json
            .filter(|j| !j.trim().is_empty())
            .ok_or_else(|| {
                TransfeedError::Config("no translation credentials configured".to_string())
            })?;

        let key: ServiceAccountKey = serde_json::from_str(json).map_err(|e| {
            TransfeedError::Config(format!("invalid service account credentials: {}", e))
        })?;

        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
            TransfeedError::Config(format!("invalid service account private key: {}", e))
        })?;

        Ok(Credentials::ServiceAccount(ServiceAccount {
            client_email: key.client_email,
            token_uri: key.token_uri,
            signing_key,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_takes_precedence() {
        let creds = Credentials::from_sources(Some("abc"), Some("{not json")).unwrap();
        assert!(matches!(creds, Credentials::ApiKey(ref k) if k == "abc"));
    }

    #[test]
    fn test_empty_api_key_is_ignored() {
        let result = Credentials::from_sources(Some(""), None);
        assert!(matches!(result, Err(TransfeedError::Config(_))));
    }

    #[test]
    fn test_missing_credentials() {
        let err = Credentials::from_sources(None, None).unwrap_err();
        assert!(err.to_string().contains("no translation credentials"));

        let err = Credentials::from_sources(None, Some("   ")).unwrap_err();
        assert!(err.to_string().contains("no translation credentials"));
    }

    #[test]
    fn test_malformed_service_account_json() {
        let err = Credentials::from_sources(None, Some("{not json")).unwrap_err();
        assert!(err.to_string().contains("invalid service account credentials"));
    }

    #[test]
    fn test_service_account_with_bad_key() {
        let json = r#"{
            "type": "service_account",
            "client_email": "proxy@example.iam.gserviceaccount.com",
            "private_key": "not a pem"
        }"#;
        let err = Credentials::from_sources(None, Some(json)).unwrap_err();
        assert!(err.to_string().contains("private key"));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let creds = Credentials::ApiKey("super-secret".to_string());
        assert!(!format!("{:?}", creds).contains("super-secret"));
    }

    #[test]
    fn test_resolve_with_configured_key() {
        let config = TranslateConfig {
            api_key: Some("configured".to_string()),
            credentials_env: "TRANSFEED_TEST_UNSET_CREDENTIALS".to_string(),
            ..Default::default()
        };
        let creds = Credentials::resolve(&config).unwrap();
        assert!(matches!(creds, Credentials::ApiKey(ref k) if k == "configured"));
    }

    #[test]
    fn test_resolve_names_missing_env_var() {
        let config = TranslateConfig {
            credentials_env: "TRANSFEED_TEST_UNSET_CREDENTIALS".to_string(),
            ..Default::default()
        };
        let err = Credentials::resolve(&config).unwrap_err();
        assert!(err.to_string().contains("TRANSFEED_TEST_UNSET_CREDENTIALS"));
    }
}
