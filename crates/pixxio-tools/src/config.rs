//! Process-wide settings and per-call credential resolution.
//!
//! Settings are built once at startup and never mutated. Every tool call resolves an
//! [`ApiContext`] from them, optionally overridden by caller-supplied `api_key`/`base_url`.

use crate::error::{PixxioError, Result};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.pixx.io";
pub const DEFAULT_API_PREFIX: &str = "/api/v1";

/// Caller-supplied API keys shorter than this are rejected as malformed.
pub const MIN_API_KEY_LEN: usize = 10;

#[derive(Clone)]
pub struct PixxioSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub api_prefix: String,
    /// Directory that receives `download_asset` files.
    pub download_dir: PathBuf,
}

impl Default for PixxioSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            download_dir: default_download_dir(),
        }
    }
}

impl fmt::Debug for PixxioSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixxioSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("api_prefix", &self.api_prefix)
            .field("download_dir", &self.download_dir)
            .finish()
    }
}

impl PixxioSettings {
    /// Whether a default credential is available (used by the health route; not validated remotely).
    #[must_use]
    pub fn api_key_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

#[must_use]
pub fn default_download_dir() -> PathBuf {
    std::env::temp_dir().join("pixxio-mcp")
}

/// Per-call credential overrides accepted by every tool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialOverrides {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Immutable credential context for a single tool invocation.
#[derive(Clone)]
pub struct ApiContext {
    base_url: Url,
    api_prefix: String,
    api_key: String,
}

impl fmt::Debug for ApiContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiContext")
            .field("base_url", &self.base_url.as_str())
            .field("api_prefix", &self.api_prefix)
            .finish_non_exhaustive()
    }
}

impl ApiContext {
    /// Build a context from explicit values.
    ///
    /// # Errors
    ///
    /// Returns [`PixxioError::Config`] if the API key is empty or the base URL is not an
    /// absolute `http(s)` URL.
    pub fn new(api_key: &str, base_url: &str, api_prefix: &str) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(PixxioError::Config("pixx.io API key is empty".to_string()));
        }

        let base_url = Url::parse(base_url.trim()).map_err(|e| {
            PixxioError::Config(format!("Invalid pixx.io base URL '{base_url}': {e}"))
        })?;
        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            return Err(PixxioError::Config(format!(
                "Unsupported base URL scheme '{}'",
                base_url.scheme()
            )));
        }

        let prefix = api_prefix.trim().trim_end_matches('/');
        let api_prefix = if prefix.is_empty() || prefix.starts_with('/') {
            prefix.to_string()
        } else {
            format!("/{prefix}")
        };

        Ok(Self {
            base_url,
            api_prefix,
            api_key: api_key.to_string(),
        })
    }

    /// Resolve credentials for one call: caller overrides first, process defaults second.
    ///
    /// # Errors
    ///
    /// - [`PixxioError::Validation`] if a caller-supplied key is shorter than [`MIN_API_KEY_LEN`]
    /// - [`PixxioError::Config`] if no key or no base URL is available from either source
    pub fn resolve(settings: &PixxioSettings, overrides: &CredentialOverrides) -> Result<Self> {
        let explicit_key = non_empty(overrides.api_key.as_deref());
        if let Some(key) = explicit_key
            && key.len() < MIN_API_KEY_LEN
        {
            return Err(PixxioError::Validation(format!(
                "api_key must be at least {MIN_API_KEY_LEN} characters"
            )));
        }

        let Some(api_key) = explicit_key.or_else(|| non_empty(settings.api_key.as_deref())) else {
            return Err(PixxioError::Config(
                "No pixx.io API key configured. Set PIXXIO_API_KEY or pass api_key.".to_string(),
            ));
        };

        let Some(base_url) = non_empty(overrides.base_url.as_deref())
            .or_else(|| non_empty(settings.base_url.as_deref()))
        else {
            return Err(PixxioError::Config(
                "No pixx.io base URL configured. Set PIXXIO_BASE_URL or pass base_url.".to_string(),
            ));
        };

        Self::new(api_key, base_url, &settings.api_prefix)
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL of an API endpoint, e.g. `endpoint("/files/12")`.
    ///
    /// # Errors
    ///
    /// Returns [`PixxioError::Config`] if the joined URL is invalid.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        let url = format!(
            "{}{}/{path}",
            self.base_url.as_str().trim_end_matches('/'),
            self.api_prefix
        );
        Url::parse(&url).map_err(|e| PixxioError::Config(format!("Invalid endpoint URL: {e}")))
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(key: Option<&str>) -> PixxioSettings {
        PixxioSettings {
            api_key: key.map(str::to_string),
            ..PixxioSettings::default()
        }
    }

    #[test]
    fn resolve_prefers_caller_credentials() {
        let overrides = CredentialOverrides {
            api_key: Some("caller-key-0123".to_string()),
            base_url: Some("https://tenant.pixx.io".to_string()),
        };
        let ctx = ApiContext::resolve(&settings(Some("env-key-0123456")), &overrides)
            .expect("resolved");
        assert_eq!(ctx.api_key(), "caller-key-0123");
        assert_eq!(ctx.base_url().host_str(), Some("tenant.pixx.io"));
    }

    #[test]
    fn resolve_falls_back_to_process_defaults() {
        let ctx = ApiContext::resolve(
            &settings(Some("env-key-0123456")),
            &CredentialOverrides::default(),
        )
        .expect("resolved");
        assert_eq!(ctx.api_key(), "env-key-0123456");
        assert_eq!(ctx.base_url().host_str(), Some("api.pixx.io"));
    }

    #[test]
    fn resolve_fails_closed_without_key() {
        let err = ApiContext::resolve(&settings(None), &CredentialOverrides::default())
            .expect_err("no key");
        assert!(matches!(err, PixxioError::Config(_)));
    }

    #[test]
    fn resolve_fails_closed_without_base_url() {
        let s = PixxioSettings {
            base_url: None,
            ..settings(Some("env-key-0123456"))
        };
        let err = ApiContext::resolve(&s, &CredentialOverrides::default()).expect_err("no url");
        assert!(matches!(err, PixxioError::Config(_)));
    }

    #[test]
    fn short_caller_key_is_a_validation_error() {
        let overrides = CredentialOverrides {
            api_key: Some("short".to_string()),
            base_url: None,
        };
        let err = ApiContext::resolve(&settings(Some("env-key-0123456")), &overrides)
            .expect_err("short key");
        assert!(matches!(err, PixxioError::Validation(_)));
    }

    #[test]
    fn endpoint_joins_prefix_and_path() {
        let ctx = ApiContext::new("key-0123456789", "https://api.pixx.io/", "api/v1/").expect("ctx");
        assert_eq!(
            ctx.endpoint("/files/42").expect("url").as_str(),
            "https://api.pixx.io/api/v1/files/42"
        );

        let bare = ApiContext::new("key-0123456789", "http://127.0.0.1:9000", "").expect("ctx");
        assert_eq!(
            bare.endpoint("files").expect("url").as_str(),
            "http://127.0.0.1:9000/files"
        );
    }

    #[test]
    fn debug_output_hides_api_key() {
        let s = settings(Some("super-secret-key"));
        assert!(!format!("{s:?}").contains("super-secret-key"));
        let ctx = ApiContext::new("super-secret-key", DEFAULT_BASE_URL, DEFAULT_API_PREFIX)
            .expect("ctx");
        assert!(!format!("{ctx:?}").contains("super-secret-key"));
    }
}
