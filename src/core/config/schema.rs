//! core::config::schema
//!
//! Client configuration schema.
//!
//! # Validation
//!
//! Values are validated after parsing: `api_base` must be an absolute
//! http(s) URL and credentials, when given, must be non-empty.

use std::fmt;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Backend root used when `api_base` is not configured.
pub const DEFAULT_API_BASE: &str = "https://api.parse.com/1";

/// Connection settings for one backend application.
///
/// # Example
///
/// ```toml
/// application_id = "my-app"
/// rest_api_key = "rest-key"
/// api_base = "https://api.example.com/1"
/// ```
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Application identifier
    pub application_id: Option<String>,

    /// REST API key
    pub rest_api_key: Option<String>,

    /// Master key; bypasses per-object permissions
    pub master_key: Option<String>,

    /// Session token of a logged-in user
    pub session_token: Option<String>,

    /// Backend root URL, including any version prefix
    pub api_base: Option<String>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(value: &Option<String>) -> &'static str {
            if value.is_some() {
                "[REDACTED]"
            } else {
                "None"
            }
        }

        f.debug_struct("ClientConfig")
            .field("application_id", &self.application_id)
            .field("rest_api_key", &redact(&self.rest_api_key))
            .field("master_key", &redact(&self.master_key))
            .field("session_token", &redact(&self.session_token))
            .field("api_base", &self.api_base())
            .finish()
    }
}

impl ClientConfig {
    /// Configuration with an application id and REST key.
    pub fn new(application_id: impl Into<String>, rest_api_key: impl Into<String>) -> Self {
        Self {
            application_id: Some(application_id.into()),
            rest_api_key: Some(rest_api_key.into()),
            ..Default::default()
        }
    }

    pub fn with_master_key(mut self, master_key: impl Into<String>) -> Self {
        self.master_key = Some(master_key.into());
        self
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Backend root, defaulting to [`DEFAULT_API_BASE`].
    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    /// Parsed backend root.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(self.api_base()).map_err(|e| {
            ConfigError::InvalidValue(format!("invalid api_base '{}': {}", self.api_base(), e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue(format!(
                "api_base must use http or https, got '{}'",
                url.scheme()
            )));
        }
        Ok(url)
    }

    /// Path component of the backend root without a trailing slash
    /// (`"/1"` for `https://api.parse.com/1`).
    ///
    /// Batch sub-requests address objects by absolute path, so they need
    /// this prefix.
    pub fn base_path(&self) -> Result<String, ConfigError> {
        let url = self.base_url()?;
        Ok(url.path().trim_end_matches('/').to_string())
    }

    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;

        let fields = [
            ("application_id", &self.application_id),
            ("rest_api_key", &self.rest_api_key),
            ("master_key", &self.master_key),
            ("session_token", &self.session_token),
        ];
        for (name, value) in fields {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ConfigError::InvalidValue(format!("{} cannot be empty", name)));
            }
        }

        Ok(())
    }

    /// Check that requests can be authenticated.
    ///
    /// An application id is always needed, plus a REST key or master key.
    pub fn require_credentials(&self) -> Result<(), ConfigError> {
        if self.application_id.is_none() {
            return Err(ConfigError::MissingCredential("application_id"));
        }
        if self.rest_api_key.is_none() && self.master_key.is_none() {
            return Err(ConfigError::MissingCredential("rest_api_key or master_key"));
        }
        Ok(())
    }
}
