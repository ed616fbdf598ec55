//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. `KEELSON_*` environment variables
//! 4. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. An explicit path (from `--config`)
//! 2. `$KEELSON_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/keelson/config.toml`
//! 4. `~/.keelson/config.toml` (canonical write location)
//!
//! # Environment Overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `KEELSON_APPLICATION_ID` | `application_id` |
//! | `KEELSON_REST_API_KEY` | `rest_api_key` |
//! | `KEELSON_MASTER_KEY` | `master_key` |
//! | `KEELSON_SESSION_TOKEN` | `session_token` |
//! | `KEELSON_API_BASE` | `api_base` |
//!
//! # Example
//!
//! ```no_run
//! use keelson::core::config::ClientConfig;
//!
//! let result = ClientConfig::load(None).unwrap();
//! println!("Backend: {}", result.config.api_base());
//! ```

pub mod schema;

pub use schema::{ClientConfig, DEFAULT_API_BASE};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "KEELSON_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration, with environment overrides applied.
    pub config: ClientConfig,
    /// Path of the file it was read from, if any.
    pub path: Option<PathBuf>,
}

impl ClientConfig {
    /// Load configuration from the standard locations and environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed, or
    /// if the resulting values are invalid. A missing file is not an error.
    pub fn load(explicit: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        Self::load_with(explicit, |name| std::env::var(name).ok())
    }

    /// [`ClientConfig::load`] with a custom environment lookup.
    pub fn load_with(
        explicit: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let (mut config, path) = match Self::locate(explicit, &env) {
            Some(path) => (Self::read(&path)?, Some(path)),
            None => (ClientConfig::default(), None),
        };

        config.apply_env_overrides_from(&env);
        config.validate()?;

        tracing::debug!(path = ?path, "loaded configuration");
        Ok(ConfigLoadResult { config, path })
    }

    /// First existing config file in precedence order.
    ///
    /// An explicit path is returned even when missing, so that reading it
    /// reports the error.
    fn locate(explicit: Option<&Path>, env: &impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        if let Some(path) = env(CONFIG_ENV).map(PathBuf::from) {
            if path.exists() {
                return Some(path);
            }
        }

        if let Some(xdg_home) = env("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("keelson/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        let path = dirs::home_dir()?.join(".keelson/config.toml");
        path.exists().then_some(path)
    }

    /// Overlay `KEELSON_*` variables from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(|name| std::env::var(name).ok());
    }

    /// Overlay `KEELSON_*` variables from `env`.
    pub fn apply_env_overrides_from(&mut self, env: impl Fn(&str) -> Option<String>) {
        let fields = [
            ("KEELSON_APPLICATION_ID", &mut self.application_id),
            ("KEELSON_REST_API_KEY", &mut self.rest_api_key),
            ("KEELSON_MASTER_KEY", &mut self.master_key),
            ("KEELSON_SESSION_TOKEN", &mut self.session_token),
            ("KEELSON_API_BASE", &mut self.api_base),
        ];
        for (name, field) in fields {
            if let Some(value) = env(name) {
                *field = Some(value);
            }
        }
    }

    /// Read and parse a config file.
    fn read(path: &Path) -> Result<ClientConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Canonical config path, `~/.keelson/config.toml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".keelson/config.toml"))
    }

    /// Write this configuration atomically to `path`.
    ///
    /// Creates parent directories if needed. Writes to a temp file in the
    /// same directory, then renames over the target.
    pub fn write_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let write_err = |source| ConfigError::WriteError {
            path: temp_path.clone(),
            source,
        };
        let mut file = fs::File::create(&temp_path).map_err(write_err)?;
        file.write_all(contents.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn load_from_env_path() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
            application_id = "app"
            rest_api_key = "key"
            "#,
        )
        .unwrap();

        let env = env_of(&[(CONFIG_ENV, config_path.to_str().unwrap())]);
        let result = ClientConfig::load_with(None, env).unwrap();

        assert_eq!(result.path.as_deref(), Some(config_path.as_path()));
        assert_eq!(result.config.application_id.as_deref(), Some("app"));
    }

    #[test]
    fn load_from_xdg() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("keelson");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), "application_id = \"xdg\"").unwrap();

        let env = env_of(&[("XDG_CONFIG_HOME", temp.path().to_str().unwrap())]);
        let result = ClientConfig::load_with(None, env).unwrap();

        assert_eq!(result.config.application_id.as_deref(), Some("xdg"));
    }

    #[test]
    fn env_overrides_file() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        fs::write(&config_path, "application_id = \"file\"").unwrap();

        let env = env_of(&[
            ("KEELSON_APPLICATION_ID", "env"),
            ("KEELSON_MASTER_KEY", "mk"),
        ]);
        let result = ClientConfig::load_with(Some(&config_path), env).unwrap();

        assert_eq!(result.config.application_id.as_deref(), Some("env"));
        assert_eq!(result.config.master_key.as_deref(), Some("mk"));
    }

    #[test]
    fn explicit_missing_path_is_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");
        let result = ClientConfig::load_with(Some(&missing), env_of(&[]));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn invalid_env_api_base_rejected() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        fs::write(&config_path, "").unwrap();

        let env = env_of(&[("KEELSON_API_BASE", "::nope")]);
        assert!(ClientConfig::load_with(Some(&config_path), env).is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        fs::write(&config_path, "unknown_field = true").unwrap();

        let result = ClientConfig::load_with(Some(&config_path), env_of(&[]));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn write_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/config.toml");

        let config = ClientConfig::new("app", "key").with_api_base("http://localhost:1337/parse");
        config.write_to(&path).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("toml.tmp").exists());
        let loaded = ClientConfig::load_with(Some(&path), env_of(&[])).unwrap();
        assert_eq!(loaded.config, config);
    }
}
