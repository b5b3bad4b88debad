//! Configuration management for hangar.
//!
//! Loads configuration from ${HANGAR_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Returns the default config template with comments.
///
/// Embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for hangar configuration and data files.
    //!
    //! HANGAR_HOME resolution order:
    //! 1. HANGAR_HOME environment variable (if set)
    //! 2. ~/.config/hangar (default)

    use std::path::PathBuf;

    /// Returns the hangar home directory.
    ///
    /// Checks HANGAR_HOME env var first, falls back to ~/.config/hangar.
    /// When no home directory can be determined, the current directory is used.
    pub fn hangar_home() -> PathBuf {
        if let Ok(home) = std::env::var("HANGAR_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".hangar"),
            |h| h.join(".config").join("hangar"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        hangar_home().join("config.toml")
    }

    /// Returns the path to the persisted client storage (session, preferences).
    pub fn storage_path() -> PathBuf {
        hangar_home().join("storage.json")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL (overridden by `HANGAR_API_BASE_URL`)
    pub api_base_url: Option<String>,

    /// Per-request deadline in seconds (0 falls back to the default)
    pub request_timeout_secs: u64,
}

impl Config {
    pub const DEFAULT_BASE_URL: &'static str = "http://127.0.0.1:8000";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
    pub const BASE_URL_ENV: &'static str = "HANGAR_API_BASE_URL";

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Resolves the backend base URL with precedence: env > config > default.
    ///
    /// Trailing slashes are stripped so endpoint paths can be appended directly.
    ///
    /// # Errors
    /// Returns an error if the selected URL is not well-formed.
    pub fn base_url(&self) -> Result<String> {
        let env_url = std::env::var(Self::BASE_URL_ENV).ok();
        resolve_base_url(
            env_url.as_deref(),
            self.api_base_url.as_deref(),
            Self::DEFAULT_BASE_URL,
        )
    }

    /// Returns the request deadline.
    pub fn request_timeout(&self) -> Duration {
        if self.request_timeout_secs == 0 {
            Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.request_timeout_secs)
        }
    }

    /// Creates a config file with the commented default template.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Sets the base URL in the config file, keeping comments and other keys.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the file cannot be updated.
    pub fn save_base_url_to(path: &Path, base_url: &str) -> Result<()> {
        use toml_edit::{DocumentMut, value};

        validate_url(base_url)?;

        let contents = if path.exists() {
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?
        } else {
            default_config_template().to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        doc["api_base_url"] = value(base_url.trim());

        Self::write_config(path, &doc.to_string())
    }

    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            request_timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Picks the first non-empty candidate (env, then config), else the default.
fn resolve_base_url(
    env_url: Option<&str>,
    config_url: Option<&str>,
    default_url: &str,
) -> Result<String> {
    for candidate in [env_url, config_url].into_iter().flatten() {
        let trimmed = candidate.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed)?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }
    }

    Ok(default_url.to_string())
}

fn validate_url(url: &str) -> Result<()> {
    url::Url::parse(url.trim()).with_context(|| format!("Invalid API base URL: {url}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "api_base_url = \"http://drones.test/api\"\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(
            config.api_base_url.as_deref(),
            Some("http://drones.test/api")
        );
        assert_eq!(config.request_timeout_secs, Config::DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_zero_timeout_falls_back_to_default() {
        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_init_creates_config_with_template() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("request_timeout_secs"));
        let parsed = Config::load_from(&config_path).unwrap();
        assert_eq!(parsed.request_timeout_secs, 15);
    }

    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "# existing").unwrap();

        let err = Config::init(&config_path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_save_base_url_preserves_other_keys() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "# mine\nrequest_timeout_secs = 5\n").unwrap();

        Config::save_base_url_to(&config_path, "http://localhost:9000").unwrap();

        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("# mine"));
        let parsed = Config::load_from(&config_path).unwrap();
        assert_eq!(parsed.request_timeout_secs, 5);
        assert_eq!(parsed.api_base_url.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn test_resolve_base_url_precedence() {
        let url = resolve_base_url(Some("http://env.test/"), Some("http://cfg.test"), "d").unwrap();
        assert_eq!(url, "http://env.test");

        let url = resolve_base_url(Some("  "), Some("http://cfg.test/api/"), "d").unwrap();
        assert_eq!(url, "http://cfg.test/api");

        let url = resolve_base_url(None, None, Config::DEFAULT_BASE_URL).unwrap();
        assert_eq!(url, Config::DEFAULT_BASE_URL);
    }

    #[test]
    fn test_resolve_base_url_rejects_garbage() {
        let err = resolve_base_url(None, Some("not a url"), "d").unwrap_err();
        assert!(err.to_string().contains("Invalid API base URL"));
    }
}
