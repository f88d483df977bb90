use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::paths::PathManager;

pub const ENV_TRAKT_CLIENT_ID: &str = "TRAKT_CLIENT_ID";
pub const ENV_TRAKT_CLIENT_SECRET: &str = "TRAKT_CLIENT_SECRET";
pub const ENV_TRAKT_REDIRECT_URI: &str = "TRAKT_REDIRECT_URI";
pub const ENV_LETTERBOXD_USERNAME: &str = "LETTERBOXD_USERNAME";
pub const ENV_TOKEN_FILE: &str = "DIARYSYNC_TOKEN_FILE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required settings: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub trakt: TraktConfig,
    #[serde(default)]
    pub letterboxd: LetterboxdConfig,
    #[serde(default)]
    pub sync: SyncOptions,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraktConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    /// Where the OAuth token pair lives; defaults to the config directory
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetterboxdConfig {
    #[serde(default)]
    pub username: String,
    /// Site root; the diary feed is `<feed_url>/<username>/rss/`
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOptions {
    #[serde(default = "default_true")]
    pub sync_history: bool,
    #[serde(default = "default_true")]
    pub sync_ratings: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Six-field cron expression (seconds first), evaluated in UTC
    #[serde(default = "default_schedule")]
    pub schedule: String,
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
}

fn default_true() -> bool {
    true
}

fn default_redirect_uri() -> String {
    "urn:ietf:wg:oauth:2.0:oob".to_string()
}

fn default_api_url() -> String {
    "https://api.trakt.tv".to_string()
}

fn default_authorize_url() -> String {
    "https://trakt.tv/oauth/authorize".to_string()
}

fn default_feed_url() -> String {
    "https://letterboxd.com".to_string()
}

fn default_schedule() -> String {
    "0 0 9 * * Sun".to_string() // Sundays at 09:00
}

fn default_lookback_days() -> u32 {
    7
}

impl Default for TraktConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: default_redirect_uri(),
            api_url: default_api_url(),
            authorize_url: default_authorize_url(),
            token_file: None,
        }
    }
}

impl Default for LetterboxdConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            feed_url: default_feed_url(),
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            sync_history: true,
            sync_ratings: true,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            schedule: default_schedule(),
            lookback_days: default_lookback_days(),
            run_on_startup: true,
        }
    }
}

fn is_unset(value: &str, placeholder: &str) -> bool {
    value.trim().is_empty() || value == placeholder
}

impl Config {
    /// Load the TOML file at `path`. A missing file yields the defaults so
    /// that a pure environment-variable setup keeps working.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the file and apply overrides from the process environment
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Environment values win over the file; empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_TRAKT_CLIENT_ID) {
            self.trakt.client_id = v;
        }
        if let Some(v) = get(ENV_TRAKT_CLIENT_SECRET) {
            self.trakt.client_secret = v;
        }
        if let Some(v) = get(ENV_TRAKT_REDIRECT_URI) {
            self.trakt.redirect_uri = v;
        }
        if let Some(v) = get(ENV_LETTERBOXD_USERNAME) {
            self.letterboxd.username = v;
        }
        if let Some(v) = get(ENV_TOKEN_FILE) {
            self.trakt.token_file = Some(PathBuf::from(v));
        }
    }

    pub fn missing_trakt_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_unset(&self.trakt.client_id, "YOUR_CLIENT_ID") {
            missing.push(ENV_TRAKT_CLIENT_ID);
        }
        if is_unset(&self.trakt.client_secret, "YOUR_CLIENT_SECRET") {
            missing.push(ENV_TRAKT_CLIENT_SECRET);
        }
        if self.trakt.redirect_uri.trim().is_empty() {
            missing.push(ENV_TRAKT_REDIRECT_URI);
        }
        missing
    }

    pub fn missing_letterboxd_settings(&self) -> Vec<&'static str> {
        if is_unset(&self.letterboxd.username, "YOUR_USERNAME") {
            vec![ENV_LETTERBOXD_USERNAME]
        } else {
            Vec::new()
        }
    }

    /// Everything a sync run needs
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = self.missing_trakt_settings();
        missing.extend(self.missing_letterboxd_settings());
        into_result(missing)
    }

    /// Only the Trakt application credentials (for `auth`)
    pub fn validate_trakt(&self) -> Result<(), ConfigError> {
        into_result(self.missing_trakt_settings())
    }

    /// Only the diary owner (for feed previews)
    pub fn validate_letterboxd(&self) -> Result<(), ConfigError> {
        into_result(self.missing_letterboxd_settings())
    }

    pub fn token_file(&self, paths: &PathManager) -> PathBuf {
        self.trakt
            .token_file
            .clone()
            .unwrap_or_else(|| paths.token_file())
    }
}

fn into_result(missing: Vec<&'static str>) -> Result<(), ConfigError> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Missing(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_config_load_from_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[trakt]
client_id = "test_id"
client_secret = "test_secret"

[letterboxd]
username = "alice"

[sync]
sync_ratings = false
"#
        )
        .unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        assert_eq!(config.trakt.client_id, "test_id");
        assert_eq!(config.trakt.api_url, "https://api.trakt.tv");
        assert_eq!(config.trakt.redirect_uri, "urn:ietf:wg:oauth:2.0:oob");
        assert_eq!(config.letterboxd.username, "alice");
        assert_eq!(config.letterboxd.feed_url, "https://letterboxd.com");
        assert!(config.sync.sync_history);
        assert!(!config.sync.sync_ratings);
        assert_eq!(config.scheduler.lookback_days, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_file(&dir.path().join("absent.toml")).unwrap();
        assert!(config.trakt.client_id.is_empty());
        assert!(config.sync.sync_history);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[trakt\nclient_id = 1").unwrap();
        let err = Config::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config::default();
        config.trakt.client_id = "from_file".to_string();

        let vars = env(&[
            (ENV_TRAKT_CLIENT_ID, "from_env"),
            (ENV_TRAKT_CLIENT_SECRET, "secret"),
            (ENV_LETTERBOXD_USERNAME, "bob"),
            (ENV_TRAKT_REDIRECT_URI, ""),
            (ENV_TOKEN_FILE, "/tmp/token.json"),
        ]);
        config.apply_env_overrides(|key| vars.get(key).cloned());

        assert_eq!(config.trakt.client_id, "from_env");
        assert_eq!(config.trakt.client_secret, "secret");
        assert_eq!(config.letterboxd.username, "bob");
        // empty values do not clobber defaults
        assert_eq!(config.trakt.redirect_uri, "urn:ietf:wg:oauth:2.0:oob");
        assert_eq!(config.trakt.token_file, Some(PathBuf::from("/tmp/token.json")));
    }

    #[test]
    fn test_validate_lists_every_missing_setting() {
        let mut config = Config::default();
        config.trakt.client_secret = "YOUR_CLIENT_SECRET".to_string();

        match config.validate() {
            Err(ConfigError::Missing(keys)) => {
                assert_eq!(
                    keys,
                    vec![ENV_TRAKT_CLIENT_ID, ENV_TRAKT_CLIENT_SECRET, ENV_LETTERBOXD_USERNAME]
                );
            }
            other => panic!("expected missing settings, got {:?}", other),
        }
        assert!(config.validate_trakt().is_err());
        assert!(config.validate_letterboxd().is_err());

        config.letterboxd.username = "alice".to_string();
        assert!(config.validate_letterboxd().is_ok());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_error_message() {
        let err = ConfigError::Missing(vec![ENV_TRAKT_CLIENT_ID, ENV_LETTERBOXD_USERNAME]);
        assert_eq!(
            err.to_string(),
            "missing required settings: TRAKT_CLIENT_ID, LETTERBOXD_USERNAME"
        );
    }

    #[test]
    fn test_token_file_override() {
        let paths = PathManager::with_base(PathBuf::from("/base"));
        let mut config = Config::default();
        assert_eq!(config.token_file(&paths), PathBuf::from("/base/trakt_token.json"));

        config.trakt.token_file = Some(PathBuf::from("/elsewhere/token.json"));
        assert_eq!(config.token_file(&paths), PathBuf::from("/elsewhere/token.json"));
    }
}
