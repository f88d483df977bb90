use chrono::{DateTime, Duration, Utc};
use diary_sync_models::TokenState;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("failed to read token file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("token file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write token file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode token: {0}")]
    Encode(#[from] serde_json::Error),
}

/// On-disk form of the Trakt token response.
///
/// Mirrors what `/oauth/token` returns plus the computed `expires_at`
/// (unix seconds, possibly fractional in files written by older tools).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<f64>,
}

impl StoredToken {
    /// Explicit `expires_at` first, then `created_at + expires_in`.
    /// Values outside the representable range give `None`.
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        if let Some(secs) = self.expires_at.filter(|s| s.is_finite()) {
            return DateTime::<Utc>::from_timestamp(secs.trunc() as i64, 0);
        }
        let created = DateTime::<Utc>::from_timestamp(self.created_at?, 0)?;
        created.checked_add_signed(Duration::try_seconds(self.expires_in?)?)
    }

    /// Without any expiry information the token counts as already expired.
    pub fn to_state(&self) -> TokenState {
        TokenState {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_at: self.expiry().unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }
}

/// The single JSON file holding the Trakt token pair
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// `Ok(None)` when no token has been saved yet
    pub fn load(&self) -> Result<Option<StoredToken>, TokenStoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path).map_err(|source| TokenStoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        let token = serde_json::from_str(&content).map_err(|source| TokenStoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(token))
    }

    /// Replace the file wholesale. The new content goes to a sibling temp
    /// file first so a failed write never leaves a truncated token behind.
    pub fn save(&self, token: &StoredToken) -> Result<(), TokenStoreError> {
        let write_err = |source| TokenStoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let content = serde_json::to_string_pretty(token)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_token() -> StoredToken {
        StoredToken {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            token_type: Some("bearer".to_string()),
            scope: Some("public".to_string()),
            expires_in: Some(7_776_000),
            created_at: Some(1_700_000_000),
            expires_at: Some(1_707_776_000.0),
        }
    }

    #[test]
    fn test_token_store_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("sub").join("trakt_token.json"));
        assert!(store.load().unwrap().is_none());

        store.save(&sample_token()).unwrap();
        assert!(store.exists());
        assert_eq!(store.load().unwrap(), Some(sample_token()));
    }

    #[test]
    fn test_reads_float_expiry_from_older_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trakt_token.json");
        std::fs::write(
            &path,
            r#"{"access_token": "a", "refresh_token": "r", "expires_in": 7776000,
                "token_type": "bearer", "scope": "public", "created_at": 1700000000,
                "expires_at": 1707776000.123456}"#,
        )
        .unwrap();

        let token = TokenStore::new(path).load().unwrap().unwrap();
        let state = token.to_state();
        assert_eq!(state.expires_at.timestamp(), 1_707_776_000);
    }

    #[test]
    fn test_expiry_derived_from_created_at() {
        let mut token = sample_token();
        token.expires_at = None;
        assert_eq!(token.expiry().unwrap().timestamp(), 1_707_776_000);
    }

    #[test]
    fn test_no_expiry_counts_as_expired() {
        let mut token = sample_token();
        token.expires_at = None;
        token.created_at = None;
        let state = token.to_state();
        assert!(state.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_out_of_range_lifetime_counts_as_expired() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trakt_token.json");
        std::fs::write(
            &path,
            r#"{"access_token": "a", "refresh_token": "r",
                "created_at": 1700000000, "expires_in": 1000000000000000}"#,
        )
        .unwrap();

        let token = TokenStore::new(path).load().unwrap().unwrap();
        assert_eq!(token.expiry(), None);
        assert!(token.to_state().is_expired_at(Utc::now()));

        let mut token = sample_token();
        token.expires_at = None;
        token.expires_in = Some(i64::MAX);
        assert_eq!(token.expiry(), None);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trakt_token.json");
        std::fs::write(&path, "not json").unwrap();
        let err = TokenStore::new(path).load().unwrap_err();
        assert!(matches!(err, TokenStoreError::Parse { .. }));
    }
}
