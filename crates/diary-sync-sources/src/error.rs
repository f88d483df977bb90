use diary_sync_config::TokenStoreError;
use diary_sync_models::SyncKind;
use std::path::PathBuf;
use thiserror::Error;

/// Fetching or decoding the diary feed failed
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to fetch feed {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("feed {url} returned {status}")]
    Status { url: String, status: u16 },
    #[error("feed {url} is not a valid RSS document: {source}")]
    Parse {
        url: String,
        #[source]
        source: rss::Error,
    },
}

/// Why a single feed entry could not become a movie record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("entry has no film title")]
    MissingTitle,
    #[error("entry has no watched date")]
    MissingWatchedDate,
}

/// No usable Trakt access token could be produced
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no token file at {path}; run `diarysync auth` first")]
    MissingToken { path: PathBuf },
    #[error(transparent)]
    Store(#[from] TokenStoreError),
    #[error("token endpoint rejected the request: {status} - {body}")]
    Rejected { status: u16, body: String },
    #[error("token request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("authorization code cannot be empty")]
    EmptyCode,
    #[error("token endpoint returned an unusable lifetime: expires_in = {expires_in}")]
    InvalidExpiry { expires_in: i64 },
}

/// A sync batch was not accepted
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{kind} request failed: {source}")]
    Transport {
        kind: SyncKind,
        #[source]
        source: reqwest::Error,
    },
    #[error("{kind} sync failed: {status} - {body}")]
    Status {
        kind: SyncKind,
        status: u16,
        body: String,
    },
    #[error("{kind} sync still rate limited after {attempts} attempts")]
    RateLimited { kind: SyncKind, attempts: u32 },
}

impl SyncError {
    /// Credential failures end the whole run; everything else only the batch
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::Auth(_))
    }
}
