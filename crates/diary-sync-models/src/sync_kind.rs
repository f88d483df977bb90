use serde::{Deserialize, Serialize};
use std::fmt;

/// The Trakt sync endpoint a batch is sent to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SyncKind {
    History,
    Ratings,
}

impl SyncKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncKind::History => "history",
            SyncKind::Ratings => "ratings",
        }
    }

    /// Path relative to the API base URL
    pub fn endpoint(&self) -> &'static str {
        match self {
            SyncKind::History => "/sync/history",
            SyncKind::Ratings => "/sync/ratings",
        }
    }
}

impl fmt::Display for SyncKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Movie counts reported back by a sync endpoint.
///
/// `None` means the response did not carry the count.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncCounts {
    pub added: Option<u64>,
    pub existing: Option<u64>,
    pub updated: Option<u64>,
    pub not_found: Option<u64>,
}

impl SyncCounts {
    /// Read the `movies` counts out of a sync response body.
    ///
    /// Trakt reports `not_found.movies` as the list of unmatched items, so a
    /// list is counted by its length.
    pub fn from_response(body: &serde_json::Value) -> Self {
        Self {
            added: movie_count(body, "added"),
            existing: movie_count(body, "existing"),
            updated: movie_count(body, "updated"),
            not_found: movie_count(body, "not_found"),
        }
    }
}

fn movie_count(body: &serde_json::Value, section: &str) -> Option<u64> {
    let movies = body.get(section)?.get("movies")?;
    movies
        .as_u64()
        .or_else(|| movies.as_array().map(|items| items.len() as u64))
}
