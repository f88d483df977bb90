use diary_sync_models::{MovieRecord, SyncKind};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::RequestBuilder;
use serde::Serialize;
use std::time::Duration;

pub const TRAKT_API_VERSION: &str = "2";

/// Wait used when a 429 carries no usable `Retry-After`
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize, PartialEq)]
pub struct SyncPayload {
    pub movies: Vec<MoviePayload>,
}

/// A movie matched by title and year
#[derive(Debug, Serialize, PartialEq)]
pub struct MoviePayload {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watched_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

impl SyncPayload {
    /// Build the request body for one endpoint. Ratings only carry rated
    /// records; history carries every record with its watch timestamp.
    pub fn build(kind: SyncKind, records: &[MovieRecord]) -> Self {
        let movies = records
            .iter()
            .filter_map(|record| match kind {
                SyncKind::History => Some(MoviePayload {
                    title: record.title.clone(),
                    year: record.year,
                    watched_at: Some(record.watched_at_iso()),
                    rating: None,
                }),
                SyncKind::Ratings => record.rating.map(|rating| MoviePayload {
                    title: record.title.clone(),
                    year: record.year,
                    watched_at: None,
                    rating: Some(rating),
                }),
            })
            .collect();

        Self { movies }
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

/// Attach the headers every authenticated Trakt call needs
pub fn with_trakt_headers(request: RequestBuilder, access_token: &str, client_id: &str) -> RequestBuilder {
    request
        .header("Authorization", format!("Bearer {}", access_token))
        .header("trakt-api-version", TRAKT_API_VERSION)
        .header("trakt-api-key", client_id)
        .header("Accept", "application/json")
        .header("Content-Type", "application/json")
}

/// Seconds to wait before retrying a rate-limited request
pub fn retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    fn records() -> Vec<MovieRecord> {
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        vec![
            MovieRecord::new("The Matrix", Some(1999), day, Some(9)),
            MovieRecord::new("Stalker", None, day, None),
        ]
    }

    #[test]
    fn test_history_payload() {
        let payload = SyncPayload::build(SyncKind::History, &records());
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "movies": [
                    { "title": "The Matrix", "year": 1999, "watched_at": "2024-01-15T12:00:00.000Z" },
                    { "title": "Stalker", "watched_at": "2024-01-15T12:00:00.000Z" }
                ]
            })
        );
    }

    #[test]
    fn test_ratings_payload_skips_unrated() {
        let payload = SyncPayload::build(SyncKind::Ratings, &records());
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({ "movies": [ { "title": "The Matrix", "year": 1999, "rating": 9 } ] })
        );
    }

    #[test]
    fn test_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), DEFAULT_RETRY_AFTER);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("5"));
        assert_eq!(retry_after(&headers), Duration::from_secs(5));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(retry_after(&headers), DEFAULT_RETRY_AFTER);
    }
}
