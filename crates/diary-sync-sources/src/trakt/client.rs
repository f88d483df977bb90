use crate::error::{AuthError, SyncError};
use crate::trakt::api::{retry_after, with_trakt_headers, SyncPayload};
use crate::trakt::auth::{create_trakt_client, TokenManager};
use diary_sync_config::TraktConfig;
use diary_sync_models::{MovieRecord, SyncCounts, SyncKind};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Requests per batch before giving up on a rate-limited endpoint
pub const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing qualified for the endpoint, so no request was made
    Skipped,
    Synced(SyncCounts),
}

#[derive(Clone)]
pub struct TraktClient {
    client: Arc<Client>,
    api_url: String,
    tokens: Arc<TokenManager>,
}

impl TraktClient {
    pub fn new(config: &TraktConfig, tokens: TokenManager) -> Self {
        Self {
            client: Arc::new(create_trakt_client()),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            tokens: Arc::new(tokens),
        }
    }

    /// Make sure a usable token exists before any work is done
    pub async fn ensure_token(&self) -> Result<(), AuthError> {
        self.tokens.access_token().await.map(|_| ())
    }

    /// Push one batch of records to a sync endpoint, retrying on 429
    pub async fn sync(&self, kind: SyncKind, records: &[MovieRecord]) -> Result<SyncOutcome, SyncError> {
        let payload = SyncPayload::build(kind, records);
        if payload.is_empty() {
            info!(operation = "sync", kind = %kind, "No {} to sync", kind);
            return Ok(SyncOutcome::Skipped);
        }

        let access_token = self.tokens.access_token().await?;
        let url = format!("{}{}", self.api_url, kind.endpoint());
        debug!(
            operation = "sync",
            kind = %kind,
            movies = payload.movies.len(),
            "Posting to {}",
            url
        );

        for attempt in 1..=MAX_ATTEMPTS {
            let response = with_trakt_headers(self.client.post(&url), &access_token, self.tokens.client_id())
                .json(&payload)
                .send()
                .await
                .map_err(|source| SyncError::Transport { kind, source })?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                let wait = retry_after(response.headers());
                warn!(
                    operation = "sync",
                    kind = %kind,
                    attempt,
                    "Rate limited, retry in {}s",
                    wait.as_secs()
                );
                if attempt < MAX_ATTEMPTS {
                    tokio::time::sleep(wait).await;
                }
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            if !status.is_success() {
                return Err(SyncError::Status {
                    kind,
                    status: status.as_u16(),
                    body,
                });
            }

            let counts = serde_json::from_str::<serde_json::Value>(&body)
                .map(|value| SyncCounts::from_response(&value))
                .unwrap_or_default();
            info!(
                operation = "sync",
                kind = %kind,
                added = ?counts.added,
                existing = ?counts.existing,
                not_found = ?counts.not_found,
                "Synced {} batch to Trakt",
                kind
            );
            return Ok(SyncOutcome::Synced(counts));
        }

        Err(SyncError::RateLimited {
            kind,
            attempts: MAX_ATTEMPTS,
        })
    }
}
