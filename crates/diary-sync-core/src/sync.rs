use crate::filter::{filter_since, remove_duplicates, SyncWindow};
use chrono::{Local, NaiveDate};
use diary_sync_config::{Config, PathManager, SyncOptions, TokenStore};
use diary_sync_models::{MovieRecord, SyncCounts, SyncKind};
use diary_sync_sources::trakt::api::SyncPayload;
use diary_sync_sources::{
    normalize_entries, AuthError, FeedError, LetterboxdFeed, SyncError, SyncOutcome, TokenManager,
    TraktClient,
};
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// Errors that end a run before every batch was attempted
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Trakt authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("Letterboxd feed unavailable: {0}")]
    Feed(#[from] FeedError),
}

/// What happened to one endpoint during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Disabled,
    Skipped,
    DryRun(usize),
    Synced(SyncCounts),
    Failed(String),
}

impl BatchStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, BatchStatus::Failed(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// Feed entries downloaded, before normalization
    pub fetched: usize,
    /// Records inside the window, as sent to Trakt
    pub records: Vec<MovieRecord>,
    pub history: BatchStatus,
    pub ratings: BatchStatus,
    pub duration: Duration,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        !self.history.is_failed() && !self.ratings.is_failed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunOptions {
    pub sync_history: bool,
    pub sync_ratings: bool,
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            sync_history: true,
            sync_ratings: true,
            dry_run: false,
        }
    }
}

impl From<&SyncOptions> for RunOptions {
    fn from(options: &SyncOptions) -> Self {
        Self {
            sync_history: options.sync_history,
            sync_ratings: options.sync_ratings,
            dry_run: false,
        }
    }
}

/// Feed → normalize → filter → Trakt, one run at a time
pub struct SyncOrchestrator {
    feed: LetterboxdFeed,
    trakt: TraktClient,
    username: String,
    options: RunOptions,
}

impl SyncOrchestrator {
    pub fn new(feed: LetterboxdFeed, trakt: TraktClient, username: impl Into<String>, options: RunOptions) -> Self {
        Self {
            feed,
            trakt,
            username: username.into(),
            options,
        }
    }

    /// Wire up feed reader, token manager and Trakt client from configuration
    pub fn from_config(config: &Config, paths: &PathManager) -> Self {
        let tokens = TokenManager::new(&config.trakt, TokenStore::new(config.token_file(paths)));
        Self::new(
            LetterboxdFeed::new(config.letterboxd.feed_url.clone()),
            TraktClient::new(&config.trakt, tokens),
            config.letterboxd.username.clone(),
            RunOptions::from(&config.sync),
        )
    }

    pub fn options(&self) -> RunOptions {
        self.options
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Fetch and normalize the feed, keeping records inside the window.
    /// Returns the raw entry count alongside the records.
    pub async fn collect(&self, window: SyncWindow, today: NaiveDate) -> Result<(usize, Vec<MovieRecord>), FeedError> {
        let entries = self.feed.fetch(&self.username).await?;
        let fetched = entries.len();

        let records = remove_duplicates(normalize_entries(&entries));
        let cutoff = window.cutoff(today);
        let records = filter_since(records, cutoff);
        info!(
            operation = "filter",
            window = %window,
            cutoff = ?cutoff,
            records = records.len(),
            "Filtered {} movies",
            records.len()
        );

        Ok((fetched, records))
    }

    /// One full sync run with today's local date as the reference
    pub async fn run(&self, window: SyncWindow) -> Result<SyncReport, RunError> {
        self.run_on(window, Local::now().date_naive()).await
    }

    #[instrument(skip(self), fields(username = %self.username))]
    pub async fn run_on(&self, window: SyncWindow, today: NaiveDate) -> Result<SyncReport, RunError> {
        let start = Instant::now();
        info!(
            operation = "sync_start",
            window = %window,
            dry_run = self.options.dry_run,
            "Starting Letterboxd → Trakt sync"
        );

        if !self.options.dry_run {
            if let Err(e) = self.trakt.ensure_token().await {
                error!(operation = "auth", error = %e, "No usable Trakt token");
                return Err(e.into());
            }
        }

        let (fetched, records) = self.collect(window, today).await?;
        if records.is_empty() {
            info!(operation = "sync", "No movies found in the selected window");
        }

        let history = self
            .batch(SyncKind::History, self.options.sync_history, &records)
            .await?;
        let ratings = self
            .batch(SyncKind::Ratings, self.options.sync_ratings, &records)
            .await?;

        let report = SyncReport {
            fetched,
            records,
            history,
            ratings,
            duration: start.elapsed(),
        };

        if report.is_success() {
            info!(
                operation = "sync_complete",
                duration_ms = report.duration.as_millis() as u64,
                "Sync finished"
            );
        } else {
            warn!(
                operation = "sync_complete",
                duration_ms = report.duration.as_millis() as u64,
                "Sync finished with failed batches"
            );
        }
        Ok(report)
    }

    async fn batch(&self, kind: SyncKind, enabled: bool, records: &[MovieRecord]) -> Result<BatchStatus, RunError> {
        if !enabled {
            info!(operation = "sync", kind = %kind, "{} sync disabled", kind);
            return Ok(BatchStatus::Disabled);
        }

        if self.options.dry_run {
            let count = SyncPayload::build(kind, records).movies.len();
            info!(operation = "sync", kind = %kind, movies = count, "Dry run: would sync {} movies", count);
            return Ok(if count == 0 {
                BatchStatus::Skipped
            } else {
                BatchStatus::DryRun(count)
            });
        }

        match self.trakt.sync(kind, records).await {
            Ok(SyncOutcome::Skipped) => Ok(BatchStatus::Skipped),
            Ok(SyncOutcome::Synced(counts)) => Ok(BatchStatus::Synced(counts)),
            Err(SyncError::Auth(e)) => Err(RunError::Auth(e)),
            Err(e) => {
                error!(operation = "sync", kind = %kind, error = %e, "Failed {}", kind);
                Ok(BatchStatus::Failed(e.to_string()))
            }
        }
    }
}
