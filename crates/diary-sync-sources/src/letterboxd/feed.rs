use crate::error::FeedError;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Namespace prefix of the Letterboxd RSS extension elements
const LETTERBOXD_NS: &str = "letterboxd";

/// One `<item>` of the diary feed, reduced to the fields the normalizer reads.
///
/// Every field is optional: list and review items share the feed with diary
/// entries and carry different subsets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    /// Free-text title, e.g. `alice watched The Matrix (1999)`
    pub title: Option<String>,
    /// RFC 2822 publication timestamp
    pub published: Option<String>,
    pub description: Option<String>,
    pub film_title: Option<String>,
    pub film_year: Option<String>,
    /// `YYYY-MM-DD`
    pub watched_date: Option<String>,
    /// Half-star rating, `0.5` to `5.0`
    pub member_rating: Option<String>,
}

impl From<&rss::Item> for FeedEntry {
    fn from(item: &rss::Item) -> Self {
        let extension = |name: &str| {
            item.extensions()
                .get(LETTERBOXD_NS)
                .and_then(|fields| fields.get(name))
                .and_then(|values| values.first())
                .and_then(|ext| ext.value())
                .map(|v| v.trim().to_string())
        };

        Self {
            title: item.title().map(str::to_string),
            published: item.pub_date().map(str::to_string),
            description: item.description().map(str::to_string),
            film_title: extension("filmTitle"),
            film_year: extension("filmYear"),
            watched_date: extension("watchedDate"),
            member_rating: extension("memberRating"),
        }
    }
}

/// Decode an RSS document into feed entries
pub fn parse_feed(xml: &[u8]) -> Result<Vec<FeedEntry>, rss::Error> {
    let channel = rss::Channel::read_from(xml)?;
    Ok(channel.items().iter().map(FeedEntry::from).collect())
}

/// Create a reqwest Client identifying this tool
pub fn create_feed_client() -> Client {
    Client::builder()
        .user_agent(concat!("diarysync/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Reader for a member's public diary feed
#[derive(Clone)]
pub struct LetterboxdFeed {
    client: Arc<Client>,
    base_url: String,
}

impl LetterboxdFeed {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Arc::new(create_feed_client()),
            base_url: base_url.into(),
        }
    }

    pub fn feed_url(&self, username: &str) -> String {
        format!(
            "{}/{}/rss/",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(username)
        )
    }

    /// Download and decode the member's feed
    pub async fn fetch(&self, username: &str) -> Result<Vec<FeedEntry>, FeedError> {
        let url = self.feed_url(username);
        info!(operation = "feed_fetch", url = %url, "Fetching Letterboxd RSS feed");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/rss+xml, application/xml;q=0.9, */*;q=0.8")
            .send()
            .await
            .map_err(|source| FeedError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| FeedError::Transport {
            url: url.clone(),
            source,
        })?;
        let entries = parse_feed(&body).map_err(|source| FeedError::Parse {
            url: url.clone(),
            source,
        })?;

        if entries.is_empty() {
            warn!(operation = "feed_fetch", url = %url, "No entries found in the RSS feed");
        } else {
            debug!(operation = "feed_fetch", entries = entries.len(), "Feed decoded");
        }

        Ok(entries)
    }
}
