pub mod error;
pub mod letterboxd;
pub mod trakt;

pub use error::{AuthError, FeedError, ParseError, SyncError};
pub use letterboxd::{normalize_entries, normalize_entry, FeedEntry, LetterboxdFeed};
pub use trakt::{SyncOutcome, TokenManager, TraktClient};
