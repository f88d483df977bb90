pub mod feed;
pub mod normalize;

pub use feed::{FeedEntry, LetterboxdFeed};
pub use normalize::{normalize_entries, normalize_entry};
