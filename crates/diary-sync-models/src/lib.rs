pub mod movie;
pub mod rating;
pub mod sync_kind;
pub mod token;

pub use movie::MovieRecord;
pub use rating::{half_stars_to_trakt, MAX_STARS, MIN_STARS};
pub use sync_kind::{SyncCounts, SyncKind};
pub use token::TokenState;
