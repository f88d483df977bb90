pub mod api;
pub mod auth;
pub mod client;

pub use auth::{create_trakt_client, TokenManager};
pub use client::{SyncOutcome, TraktClient, MAX_ATTEMPTS};
