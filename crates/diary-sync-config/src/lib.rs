pub mod config;
pub mod paths;
pub mod token_store;

pub use config::{Config, ConfigError, LetterboxdConfig, SchedulerConfig, SyncOptions, TraktConfig};
pub use paths::{base_path_override, PathManager};
pub use token_store::{StoredToken, TokenStore, TokenStoreError};
