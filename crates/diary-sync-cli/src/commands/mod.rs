pub mod auth;
pub mod daemon;
pub mod feed;
pub mod progress;
pub mod prompts;
pub mod sync;

use crate::WindowArgs;
use chrono::NaiveDate;
use color_eyre::eyre::{eyre, Result};
use diary_sync_config::{Config, PathManager};
use diary_sync_core::SyncWindow;
use std::path::Path;

/// Date formats accepted by `--start-date`, US order first
const START_DATE_FORMATS: [&str; 2] = ["%m-%d-%Y", "%Y-%m-%d"];

pub fn parse_start_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    START_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .ok_or_else(|| eyre!("Invalid start date '{}'. Use MM-DD-YYYY", raw))
}

impl WindowArgs {
    pub fn to_window(&self) -> Result<SyncWindow> {
        match (&self.start_date, self.days) {
            (Some(date), _) => Ok(SyncWindow::Since(parse_start_date(date)?)),
            (None, Some(days)) => Ok(SyncWindow::LastDays(days)),
            (None, None) => Ok(SyncWindow::All),
        }
    }
}

/// Load the config file (explicit path or the default location) with
/// environment overrides applied
pub fn load_config(config_path: Option<&Path>) -> Result<(Config, PathManager)> {
    let paths = PathManager::default();
    let file = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| paths.config_file());

    tracing::debug!(operation = "config_load", path = %file.display(), "Loading configuration");
    let config = Config::load(&file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", file.display(), e))?;
    Ok((config, paths))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(parse_start_date("01-15-2024").unwrap(), expected);
        assert_eq!(parse_start_date("2024-01-15").unwrap(), expected);
        assert!(parse_start_date("15/01/2024").is_err());
        assert!(parse_start_date("13-01-2024").is_err());
    }

    #[test]
    fn test_window_args() {
        let args = WindowArgs::default();
        assert_eq!(args.to_window().unwrap(), SyncWindow::All);

        let args = WindowArgs {
            start_date: None,
            days: Some(7),
        };
        assert_eq!(args.to_window().unwrap(), SyncWindow::LastDays(7));

        let args = WindowArgs {
            start_date: Some("01-15-2024".to_string()),
            days: None,
        };
        assert_eq!(
            args.to_window().unwrap(),
            SyncWindow::Since(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );
    }

    #[test]
    fn test_load_config_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.toml");
        std::fs::write(
            &file,
            "[letterboxd]\nusername = \"alice\"\n\n[scheduler]\nlookback_days = 14\n",
        )
        .unwrap();

        let (config, _) = load_config(Some(&file)).unwrap();
        assert_eq!(config.scheduler.lookback_days, 14);
        assert!(config.sync.sync_history);
    }
}
