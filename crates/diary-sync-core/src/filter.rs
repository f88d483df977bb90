use chrono::{Duration, NaiveDate};
use diary_sync_models::MovieRecord;
use std::collections::HashSet;
use std::fmt;

/// Which part of the diary a run covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncWindow {
    #[default]
    All,
    /// Watches on or after this date
    Since(NaiveDate),
    /// Watches within the last `n` days, counted from today
    LastDays(u32),
}

impl SyncWindow {
    /// Earliest watched date kept, or `None` for no limit
    pub fn cutoff(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            SyncWindow::All => None,
            SyncWindow::Since(date) => Some(*date),
            SyncWindow::LastDays(days) => today.checked_sub_signed(Duration::days(i64::from(*days))),
        }
    }
}

impl fmt::Display for SyncWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncWindow::All => write!(f, "all entries"),
            SyncWindow::Since(date) => write!(f, "since {}", date),
            SyncWindow::LastDays(days) => write!(f, "last {} days", days),
        }
    }
}

/// Keep records watched on or after `cutoff`
pub fn filter_since(records: Vec<MovieRecord>, cutoff: Option<NaiveDate>) -> Vec<MovieRecord> {
    match cutoff {
        None => records,
        Some(cutoff) => records
            .into_iter()
            .filter(|record| record.watched_on() >= cutoff)
            .collect(),
    }
}

/// Collapse repeated diary entries (same title, year and day) to the first one
pub fn remove_duplicates(records: Vec<MovieRecord>) -> Vec<MovieRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert((record.title.to_lowercase(), record.year, record.watched_on())))
        .collect()
}
