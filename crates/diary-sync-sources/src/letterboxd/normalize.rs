use crate::error::ParseError;
use crate::letterboxd::feed::FeedEntry;
use chrono::{DateTime, NaiveDate, Utc};
use diary_sync_models::{half_stars_to_trakt, MovieRecord};
use tracing::{debug, info};

/// Separator between member name and film in free-text entry titles
const WATCHED_MARKER: &str = " watched ";
const RATED_MARKER: &str = "rated it";
const STARS_MARKER: &str = "star";

/// Turn one feed entry into a movie record.
///
/// Structured `letterboxd:*` fields win; the free-text title, publication
/// date and description are fallbacks.
pub fn normalize_entry(entry: &FeedEntry) -> Result<MovieRecord, ParseError> {
    let (title, title_year) = film_title(entry).ok_or(ParseError::MissingTitle)?;
    let watched_on = watched_date(entry).ok_or(ParseError::MissingWatchedDate)?;

    let year = entry
        .film_year
        .as_deref()
        .and_then(parse_year)
        .or(title_year);

    Ok(MovieRecord::new(title, year, watched_on, rating(entry)))
}

/// Normalize a whole feed, skipping entries that are not diary watches
pub fn normalize_entries(entries: &[FeedEntry]) -> Vec<MovieRecord> {
    let mut records = Vec::with_capacity(entries.len());
    let mut skipped = 0usize;

    for entry in entries {
        match normalize_entry(entry) {
            Ok(record) => {
                debug!(
                    "Added movie: {} watched on {}",
                    record.label(),
                    record.watched_at_iso()
                );
                records.push(record);
            }
            Err(reason) => {
                skipped += 1;
                debug!(
                    operation = "normalize",
                    title = entry.title.as_deref().unwrap_or("<untitled>"),
                    reason = %reason,
                    "Skipping feed entry"
                );
            }
        }
    }

    info!(
        operation = "normalize",
        records = records.len(),
        skipped,
        "Retrieved {} movies from Letterboxd",
        records.len()
    );
    records
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Title plus any year found in a free-text `(YYYY)` suffix
fn film_title(entry: &FeedEntry) -> Option<(String, Option<u32>)> {
    if let Some(title) = non_blank(entry.film_title.as_deref()) {
        return Some((title.to_string(), None));
    }

    let raw = non_blank(entry.title.as_deref())?;
    let (_, film) = raw.split_once(WATCHED_MARKER)?;
    let (title, year) = split_year_suffix(film.trim());
    if title.is_empty() {
        None
    } else {
        Some((title.to_string(), year))
    }
}

/// `Alien (1979)` → (`Alien`, 1979). A parenthesised suffix that is not a
/// year stays part of the title.
fn split_year_suffix(film: &str) -> (&str, Option<u32>) {
    if let Some(inner_end) = film.strip_suffix(')') {
        if let Some(open) = inner_end.rfind(" (") {
            if let Some(year) = parse_year(&inner_end[open + 2..]) {
                return (inner_end[..open].trim(), Some(year));
            }
        }
    }
    (film, None)
}

fn parse_year(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u32>().ok().filter(|year| *year > 0)
}

fn watched_date(entry: &FeedEntry) -> Option<NaiveDate> {
    let structured = non_blank(entry.watched_date.as_deref())
        .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok());

    structured.or_else(|| {
        let published = non_blank(entry.published.as_deref())?;
        DateTime::parse_from_rfc2822(published)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    })
}

fn rating(entry: &FeedEntry) -> Option<u8> {
    let structured = non_blank(entry.member_rating.as_deref())
        .and_then(|raw| raw.parse::<f64>().ok())
        .and_then(half_stars_to_trakt);

    structured.or_else(|| {
        entry
            .description
            .as_deref()
            .and_then(stars_from_description)
            .and_then(half_stars_to_trakt)
    })
}

/// Pull `3.5` out of text like `... rated it 3.5 stars`
fn stars_from_description(description: &str) -> Option<f64> {
    let lower = description.to_lowercase();
    let after = &lower[lower.find(RATED_MARKER)? + RATED_MARKER.len()..];
    let value = &after[..after.find(STARS_MARKER)?];
    value.trim().parse::<f64>().ok()
}
