use chrono::{DateTime, Duration, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Hour of day (UTC) assigned to every watch. The diary only records a
/// calendar date, while Trakt wants a full timestamp.
pub const WATCHED_HOUR_UTC: i64 = 12;

/// A single diary entry normalized for Trakt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovieRecord {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(serialize_with = "serialize_watched_at")]
    pub watched_at: DateTime<Utc>,
    /// Trakt scale (1-10), doubled from half-star ratings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

impl MovieRecord {
    /// Build a record for a film watched on `watched_on`.
    ///
    /// A year of zero is stored as unknown.
    pub fn new(title: impl Into<String>, year: Option<u32>, watched_on: NaiveDate, rating: Option<u8>) -> Self {
        Self {
            title: title.into(),
            year: year.filter(|y| *y > 0),
            watched_at: noon_utc(watched_on),
            rating,
        }
    }

    /// Calendar date of the watch
    pub fn watched_on(&self) -> NaiveDate {
        self.watched_at.date_naive()
    }

    /// `YYYY-MM-DDT12:00:00.000Z`, the form Trakt receives
    pub fn watched_at_iso(&self) -> String {
        self.watched_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Display label such as `The Matrix (1999)`
    pub fn label(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({})", self.title, year),
            None => format!("{} (N/A)", self.title),
        }
    }
}

fn noon_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)) + Duration::hours(WATCHED_HOUR_UTC)
}

fn serialize_watched_at<S>(watched_at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&watched_at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_watched_at_is_noon_utc() {
        let record = MovieRecord::new("The Matrix", Some(1999), date(2024, 1, 15), None);
        assert_eq!(record.watched_at_iso(), "2024-01-15T12:00:00.000Z");
        assert_eq!(record.watched_on(), date(2024, 1, 15));
    }

    #[test]
    fn test_zero_year_is_unknown() {
        let record = MovieRecord::new("Nameless", Some(0), date(2024, 1, 15), None);
        assert_eq!(record.year, None);
        assert_eq!(record.label(), "Nameless (N/A)");
    }

    #[test]
    fn test_serialized_form() {
        let record = MovieRecord::new("Heat", Some(1995), date(2023, 12, 31), Some(9));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["watched_at"], "2023-12-31T12:00:00.000Z");
        assert_eq!(json["year"], 1995);
        assert_eq!(json["rating"], 9);

        let back: MovieRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
