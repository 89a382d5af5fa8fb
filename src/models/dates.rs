//! Date normalization and age derivation

use chrono::{DateTime, Datelike, NaiveDate};

/// Plain date form used in drafts and on the wire
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Ages above this are treated as data-entry mistakes
pub const MAX_AGE: i32 = 125;

/// Parse a date from `YYYY-MM-DD` or a full ISO-8601 timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Some(date);
    }
    // Timestamps keep the calendar date they were written with
    if let Some(date) = trimmed
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, DATE_FORMAT).ok())
    {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Normalize any accepted date form to `YYYY-MM-DD`; empty when unparseable.
pub fn normalize_date(raw: &str) -> String {
    parse_date(raw).map(format_date).unwrap_or_default()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Whole years elapsed between `birth` and `today`.
///
/// Returns `None` for future birth dates and ages above [`MAX_AGE`].
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    if !(0..=MAX_AGE).contains(&years) {
        return None;
    }
    u32::try_from(years).ok()
}

/// Today's date in the local timezone
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Serde adapter for optional dates that tolerates timestamps and garbage.
pub mod option_date {
    use super::{format_date, parse_date};
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&format_date(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse_date))
    }
}
