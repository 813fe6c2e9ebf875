//! Database utility functions
//!
//! Timestamps live in TEXT columns; the application always writes
//! RFC3339, but columns populated by `SQLite` defaults use its own
//! "YYYY-MM-DD HH:MM:SS" shape, so reads accept both.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a datetime from RFC3339 or `SQLite`'s default format.
///
/// # Examples
/// ```
/// use warden::infrastructure::database::utils::parse_datetime;
///
/// let dt1 = parse_datetime("2026-03-14T09:26:53Z").unwrap();
/// let dt2 = parse_datetime("2026-03-14 09:26:53").unwrap();
/// assert_eq!(dt1, dt2);
/// ```
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(naive_dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive_dt, Utc));
    }

    // Surface the RFC3339 error when nothing matched
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}
