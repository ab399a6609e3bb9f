// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time as RFC3339.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Calendar-date form used in stored reservations.
pub fn format_calendar_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Interpret a stored or user-entered date as a calendar day.
///
/// Accepts `YYYY-MM-DD`, a full RFC3339 timestamp (its UTC day), and
/// `MM/DD/YYYY`. Anything else is `None`.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
        .or_else(|| NaiveDate::parse_from_str(raw, "%m/%d/%Y").ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_dates_in_all_accepted_shapes() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(parse_calendar_date("2025-03-14"), Some(expected));
        assert_eq!(parse_calendar_date("2025-03-14T08:30:00Z"), Some(expected));
        assert_eq!(parse_calendar_date("03/14/2025"), Some(expected));
        assert_eq!(parse_calendar_date(" 2025-03-14 "), Some(expected));
    }

    #[test]
    fn unparseable_dates_are_none() {
        assert_eq!(parse_calendar_date(""), None);
        assert_eq!(parse_calendar_date("N/A"), None);
        assert_eq!(parse_calendar_date("2025-13-01"), None);
    }

    #[test]
    fn rfc3339_uses_z_suffix() {
        let dt = DateTime::parse_from_rfc3339("2025-01-02T03:04:05+00:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_utc_rfc3339(dt), "2025-01-02T03:04:05Z");
    }
}
