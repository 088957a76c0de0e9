// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Timestamp helpers for profile and scan documents.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 with millisecond precision and a `Z`
/// suffix. Fixed-width output keeps string order equal to time order.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time, formatted for `createdAt` fields.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_sorts_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2026, 1, 9, 23, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();

        assert_eq!(format_utc_rfc3339(earlier), "2026-01-09T23:59:59.000Z");
        assert!(format_utc_rfc3339(earlier) < format_utc_rfc3339(later));
    }
}
