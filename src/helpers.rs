//! Small shared utilities for timestamps and calendar-day bucketing.
//!
//! All timestamps in the store are RFC 3339 UTC strings; snapshot dates and
//! day buckets are `YYYY-MM-DD`. Day bucketing happens in the site's
//! configured timezone so a payment made at 23:30 Nairobi time lands on the
//! Nairobi calendar date, not the UTC one.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use chrono_tz::Tz;

/// Today's date in UTC, `YYYY-MM-DD`.
pub fn today_utc() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Render the age of an RFC 3339 timestamp in human-readable form.
/// Unparseable input is returned verbatim.
pub fn relative_time(timestamp: &str) -> String {
    let Ok(created) = DateTime::parse_from_rfc3339(timestamp) else {
        return timestamp.to_string();
    };
    let diff = Utc::now().signed_duration_since(created.with_timezone(&Utc));

    let days = diff.num_days();
    if days > 0 {
        return format!("{} day{} ago", days, if days != 1 { "s" } else { "" });
    }
    let hours = diff.num_hours();
    if hours > 0 {
        return format!("{} hour{} ago", hours, if hours != 1 { "s" } else { "" });
    }
    let minutes = diff.num_minutes();
    if minutes > 0 {
        return format!("{} minute{} ago", minutes, if minutes != 1 { "s" } else { "" });
    }
    "Just now".to_string()
}

/// Bucket an RFC 3339 timestamp to a calendar date in `tz`.
/// Returns `None` for unparseable input.
pub fn local_day(timestamp: &str, tz: Tz) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(timestamp).ok()?;
    Some(parsed.with_timezone(&tz).format("%Y-%m-%d").to_string())
}

/// First instant of the current month in `tz`, as an RFC 3339 UTC timestamp.
///
/// Used as the lower bound for the dashboard's current-month metrics.
pub fn month_start(now: DateTime<Utc>, tz: Tz) -> String {
    let local = now.with_timezone(&tz);
    tz.with_ymd_and_hms(local.year(), local.month(), 1, 0, 0, 0)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339())
        .unwrap_or_else(|| now.to_rfc3339())
}

/// Lower bound of a trailing window of `days` calendar days in `tz`, as an
/// RFC 3339 UTC timestamp.
///
/// Anchored at local midnight of `days - 1` days before today, so the
/// window covers at most `days` distinct local dates including today.
pub fn window_start(now: DateTime<Utc>, days: u32, tz: Tz) -> String {
    let local_today = now.with_timezone(&tz).date_naive();
    let first_day = local_today - Duration::days(i64::from(days) - 1);
    tz.with_ymd_and_hms(first_day.year(), first_day.month(), first_day.day(), 0, 0, 0)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339())
        .unwrap_or_else(|| (now - Duration::days(i64::from(days))).to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_time_days() {
        let old = (Utc::now() - Duration::days(3)).to_rfc3339();
        assert_eq!(relative_time(&old), "3 days ago");

        let yesterday = (Utc::now() - Duration::days(1)).to_rfc3339();
        assert_eq!(relative_time(&yesterday), "1 day ago");
    }

    #[test]
    fn test_relative_time_hours_and_minutes() {
        let hours = (Utc::now() - Duration::hours(2)).to_rfc3339();
        assert_eq!(relative_time(&hours), "2 hours ago");

        let minutes = (Utc::now() - Duration::minutes(5)).to_rfc3339();
        assert_eq!(relative_time(&minutes), "5 minutes ago");

        let now = Utc::now().to_rfc3339();
        assert_eq!(relative_time(&now), "Just now");
    }

    #[test]
    fn test_relative_time_garbage_passthrough() {
        assert_eq!(relative_time("not-a-timestamp"), "not-a-timestamp");
    }

    #[test]
    fn test_local_day_shifts_across_midnight() {
        // 22:30 UTC is 01:30 the next day in Nairobi (UTC+3)
        let day = local_day("2026-03-10T22:30:00+00:00", chrono_tz::Africa::Nairobi);
        assert_eq!(day.as_deref(), Some("2026-03-11"));

        let same = local_day("2026-03-10T10:00:00+00:00", chrono_tz::Africa::Nairobi);
        assert_eq!(same.as_deref(), Some("2026-03-10"));

        assert!(local_day("garbage", chrono_tz::Africa::Nairobi).is_none());
    }

    #[test]
    fn test_month_start_is_first_of_month() {
        let now = Utc.with_ymd_and_hms(2026, 8, 15, 12, 0, 0).unwrap();
        let start = month_start(now, chrono_tz::Africa::Nairobi);
        // 1 Aug 00:00 Nairobi == 31 Jul 21:00 UTC
        let parsed = DateTime::parse_from_rfc3339(&start).expect("parse");
        let local = parsed.with_timezone(&chrono_tz::Africa::Nairobi);
        assert_eq!(local.day(), 1);
        assert_eq!(local.month(), 8);
    }

    #[test]
    fn test_window_start_covers_exactly_n_local_dates() {
        let tz = chrono_tz::Africa::Nairobi;
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap();
        let start = window_start(now, 3, tz);

        let parsed = DateTime::parse_from_rfc3339(&start).expect("parse");
        let local = parsed.with_timezone(&tz);
        // 3-day window ending today (Aug 7 local) starts at Aug 5 midnight
        assert_eq!(local.format("%Y-%m-%d %H:%M").to_string(), "2026-08-05 00:00");
        assert!(start < now.to_rfc3339());
    }
}
