//! Query-window planning for the sync cycle.
//!
//! The planner decides how far back to look on each cycle and splits the resulting window into
//! chunks the platform will answer reliably. Long windows time out or get silently truncated
//! server-side, so the window is walked in sub-windows of at most seven days, newest first —
//! recent orders are the ones operators are waiting on.
use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};

/// How far back a cycle reaches when there is no resume point at all (fresh database, or every
/// machine is broken).
pub const DEFAULT_LOOKBACK_DAYS: i64 = 90;
pub const MAX_CHUNK_DAYS: i64 = 7;

/// Computes the `[start, end)` query window for one account's sync cycle.
///
/// The end is the day after an explicit end date (making it inclusive), or `now` rounded down to
/// the minute plus a day and a minute, so that in-flight orders near the boundary are never
/// excluded by clock skew between us and the platform.
///
/// The start is an explicit start date at midnight, else the resume point (clamped to a day ago
/// if the database holds a timestamp from the future), else `now` less the default lookback.
pub fn compute_window(
    resume: Option<DateTime<Utc>>,
    start_override: Option<NaiveDate>,
    end_override: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let end = match end_override {
        Some(date) => (date + Duration::days(1)).and_hms_opt(0, 0, 0).unwrap_or_default().and_utc(),
        None => truncate_to_minute(now) + Duration::days(1) + Duration::minutes(1),
    };
    let start = match (start_override, resume) {
        (Some(date), _) => date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc(),
        (None, Some(resume)) => {
            if resume > now {
                now - Duration::days(1)
            } else {
                resume
            }
        },
        (None, None) => now - Duration::days(DEFAULT_LOOKBACK_DAYS),
    };
    (start, end)
}

/// Splits `[start, end)` into sub-windows of at most [`MAX_CHUNK_DAYS`] days, walking backward
/// from `end`. The most recent chunk comes first and the chunks tile the window exactly.
pub fn seven_day_chunks(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut chunks = Vec::new();
    let mut chunk_end = end;
    while chunk_end > start {
        let chunk_start = std::cmp::max(start, chunk_end - Duration::days(MAX_CHUNK_DAYS));
        chunks.push((chunk_start, chunk_end));
        chunk_end = chunk_start;
    }
    chunks
}

fn truncate_to_minute(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt - Duration::seconds(i64::from(dt.second())) - Duration::nanoseconds(i64::from(dt.timestamp_subsec_nanos()))
}

#[cfg(test)]
mod test {
    use chrono::{NaiveDate, TimeZone, Timelike};

    use super::*;

    fn dt(s: &str) -> DateTime<Utc> {
        chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap().and_utc()
    }

    #[test]
    fn a_fourteen_day_window_yields_two_chunks() {
        let end = dt("2024-06-15 00:00:00");
        let start = end - Duration::days(14);
        let chunks = seven_day_chunks(start, end);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], (dt("2024-06-08 00:00:00"), dt("2024-06-15 00:00:00")));
        assert_eq!(chunks[1], (dt("2024-06-01 00:00:00"), dt("2024-06-08 00:00:00")));
    }

    #[test]
    fn chunks_tile_the_window_newest_first() {
        let start = dt("2024-03-01 06:30:00");
        let end = dt("2024-03-11 06:30:00");
        let chunks = seven_day_chunks(start, end);
        assert_eq!(chunks.len(), 2);
        // Newest first, and the remainder chunk carries the leftover three days.
        assert_eq!(chunks[0], (dt("2024-03-04 06:30:00"), end));
        assert_eq!(chunks[1], (start, dt("2024-03-04 06:30:00")));
    }

    #[test]
    fn an_empty_window_yields_no_chunks() {
        let t = dt("2024-03-01 00:00:00");
        assert!(seven_day_chunks(t, t).is_empty());
        assert!(seven_day_chunks(t, t - Duration::days(1)).is_empty());
    }

    #[test]
    fn explicit_dates_give_an_inclusive_single_chunk_window() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let now = dt("2024-05-01 12:00:00");
        let (s, e) = compute_window(None, Some(start), Some(end), now);
        assert_eq!(s, dt("2024-01-01 00:00:00"));
        assert_eq!(e, dt("2024-01-04 00:00:00"));
        assert_eq!(seven_day_chunks(s, e), vec![(s, e)]);
    }

    #[test]
    fn resume_point_becomes_the_start() {
        let now = dt("2024-05-01 12:00:30");
        let resume = dt("2024-04-20 08:00:00");
        let (s, e) = compute_window(Some(resume), None, None, now);
        assert_eq!(s, resume);
        assert_eq!(e, dt("2024-05-02 12:01:00"));
    }

    #[test]
    fn a_future_resume_point_is_clamped_to_a_day_ago() {
        let now = dt("2024-05-01 12:00:00");
        let resume = dt("2024-05-09 00:00:00");
        let (s, _) = compute_window(Some(resume), None, None, now);
        assert_eq!(s, now - Duration::days(1));
    }

    #[test]
    fn no_resume_point_means_the_default_lookback() {
        let now = dt("2024-05-01 12:00:00");
        let (s, _) = compute_window(None, None, None, now);
        assert_eq!(s, now - Duration::days(DEFAULT_LOOKBACK_DAYS));
    }

    #[test]
    fn end_is_truncated_to_the_minute() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 59).unwrap().with_nanosecond(123_456_789).unwrap();
        let (_, e) = compute_window(None, None, None, now);
        assert_eq!(e, dt("2024-05-02 12:01:00"));
    }
}
