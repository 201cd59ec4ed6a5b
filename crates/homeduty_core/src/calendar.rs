//! Calendar arithmetic for weekly rotation and the duty deadline.
//!
//! # Responsibility
//! - Compute ISO week numbers and Monday-aligned week starts.
//! - Detect week and month boundary crossings.
//! - Derive the next duty deadline and a countdown toward it.
//!
//! # Invariants
//! - All functions are pure; callers supply the observation time.
//! - Week starts are always Mondays.

use crate::house::DUTY_DEADLINE_HOUR;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// ISO 8601 week number of `date` (1..=53).
pub fn iso_week_number(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

/// Monday of the week containing `date`.
pub fn monday_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// True when `today` lies in a strictly later week than `last_week_start`.
///
/// `last_week_start` is expected to already be a Monday; the comparison is
/// against the Monday of `today`'s week, so a stale (non-Monday) value still
/// resolves correctly.
pub fn is_new_week(last_week_start: NaiveDate, today: NaiveDate) -> bool {
    monday_of_week(today) > monday_of_week(last_week_start)
}

/// True when `today` falls in a different calendar month (or year) than `last`.
pub fn is_new_month(last: NaiveDate, today: NaiveDate) -> bool {
    today.month() != last.month() || today.year() != last.year()
}

/// Zero-based day-of-week index with Sunday = 0, matching the stored
/// `dayOfWeek` field of weekly entries.
pub fn day_of_week_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Next duty deadline at or after `now`: today at the deadline hour, or the
/// same hour tomorrow once it has passed.
pub fn next_deadline(now: NaiveDateTime) -> NaiveDateTime {
    let deadline_time =
        NaiveTime::from_hms_opt(DUTY_DEADLINE_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);
    let today_deadline = now.date().and_time(deadline_time);
    if now < today_deadline {
        today_deadline
    } else {
        today_deadline + Duration::days(1)
    }
}

/// True once today's deadline hour has been reached.
pub fn is_past_deadline(now: NaiveDateTime) -> bool {
    now.hour() >= DUTY_DEADLINE_HOUR
}

/// How pressing the remaining time before the deadline is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    /// Less than one hour left.
    Critical,
    /// Less than three hours left.
    Warning,
    Normal,
}

/// Countdown toward the next duty deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineCountdown {
    pub remaining: Duration,
    pub urgency: Urgency,
}

impl DeadlineCountdown {
    /// `HH:MM:SS` rendering of the remaining time.
    pub fn formatted(&self) -> String {
        let total_seconds = self.remaining.num_seconds().max(0);
        format!(
            "{:02}:{:02}:{:02}",
            total_seconds / 3600,
            (total_seconds % 3600) / 60,
            total_seconds % 60
        )
    }
}

/// Computes the countdown from `now` to the next deadline.
pub fn deadline_countdown(now: NaiveDateTime) -> DeadlineCountdown {
    let remaining = next_deadline(now) - now;
    let urgency = if remaining < Duration::hours(1) {
        Urgency::Critical
    } else if remaining < Duration::hours(3) {
        Urgency::Warning
    } else {
        Urgency::Normal
    };
    DeadlineCountdown { remaining, urgency }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monday_of_week_handles_every_weekday() {
        // 2025-01-06 is a Monday.
        let monday = date(2025, 1, 6);
        for offset in 0..7 {
            let day = monday + Duration::days(offset);
            assert_eq!(monday_of_week(day), monday, "offset {offset}");
        }
    }

    #[test]
    fn monday_of_week_sunday_rolls_back_six_days() {
        assert_eq!(monday_of_week(date(2025, 1, 12)), date(2025, 1, 6));
    }

    #[test]
    fn iso_week_number_matches_known_dates() {
        assert_eq!(iso_week_number(date(2025, 1, 6)), 2);
        // ISO week 1 of 2026 starts on 2025-12-29.
        assert_eq!(iso_week_number(date(2025, 12, 29)), 1);
    }

    #[test]
    fn new_week_is_strictly_later_monday() {
        let last_monday = date(2025, 1, 6);
        assert!(!is_new_week(last_monday, date(2025, 1, 12)));
        assert!(is_new_week(last_monday, date(2025, 1, 13)));
        assert!(!is_new_week(last_monday, date(2025, 1, 6)));
    }

    #[test]
    fn new_month_checks_month_and_year() {
        assert!(is_new_month(date(2025, 1, 31), date(2025, 2, 1)));
        assert!(is_new_month(date(2025, 2, 1), date(2026, 2, 1)));
        assert!(!is_new_month(date(2025, 2, 1), date(2025, 2, 28)));
    }

    #[test]
    fn day_of_week_index_is_sunday_based() {
        assert_eq!(day_of_week_index(date(2025, 1, 5)), 0); // Sunday
        assert_eq!(day_of_week_index(date(2025, 1, 6)), 1); // Monday
        assert_eq!(day_of_week_index(date(2025, 1, 11)), 6); // Saturday
    }

    #[test]
    fn next_deadline_rolls_to_tomorrow_after_hour() {
        let before = date(2025, 1, 6).and_hms_opt(21, 59, 0).unwrap();
        let after = date(2025, 1, 6).and_hms_opt(22, 0, 0).unwrap();
        assert_eq!(
            next_deadline(before),
            date(2025, 1, 6).and_hms_opt(22, 0, 0).unwrap()
        );
        assert_eq!(
            next_deadline(after),
            date(2025, 1, 7).and_hms_opt(22, 0, 0).unwrap()
        );
    }

    #[test]
    fn countdown_urgency_thresholds() {
        let critical = date(2025, 1, 6).and_hms_opt(21, 30, 0).unwrap();
        let warning = date(2025, 1, 6).and_hms_opt(20, 0, 0).unwrap();
        let normal = date(2025, 1, 6).and_hms_opt(9, 0, 0).unwrap();
        assert_eq!(deadline_countdown(critical).urgency, Urgency::Critical);
        assert_eq!(deadline_countdown(warning).urgency, Urgency::Warning);
        assert_eq!(deadline_countdown(normal).urgency, Urgency::Normal);
    }

    #[test]
    fn countdown_formats_as_hms() {
        let now = date(2025, 1, 6).and_hms_opt(20, 30, 15).unwrap();
        assert_eq!(deadline_countdown(now).formatted(), "01:29:45");
    }

    #[test]
    fn past_deadline_gate() {
        assert!(!is_past_deadline(
            date(2025, 1, 6).and_hms_opt(21, 59, 59).unwrap()
        ));
        assert!(is_past_deadline(
            date(2025, 1, 6).and_hms_opt(22, 0, 0).unwrap()
        ));
    }
}
