//! Weekly rotation schedule generator.
//!
//! # Responsibility
//! - Build a Monday-aligned 7-day schedule from the fixed roster.
//! - Carry round-robin fairness across week boundaries via the rotation
//!   offset.
//!
//! # Invariants
//! - The first assignee of a week is the roster successor of the previous
//!   week's last assignee.
//! - The emitted `rotation_offset` is the roster index of the week's last
//!   assignee.

use crate::calendar::{iso_week_number, monday_of_week};
use crate::house::HOUSEMATES;
use crate::model::duty::{zeroed_stats, DutyStatus, DutyWeek, MonthlyStats, WeeklyEntry};
use chrono::{Duration, NaiveDate, NaiveDateTime};

const WEEK_DAYS: usize = 7;

/// Roster index the new week starts from, given the previous week's offset.
pub fn start_index(previous_offset: Option<usize>) -> usize {
    match previous_offset {
        Some(offset) => (offset + 1) % HOUSEMATES.len(),
        None => 0,
    }
}

/// Builds the duty week containing `reference`.
///
/// # Contract
/// - The schedule runs Monday through Sunday with `day_of_week` stored
///   Sunday-based (Monday=1 … Sunday=0).
/// - `existing_stats` is carried over when present, else zeroed for the
///   whole roster.
/// - `now` stamps `last_updated`; `last_action_date` starts cleared.
pub fn build_week(
    reference: NaiveDate,
    existing_stats: Option<MonthlyStats>,
    previous_offset: Option<usize>,
    now: NaiveDateTime,
) -> DutyWeek {
    let monday = monday_of_week(reference);
    let start = start_index(previous_offset);

    let week_schedule = (0..WEEK_DAYS)
        .map(|i| WeeklyEntry {
            day_of_week: ((i + 1) % WEEK_DAYS) as u8,
            date: monday + Duration::days(i as i64),
            person: HOUSEMATES[(start + i) % HOUSEMATES.len()].name.to_string(),
            status: DutyStatus::Pending,
            completed_at: None,
        })
        .collect();

    DutyWeek {
        week_start_date: monday,
        week_number: iso_week_number(reference),
        week_schedule,
        monthly_stats: existing_stats.unwrap_or_else(zeroed_stats),
        last_action_date: None,
        last_updated: now,
        rotation_offset: (start + WEEK_DAYS - 1) % HOUSEMATES.len(),
    }
}
