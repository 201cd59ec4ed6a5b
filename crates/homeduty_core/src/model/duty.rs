//! Weekly duty schedule model and per-day state machine.
//!
//! # Responsibility
//! - Define the shared `trashDuty` document shape.
//! - Enforce the one-action-per-calendar-day rule and its same-day undo.
//!
//! # Invariants
//! - `week_schedule` holds one entry per day with unique `day_of_week`.
//! - `last_action_date` is set iff an action was recorded and not undone;
//!   it gates both button actions and the auto-miss check.
//! - Monthly counters never go below zero, even if undo arrives against
//!   state written out of order by another device.

use crate::calendar::{day_of_week_index, is_past_deadline};
use crate::house::HOUSEMATES;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Status of a single day's duty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyStatus {
    Pending,
    Done,
    Missed,
}

/// A recordable action on today's duty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DutyAction {
    Done,
    Missed,
}

impl DutyAction {
    pub fn status(self) -> DutyStatus {
        match self {
            Self::Done => DutyStatus::Done,
            Self::Missed => DutyStatus::Missed,
        }
    }
}

/// One day's assignment within the 7-day window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyEntry {
    /// 0 = Sunday .. 6 = Saturday; unique within a week.
    pub day_of_week: u8,
    pub date: NaiveDate,
    pub person: String,
    pub status: DutyStatus,
    /// Set when the day was marked done or missed; cleared by undo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<NaiveDateTime>,
}

/// Done/missed counters for one housemate in the current month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonStats {
    pub done: u32,
    pub missed: u32,
}

/// Cumulative counters for the current month, keyed by housemate name.
pub type MonthlyStats = BTreeMap<String, PersonStats>;

/// Monthly stats with every roster member zeroed.
pub fn zeroed_stats() -> MonthlyStats {
    HOUSEMATES
        .iter()
        .map(|member| (member.name.to_string(), PersonStats::default()))
        .collect()
}

/// Rejected duty transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// An action was already recorded on the given day.
    ActionAlreadyRecorded { date: NaiveDate },
    /// The schedule holds no entry for today's weekday.
    NoEntryForToday { day_of_week: u8 },
    /// Undo requested with no same-day action on record.
    NothingToUndo,
}

impl Display for TransitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ActionAlreadyRecorded { date } => {
                write!(f, "an action was already recorded on {date}")
            }
            Self::NoEntryForToday { day_of_week } => {
                write!(f, "no schedule entry for weekday index {day_of_week}")
            }
            Self::NothingToUndo => write!(f, "no same-day action to undo"),
        }
    }
}

impl Error for TransitionError {}

/// Outcome of a recorded or undone action, for notification and display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAction {
    pub person: String,
    pub action: DutyAction,
}

/// The shared weekly duty document (`trashDuty`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DutyWeek {
    /// Monday of this schedule's week.
    pub week_start_date: NaiveDate,
    /// ISO week number of `week_start_date`.
    pub week_number: u32,
    pub week_schedule: Vec<WeeklyEntry>,
    pub monthly_stats: MonthlyStats,
    /// Day on which the single permitted action was recorded, if any.
    pub last_action_date: Option<NaiveDate>,
    pub last_updated: NaiveDateTime,
    /// Roster index of this week's last assignee; seeds next week's start.
    pub rotation_offset: usize,
}

impl DutyWeek {
    /// Entry for the given weekday index, if scheduled.
    pub fn entry_for_day(&self, day_of_week: u8) -> Option<&WeeklyEntry> {
        self.week_schedule
            .iter()
            .find(|entry| entry.day_of_week == day_of_week)
    }

    /// Entry for `date`'s weekday.
    pub fn entry_for_date(&self, date: NaiveDate) -> Option<&WeeklyEntry> {
        self.entry_for_day(day_of_week_index(date))
    }

    fn entry_for_day_mut(&mut self, day_of_week: u8) -> Option<&mut WeeklyEntry> {
        self.week_schedule
            .iter_mut()
            .find(|entry| entry.day_of_week == day_of_week)
    }

    /// True while no action has been recorded on `today`.
    pub fn can_record_action(&self, today: NaiveDate) -> bool {
        self.last_action_date != Some(today)
    }

    /// Records done/missed for today's entry.
    ///
    /// # Contract
    /// - Rejected when an action was already recorded today.
    /// - Sets the entry status and `completed_at`, bumps the assignee's
    ///   monthly counter, and stamps `last_action_date`.
    pub fn record_action(
        &mut self,
        action: DutyAction,
        now: NaiveDateTime,
    ) -> Result<RecordedAction, TransitionError> {
        let today = now.date();
        if !self.can_record_action(today) {
            return Err(TransitionError::ActionAlreadyRecorded { date: today });
        }

        let day_of_week = day_of_week_index(today);
        let entry = self
            .entry_for_day_mut(day_of_week)
            .ok_or(TransitionError::NoEntryForToday { day_of_week })?;

        entry.status = action.status();
        entry.completed_at = Some(now);
        let person = entry.person.clone();

        let stats = self.monthly_stats.entry(person.clone()).or_default();
        match action {
            DutyAction::Done => stats.done += 1,
            DutyAction::Missed => stats.missed += 1,
        }

        self.last_action_date = Some(today);
        self.last_updated = now;

        Ok(RecordedAction { person, action })
    }

    /// True when a same-day action exists that undo may revert.
    pub fn can_undo(&self, today: NaiveDate) -> bool {
        self.last_action_date == Some(today)
            && self
                .entry_for_date(today)
                .is_some_and(|entry| entry.status != DutyStatus::Pending)
    }

    /// Reverts today's recorded action back to pending.
    ///
    /// # Contract
    /// - Allowed only while `last_action_date` is today and the entry is
    ///   not pending; strict inverse of the preceding [`record_action`].
    /// - Counter decrement saturates at zero.
    ///
    /// [`record_action`]: DutyWeek::record_action
    pub fn undo_today(&mut self, now: NaiveDateTime) -> Result<RecordedAction, TransitionError> {
        let today = now.date();
        if self.last_action_date != Some(today) {
            return Err(TransitionError::NothingToUndo);
        }

        let day_of_week = day_of_week_index(today);
        let entry = self
            .entry_for_day_mut(day_of_week)
            .ok_or(TransitionError::NoEntryForToday { day_of_week })?;

        let undone = match entry.status {
            DutyStatus::Done => DutyAction::Done,
            DutyStatus::Missed => DutyAction::Missed,
            DutyStatus::Pending => return Err(TransitionError::NothingToUndo),
        };

        entry.status = DutyStatus::Pending;
        entry.completed_at = None;
        let person = entry.person.clone();

        let stats = self.monthly_stats.entry(person.clone()).or_default();
        match undone {
            DutyAction::Done => stats.done = stats.done.saturating_sub(1),
            DutyAction::Missed => stats.missed = stats.missed.saturating_sub(1),
        }

        self.last_action_date = None;
        self.last_updated = now;

        Ok(RecordedAction {
            person,
            action: undone,
        })
    }

    /// True when the auto-miss check should flip today's entry to missed:
    /// past the deadline, still pending, and no action recorded today.
    pub fn auto_miss_due(&self, now: NaiveDateTime) -> bool {
        if !is_past_deadline(now) {
            return false;
        }
        if !self.can_record_action(now.date()) {
            return false;
        }
        self.entry_for_date(now.date())
            .is_some_and(|entry| entry.status == DutyStatus::Pending)
    }

    /// Zeroes every monthly counter in place, keeping the schedule.
    pub fn reset_monthly_stats(&mut self, now: NaiveDateTime) {
        self.monthly_stats = zeroed_stats();
        self.last_updated = now;
    }
}
