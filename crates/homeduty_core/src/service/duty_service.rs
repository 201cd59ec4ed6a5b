//! Duty use-case service: week lifecycle and the daily action surface.
//!
//! # Responsibility
//! - Bootstrap and roll the shared weekly schedule.
//! - Apply done/missed/undo/auto-miss transitions and persist them.
//! - Register device push tokens and fan out transition notifications.
//!
//! # Invariants
//! - Week initialization and rollover use conditional writes so racing
//!   devices cannot double-initialize; all other writes are
//!   last-writer-wins full-document overwrites.
//! - Undo is refused for non-admin actors before any storage access.

use crate::calendar::{is_new_month, is_new_week};
use crate::house::{Housemate, Role};
use crate::model::duty::{DutyAction, DutyWeek, RecordedAction, TransitionError};
use crate::notify::{NotificationDispatcher, NotificationPayload, NotifyAction};
use crate::rotation::build_week;
use crate::store::doc_store::{paths, DocumentStore, StoreError, Versioned};
use chrono::NaiveDateTime;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type DutyResult<T> = Result<T, DutyError>;

/// Errors from duty use-case operations.
#[derive(Debug)]
pub enum DutyError {
    Store(StoreError),
    Transition(TransitionError),
    /// Undo attempted by a non-admin housemate.
    Unauthorized { person: String },
    /// An action was attempted before the week document exists.
    MissingWeek,
}

impl Display for DutyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Transition(err) => write!(f, "{err}"),
            Self::Unauthorized { person } => {
                write!(f, "{person} is not allowed to undo duty actions")
            }
            Self::MissingWeek => write!(f, "no duty week has been initialized"),
        }
    }
}

impl Error for DutyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Transition(err) => Some(err),
            Self::Unauthorized { .. } | Self::MissingWeek => None,
        }
    }
}

impl From<StoreError> for DutyError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<TransitionError> for DutyError {
    fn from(value: TransitionError) -> Self {
        Self::Transition(value)
    }
}

/// Stored under `pushTokens/{member}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushTokenRecord {
    pub token: String,
    pub last_updated: NaiveDateTime,
}

/// Use-case service for the weekly duty document.
pub struct DutyService<S: DocumentStore> {
    store: S,
    dispatcher: Option<NotificationDispatcher>,
    device_token: Option<String>,
}

impl<S: DocumentStore> DutyService<S> {
    /// Creates a service with notifications disabled.
    pub fn new(store: S) -> Self {
        Self {
            store,
            dispatcher: None,
            device_token: None,
        }
    }

    /// Enables push dispatch for this device.
    pub fn with_notifications(
        mut self,
        dispatcher: NotificationDispatcher,
        device_token: impl Into<String>,
    ) -> Self {
        self.dispatcher = Some(dispatcher);
        self.device_token = Some(device_token.into());
        self
    }

    /// Loads the current week, creating or rolling it as needed.
    ///
    /// # Contract
    /// - No stored week: builds the initial schedule with a create-only
    ///   write; losing that race returns the winner's document.
    /// - Stored week older than this week: builds the successor seeded by
    ///   the stored rotation offset, carrying stats unless the month also
    ///   changed.
    /// - Month changed mid-week: resets monthly stats in place, keeping
    ///   the schedule.
    pub fn ensure_current_week(&self, now: NaiveDateTime) -> DutyResult<Versioned<DutyWeek>> {
        self.stamp_current_date(now);
        let today = now.date();

        let Some(current) = self.store.get::<DutyWeek>(paths::TRASH_DUTY)? else {
            let week = build_week(today, None, None, now);
            return match self.store.put(paths::TRASH_DUTY, Some(0), &week) {
                Ok(version) => {
                    info!(
                        "event=week_init module=duty status=ok week={} offset={}",
                        week.week_number, week.rotation_offset
                    );
                    Ok(Versioned {
                        version,
                        value: week,
                    })
                }
                Err(StoreError::Conflict { .. }) => {
                    info!("event=week_init module=duty status=lost_race");
                    self.require_week()
                }
                Err(err) => Err(err.into()),
            };
        };

        if is_new_week(current.value.week_start_date, today) {
            let month_changed = is_new_month(current.value.last_updated.date(), today);
            let stats = if month_changed {
                None
            } else {
                Some(current.value.monthly_stats.clone())
            };
            let week = build_week(today, stats, Some(current.value.rotation_offset), now);
            return match self.store.put(paths::TRASH_DUTY, Some(current.version), &week) {
                Ok(version) => {
                    info!(
                        "event=week_rollover module=duty status=ok week={} offset={} month_reset={month_changed}",
                        week.week_number, week.rotation_offset
                    );
                    Ok(Versioned {
                        version,
                        value: week,
                    })
                }
                Err(StoreError::Conflict { .. }) => {
                    info!("event=week_rollover module=duty status=lost_race");
                    self.require_week()
                }
                Err(err) => Err(err.into()),
            };
        }

        if is_new_month(current.value.last_updated.date(), today) {
            let mut week = current.value;
            week.reset_monthly_stats(now);
            return match self.store.put(paths::TRASH_DUTY, Some(current.version), &week) {
                Ok(version) => {
                    info!("event=month_reset module=duty status=ok");
                    Ok(Versioned {
                        version,
                        value: week,
                    })
                }
                Err(StoreError::Conflict { .. }) => {
                    info!("event=month_reset module=duty status=lost_race");
                    self.require_week()
                }
                Err(err) => Err(err.into()),
            };
        }

        Ok(current)
    }

    /// Marks today's duty as done.
    pub fn mark_done(&self, now: NaiveDateTime) -> DutyResult<RecordedAction> {
        self.record(DutyAction::Done, now)
    }

    /// Marks today's duty as missed.
    pub fn mark_missed(&self, now: NaiveDateTime) -> DutyResult<RecordedAction> {
        self.record(DutyAction::Missed, now)
    }

    fn record(&self, action: DutyAction, now: NaiveDateTime) -> DutyResult<RecordedAction> {
        let mut current = self.require_week()?;
        let recorded = current.value.record_action(action, now)?;
        self.store.put(paths::TRASH_DUTY, None, &current.value)?;

        info!(
            "event=duty_marked module=duty status=ok action={:?} person={}",
            recorded.action, recorded.person
        );
        self.notify_duty(&recorded, now);
        Ok(recorded)
    }

    /// Reverts today's recorded action. Admin only.
    pub fn undo(&self, actor: &Housemate, now: NaiveDateTime) -> DutyResult<RecordedAction> {
        if actor.role != Role::Admin {
            warn!(
                "event=duty_undo module=duty status=rejected person={}",
                actor.name
            );
            return Err(DutyError::Unauthorized {
                person: actor.name.to_string(),
            });
        }

        let mut current = self.require_week()?;
        let undone = current.value.undo_today(now)?;
        self.store.put(paths::TRASH_DUTY, None, &current.value)?;

        info!(
            "event=duty_undo module=duty status=ok action={:?} person={}",
            undone.action, undone.person
        );
        Ok(undone)
    }

    /// Flips today's still-pending duty to missed once the deadline passed.
    ///
    /// Returns the recorded transition, or `None` when nothing was due.
    /// Absence of the week document is treated as nothing due, so the
    /// background poller never fails on a cold store.
    pub fn auto_mark_missed(&self, now: NaiveDateTime) -> DutyResult<Option<RecordedAction>> {
        let Some(mut current) = self.store.get::<DutyWeek>(paths::TRASH_DUTY)? else {
            return Ok(None);
        };
        if !current.value.auto_miss_due(now) {
            return Ok(None);
        }

        let recorded = current.value.record_action(DutyAction::Missed, now)?;
        self.store.put(paths::TRASH_DUTY, None, &current.value)?;

        info!(
            "event=duty_auto_missed module=duty status=ok person={}",
            recorded.person
        );
        self.notify_duty(&recorded, now);
        Ok(Some(recorded))
    }

    /// Saves this device's push token under the member's registry slot.
    pub fn register_push_token(
        &self,
        member: &Housemate,
        token: impl Into<String>,
        now: NaiveDateTime,
    ) -> DutyResult<()> {
        let record = PushTokenRecord {
            token: token.into(),
            last_updated: now,
        };
        self.store
            .put(&paths::push_token(member.name), None, &record)?;
        Ok(())
    }

    /// Reads the shared `currentDate` stamp, falling back to `local_now`
    /// when it is absent or unreadable.
    pub fn current_date(&self, local_now: NaiveDateTime) -> NaiveDateTime {
        match self.store.get::<NaiveDateTime>(paths::CURRENT_DATE) {
            Ok(Some(stamp)) => stamp.value,
            Ok(None) => local_now,
            Err(err) => {
                warn!("event=current_date module=duty status=error error={err}");
                local_now
            }
        }
    }

    fn require_week(&self) -> DutyResult<Versioned<DutyWeek>> {
        self.store
            .get::<DutyWeek>(paths::TRASH_DUTY)?
            .ok_or(DutyError::MissingWeek)
    }

    fn stamp_current_date(&self, now: NaiveDateTime) {
        // Best effort; the stamp is observability aid, not a dependency.
        if let Err(err) = self.store.put(paths::CURRENT_DATE, None, &now) {
            warn!("event=current_date module=duty status=error error={err}");
        }
    }

    fn notify_duty(&self, recorded: &RecordedAction, now: NaiveDateTime) {
        let (Some(dispatcher), Some(token)) = (&self.dispatcher, &self.device_token) else {
            return;
        };
        dispatcher.dispatch(NotificationPayload {
            action: match recorded.action {
                DutyAction::Done => NotifyAction::Done,
                DutyAction::Missed => NotifyAction::Missed,
            },
            person: recorded.person.clone(),
            exclude_token: token.clone(),
            timestamp: now,
            notification: None,
        });
    }
}
