use chrono::{NaiveDate, NaiveDateTime};
use homeduty_core::db::open_db_in_memory;
use homeduty_core::model::duty::{DutyAction, DutyStatus, TransitionError};
use homeduty_core::service::duty_service::{DutyError, DutyService, PushTokenRecord};
use homeduty_core::store::doc_store::{paths, DocumentStore, SqliteDocumentStore};
use homeduty_core::{Role, HOUSEMATES};

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
}

fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, minute, 0).unwrap()
}

#[test]
fn bootstrap_creates_monday_aligned_week() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = DutyService::new(&store);

    let week = service.ensure_current_week(at(monday(), 9, 0)).unwrap();
    assert_eq!(week.value.week_start_date, monday());
    assert_eq!(week.value.week_schedule.len(), 7);
    assert_eq!(week.value.week_schedule[0].person, HOUSEMATES[0].name);
    assert!(week.value.last_action_date.is_none());

    // Same week, later call: nothing is rewritten.
    let again = service.ensure_current_week(at(monday(), 18, 0)).unwrap();
    assert_eq!(again.version, week.version);
    assert_eq!(again.value, week.value);
}

#[test]
fn mark_done_records_exactly_once_per_day() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = DutyService::new(&store);
    service.ensure_current_week(at(monday(), 9, 0)).unwrap();

    let recorded = service.mark_done(at(monday(), 20, 0)).unwrap();
    assert_eq!(recorded.action, DutyAction::Done);
    assert_eq!(recorded.person, HOUSEMATES[0].name);

    let stored = store
        .get::<homeduty_core::DutyWeek>(paths::TRASH_DUTY)
        .unwrap()
        .unwrap();
    let entry = stored.value.entry_for_date(monday()).unwrap();
    assert_eq!(entry.status, DutyStatus::Done);
    assert!(entry.completed_at.is_some());
    assert_eq!(stored.value.monthly_stats[HOUSEMATES[0].name].done, 1);

    let err = service.mark_missed(at(monday(), 21, 0)).unwrap_err();
    assert!(matches!(
        err,
        DutyError::Transition(TransitionError::ActionAlreadyRecorded { .. })
    ));
}

#[test]
fn actions_require_an_initialized_week() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = DutyService::new(&store);

    let err = service.mark_done(at(monday(), 20, 0)).unwrap_err();
    assert!(matches!(err, DutyError::MissingWeek));
}

#[test]
fn undo_requires_admin_role() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = DutyService::new(&store);
    service.ensure_current_week(at(monday(), 9, 0)).unwrap();
    service.mark_missed(at(monday(), 20, 0)).unwrap();

    let member = HOUSEMATES
        .iter()
        .find(|housemate| housemate.role == Role::Member)
        .unwrap();
    let err = service.undo(member, at(monday(), 20, 30)).unwrap_err();
    assert!(matches!(err, DutyError::Unauthorized { .. }));

    // The rejected undo wrote nothing.
    let stored = store
        .get::<homeduty_core::DutyWeek>(paths::TRASH_DUTY)
        .unwrap()
        .unwrap();
    assert_eq!(
        stored.value.entry_for_date(monday()).unwrap().status,
        DutyStatus::Missed
    );
}

#[test]
fn admin_undo_restores_pending_state_and_counters() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = DutyService::new(&store);
    let before = service
        .ensure_current_week(at(monday(), 9, 0))
        .unwrap()
        .value;
    service.mark_done(at(monday(), 20, 0)).unwrap();

    let admin = HOUSEMATES
        .iter()
        .find(|housemate| housemate.role == Role::Admin)
        .unwrap();
    let undone = service.undo(admin, at(monday(), 20, 30)).unwrap();
    assert_eq!(undone.action, DutyAction::Done);

    let stored = store
        .get::<homeduty_core::DutyWeek>(paths::TRASH_DUTY)
        .unwrap()
        .unwrap();
    assert_eq!(stored.value.week_schedule, before.week_schedule);
    assert_eq!(stored.value.monthly_stats, before.monthly_stats);
    assert!(stored.value.last_action_date.is_none());

    // Nothing left to undo.
    let err = service.undo(admin, at(monday(), 21, 0)).unwrap_err();
    assert!(matches!(
        err,
        DutyError::Transition(TransitionError::NothingToUndo)
    ));
}

#[test]
fn undo_window_closes_at_midnight() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = DutyService::new(&store);
    service.ensure_current_week(at(monday(), 9, 0)).unwrap();
    service.mark_done(at(monday(), 20, 0)).unwrap();

    let admin = &HOUSEMATES[0];
    let tuesday = monday().succ_opt().unwrap();
    let err = service.undo(admin, at(tuesday, 8, 0)).unwrap_err();
    assert!(matches!(
        err,
        DutyError::Transition(TransitionError::NothingToUndo)
    ));
}

#[test]
fn push_token_registration_writes_member_slot() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = DutyService::new(&store);

    let member = &HOUSEMATES[1];
    service
        .register_push_token(member, "expo-token-xyz", at(monday(), 9, 0))
        .unwrap();

    let record = store
        .get::<PushTokenRecord>(&paths::push_token(member.name))
        .unwrap()
        .unwrap();
    assert_eq!(record.value.token, "expo-token-xyz");
}

#[test]
fn current_date_stamp_roundtrip_with_local_fallback() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = DutyService::new(&store);

    let fallback = at(monday(), 7, 0);
    assert_eq!(service.current_date(fallback), fallback);

    let bootstrap_time = at(monday(), 9, 0);
    service.ensure_current_week(bootstrap_time).unwrap();
    assert_eq!(service.current_date(fallback), bootstrap_time);
}
