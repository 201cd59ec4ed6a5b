use chrono::{NaiveDate, NaiveDateTime};
use homeduty_core::db::open_db_in_memory;
use homeduty_core::house::BILLING_PARTIES;
use homeduty_core::model::expense::Expense;
use homeduty_core::service::expense_service::{ExpenseError, ExpenseService, SettlementOutcome};
use homeduty_core::store::doc_store::{paths, DocumentStore, SqliteDocumentStore};
use uuid::Uuid;

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

#[test]
fn invalid_amounts_are_rejected_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = ExpenseService::new(&store);

    for amount in [0.0, -12.5, f64::NAN, f64::INFINITY] {
        let err = service
            .add_expense(amount, 100, "bad", at(6, 12))
            .unwrap_err();
        assert!(matches!(err, ExpenseError::InvalidAmount(_)), "{amount}");
    }
    assert!(service.list_expenses().unwrap().is_empty());
}

#[test]
fn unknown_billing_party_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = ExpenseService::new(&store);

    let err = service
        .add_expense(30.0, 999, "mystery", at(6, 12))
        .unwrap_err();
    assert!(matches!(err, ExpenseError::UnknownBillingParty(999)));

    let id = service.add_expense(30.0, 100, "water", at(6, 12)).unwrap();
    let err = service.confirm_payment(id, 999, at(6, 13)).unwrap_err();
    assert!(matches!(err, ExpenseError::UnknownBillingParty(999)));
}

#[test]
fn added_expense_starts_unconfirmed() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = ExpenseService::new(&store);

    let id = service
        .add_expense(90.0, 200, "groceries", at(6, 12))
        .unwrap();

    let stored = store
        .get::<Expense>(&paths::expense(id))
        .unwrap()
        .unwrap()
        .value;
    assert_eq!(stored.payer.id, 200);
    assert_eq!(stored.payer.label, "Sohaib");
    assert!(stored.confirmed_by.is_empty());
    assert!((service.share_for(stored.amount) - 30.0).abs() < f64::EPSILON);
}

#[test]
fn partial_confirmation_persists_with_updated_set() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = ExpenseService::new(&store);

    let id = service.add_expense(90.0, 100, "gas", at(6, 12)).unwrap();
    let outcome = service.confirm_payment(id, 200, at(6, 13)).unwrap();
    assert_eq!(outcome, SettlementOutcome::Confirmed { remaining: 1 });

    let stored = store
        .get::<Expense>(&paths::expense(id))
        .unwrap()
        .unwrap()
        .value;
    assert!(stored.confirmed_by.contains(&200));
    assert!(!stored.is_settled());
}

#[test]
fn full_confirmation_deletes_the_expense() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = ExpenseService::new(&store);

    let id = service.add_expense(90.0, 100, "internet", at(6, 12)).unwrap();
    service.confirm_payment(id, 200, at(6, 13)).unwrap();
    let outcome = service.confirm_payment(id, 300, at(6, 14)).unwrap();
    assert_eq!(outcome, SettlementOutcome::Settled);

    assert!(store.get::<Expense>(&paths::expense(id)).unwrap().is_none());
    assert!(service.list_expenses().unwrap().is_empty());
}

#[test]
fn payer_confirmation_does_not_count_toward_settlement() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = ExpenseService::new(&store);

    let id = service.add_expense(60.0, 300, "cleaning", at(6, 12)).unwrap();
    let outcome = service.confirm_payment(id, 300, at(6, 13)).unwrap();
    assert_eq!(outcome, SettlementOutcome::Confirmed { remaining: 2 });

    // Settlement still needs both true debtors.
    service.confirm_payment(id, 100, at(6, 14)).unwrap();
    let outcome = service.confirm_payment(id, 200, at(6, 15)).unwrap();
    assert_eq!(outcome, SettlementOutcome::Settled);
}

#[test]
fn settlement_requires_every_party_except_the_payer() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = ExpenseService::new(&store);

    for (payer_id, _) in BILLING_PARTIES {
        let id = service
            .add_expense(30.0, payer_id, "round-robin", at(6, 12))
            .unwrap();
        let mut last = None;
        for (other_id, _) in BILLING_PARTIES {
            if other_id == payer_id {
                continue;
            }
            last = Some(service.confirm_payment(id, other_id, at(6, 13)).unwrap());
        }
        assert_eq!(last, Some(SettlementOutcome::Settled), "payer {payer_id}");
    }
}

#[test]
fn confirming_unknown_expense_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = ExpenseService::new(&store);

    let missing = Uuid::new_v4();
    let err = service.confirm_payment(missing, 100, at(6, 12)).unwrap_err();
    assert!(matches!(err, ExpenseError::NotFound(id) if id == missing));
}

#[test]
fn listing_is_newest_first_with_running_total() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = ExpenseService::new(&store);

    service.add_expense(10.0, 100, "monday", at(6, 12)).unwrap();
    service.add_expense(20.0, 200, "tuesday", at(7, 12)).unwrap();
    service.add_expense(5.0, 300, "wednesday", at(8, 12)).unwrap();

    let expenses = service.list_expenses().unwrap();
    let notes: Vec<&str> = expenses
        .iter()
        .map(|(_, expense)| expense.note.as_str())
        .collect();
    assert_eq!(notes, vec!["wednesday", "tuesday", "monday"]);
    assert!((service.outstanding_total().unwrap() - 35.0).abs() < f64::EPSILON);
}
