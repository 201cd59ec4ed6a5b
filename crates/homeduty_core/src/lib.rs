//! Core domain logic for the household coordination app.
//! This crate is the single source of truth for rotation, duty-state and
//! expense-settlement invariants.

pub mod calendar;
pub mod config;
pub mod db;
pub mod house;
pub mod logging;
pub mod model;
pub mod notify;
pub mod rotation;
pub mod service;
pub mod store;
pub mod worker;

pub use config::{Config, ConfigError};
pub use house::{Housemate, Role, HOUSEMATES, HOUSE_RULES};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::duty::{
    DutyAction, DutyStatus, DutyWeek, MonthlyStats, PersonStats, RecordedAction, TransitionError,
    WeeklyEntry,
};
pub use model::expense::{Expense, ExpenseId, Payer};
pub use notify::{NotificationDispatcher, NotificationPayload, NotifyAction};
pub use rotation::build_week;
pub use service::duty_service::{DutyError, DutyResult, DutyService, PushTokenRecord};
pub use service::expense_service::{
    ExpenseError, ExpenseResult, ExpenseService, SettlementOutcome,
};
pub use store::doc_store::{
    paths, DocumentEvent, DocumentStore, SqliteDocumentStore, StoreError, StoreResult, Versioned,
};
pub use worker::Poller;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
