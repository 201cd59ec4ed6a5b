//! Expense ledger use-case service.
//!
//! # Responsibility
//! - Validate and append shared expenses.
//! - Track per-party payment confirmations and delete settled expenses.
//!
//! # Invariants
//! - An invalid amount is rejected before any storage write.
//! - An expense is deleted iff every billing party except the payer has
//!   confirmed.

use crate::house::billing_label;
use crate::model::expense::{share_per_member, Expense, ExpenseId, Payer};
use crate::notify::{NotificationContent, NotificationDispatcher, NotificationPayload, NotifyAction};
use crate::store::doc_store::{paths, DocumentStore, StoreError};
use chrono::NaiveDateTime;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ExpenseResult<T> = Result<T, ExpenseError>;

/// Errors from ledger operations.
#[derive(Debug)]
pub enum ExpenseError {
    Store(StoreError),
    /// Amount was non-positive, NaN, or infinite.
    InvalidAmount(f64),
    NotFound(ExpenseId),
    UnknownBillingParty(u32),
}

impl Display for ExpenseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::InvalidAmount(amount) => {
                write!(f, "expense amount must be a positive number, got {amount}")
            }
            Self::NotFound(id) => write!(f, "expense not found: {id}"),
            Self::UnknownBillingParty(id) => write!(f, "unknown billing party id: {id}"),
        }
    }
}

impl Error for ExpenseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::InvalidAmount(_) | Self::NotFound(_) | Self::UnknownBillingParty(_) => None,
        }
    }
}

impl From<StoreError> for ExpenseError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Result of a payment confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// Confirmation stored; this many parties still owe.
    Confirmed { remaining: usize },
    /// Everyone has paid; the expense was removed.
    Settled,
}

/// Use-case service for the shared-expense ledger.
pub struct ExpenseService<S: DocumentStore> {
    store: S,
    dispatcher: Option<NotificationDispatcher>,
    device_token: Option<String>,
}

impl<S: DocumentStore> ExpenseService<S> {
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

    /// Appends a new expense with an empty confirmation set.
    pub fn add_expense(
        &self,
        amount: f64,
        payer_billing_id: u32,
        note: impl Into<String>,
        now: NaiveDateTime,
    ) -> ExpenseResult<ExpenseId> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ExpenseError::InvalidAmount(amount));
        }
        let label = billing_label(payer_billing_id)
            .ok_or(ExpenseError::UnknownBillingParty(payer_billing_id))?;

        let id: ExpenseId = Uuid::new_v4();
        let expense = Expense::new(
            amount,
            Payer {
                id: payer_billing_id,
                label: label.to_string(),
            },
            note,
            now,
        );
        self.store.put(&paths::expense(id), Some(0), &expense)?;

        info!(
            "event=expense_added module=expense status=ok id={id} amount={amount} payer={label}"
        );
        self.notify(
            label,
            now,
            format!("New Shared Expense - {amount} DH"),
            format!("{label} just logged a new purchase for the house."),
        );
        Ok(id)
    }

    /// Records a billing party's payment confirmation.
    ///
    /// Deletes the expense once every owing party has confirmed.
    pub fn confirm_payment(
        &self,
        id: ExpenseId,
        billing_id: u32,
        now: NaiveDateTime,
    ) -> ExpenseResult<SettlementOutcome> {
        let label =
            billing_label(billing_id).ok_or(ExpenseError::UnknownBillingParty(billing_id))?;

        let path = paths::expense(id);
        let mut current = self
            .store
            .get::<Expense>(&path)?
            .ok_or(ExpenseError::NotFound(id))?;
        current.value.confirm(billing_id);

        if current.value.is_settled() {
            self.store.remove(&path)?;
            info!("event=expense_settled module=expense status=ok id={id}");
            self.notify(
                label,
                now,
                "Payment Completed - Expense removed".to_string(),
                format!("{label} just paid their share for the expense. Expense removed."),
            );
            return Ok(SettlementOutcome::Settled);
        }

        self.store.put(&path, None, &current.value)?;
        let remaining = current
            .value
            .owing_parties()
            .difference(&current.value.confirmed_by)
            .count();
        info!(
            "event=expense_confirmed module=expense status=ok id={id} party={billing_id} remaining={remaining}"
        );
        self.notify(
            label,
            now,
            "Payment Completed".to_string(),
            format!("{label} just paid their share for the expense."),
        );
        Ok(SettlementOutcome::Confirmed { remaining })
    }

    /// All open expenses, newest first.
    pub fn list_expenses(&self) -> ExpenseResult<Vec<(ExpenseId, Expense)>> {
        let mut expenses: Vec<(ExpenseId, Expense)> = self
            .store
            .list_prefix::<Expense>(paths::EXPENSES)?
            .into_iter()
            .filter_map(|(path, doc)| {
                let raw_id = path.rsplit('/').next().unwrap_or(&path);
                match Uuid::parse_str(raw_id) {
                    Ok(id) => Some((id, doc.value)),
                    Err(_) => {
                        warn!(
                            "event=expense_list module=expense status=skipped path={path}"
                        );
                        None
                    }
                }
            })
            .collect();
        expenses.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp));
        Ok(expenses)
    }

    /// Sum of all open expense amounts.
    pub fn outstanding_total(&self) -> ExpenseResult<f64> {
        Ok(self
            .list_expenses()?
            .iter()
            .map(|(_, expense)| expense.amount)
            .sum())
    }

    /// Per-member share for a given amount.
    pub fn share_for(&self, amount: f64) -> f64 {
        share_per_member(amount)
    }

    fn notify(&self, person: &str, now: NaiveDateTime, title: String, body: String) {
        let (Some(dispatcher), Some(token)) = (&self.dispatcher, &self.device_token) else {
            return;
        };
        dispatcher.dispatch(NotificationPayload {
            action: NotifyAction::Custom,
            person: person.to_string(),
            exclude_token: token.clone(),
            timestamp: now,
            notification: Some(NotificationContent { title, body }),
        });
    }
}
