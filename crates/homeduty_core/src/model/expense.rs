//! Shared-expense ledger model.
//!
//! # Responsibility
//! - Define the `expenses/{id}` document shape.
//! - Decide settlement: an expense is settled once every billing party
//!   except the payer has confirmed.
//!
//! # Invariants
//! - `amount` is finite and strictly positive (validated before any write).
//! - `confirmed_by` is a set; confirming twice is a no-op.

use crate::house::{BILLING_GROUP_SIZE, BILLING_PARTIES};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable identifier of a ledger entry.
pub type ExpenseId = Uuid;

/// The billing party that paid for an expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payer {
    pub id: u32,
    pub label: String,
}

/// One shared expense awaiting settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub amount: f64,
    pub payer: Payer,
    pub note: String,
    pub timestamp: NaiveDateTime,
    /// Billing-party ids that have confirmed paying their share.
    #[serde(default)]
    pub confirmed_by: BTreeSet<u32>,
}

impl Expense {
    /// Creates a fresh expense with an empty confirmation set.
    pub fn new(amount: f64, payer: Payer, note: impl Into<String>, now: NaiveDateTime) -> Self {
        Self {
            amount,
            payer,
            note: note.into(),
            timestamp: now,
            confirmed_by: BTreeSet::new(),
        }
    }

    /// Billing-party ids that owe a share (everyone except the payer).
    pub fn owing_parties(&self) -> BTreeSet<u32> {
        BILLING_PARTIES
            .iter()
            .map(|(id, _)| *id)
            .filter(|id| *id != self.payer.id)
            .collect()
    }

    /// True once every owing party has confirmed.
    pub fn is_settled(&self) -> bool {
        self.owing_parties()
            .iter()
            .all(|id| self.confirmed_by.contains(id))
    }

    /// Records a confirmation. Returns whether the set changed.
    pub fn confirm(&mut self, billing_id: u32) -> bool {
        self.confirmed_by.insert(billing_id)
    }

    /// Each owing party's share of this expense.
    pub fn share_per_member(&self) -> f64 {
        share_per_member(self.amount)
    }
}

/// Per-member share for an amount, using the fixed group divisor.
pub fn share_per_member(amount: f64) -> f64 {
    amount / f64::from(BILLING_GROUP_SIZE)
}
