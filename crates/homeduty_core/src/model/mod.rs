//! Domain models shared across the household document tree.
//!
//! # Responsibility
//! - Define the canonical document shapes for duty and expense data.
//! - Keep state-transition rules next to the data they guard.
//!
//! # Invariants
//! - Serialized field names follow the external camelCase document schema.

pub mod duty;
pub mod expense;
