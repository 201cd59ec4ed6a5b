//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate document-store reads/writes into use-case level APIs.
//! - Keep UI layers decoupled from storage and notification details.

pub mod duty_service;
pub mod expense_service;
