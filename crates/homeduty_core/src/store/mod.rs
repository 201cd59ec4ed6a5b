//! Storage layer over the shared household document tree.
//!
//! # Responsibility
//! - Define the versioned document-store contract used by services.
//! - Isolate SQLite persistence details from business orchestration.
//!
//! # Invariants
//! - Every stored document carries a monotonically increasing version.
//! - Writes notify local subscribers after the row is durable.

pub mod doc_store;
