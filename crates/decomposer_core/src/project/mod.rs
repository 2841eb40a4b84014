//! Project persistence.
//!
//! # Responsibility
//! - Convert between the in-memory project state and the persisted JSON
//!   project document.
//!
//! # Invariants
//! - A document is fully validated before any state is replaced.

pub mod document;
