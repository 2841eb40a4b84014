//! Annotation store.
//!
//! # Responsibility
//! - Own the canonical card collection and its position index.
//! - Enforce duplicate-span rejection and positional ordering.
//!
//! # Invariants
//! - Store writes report semantic errors (`DuplicateCard`, `NotFound`);
//!   deciding whether they reach the user is the session's job.

pub mod card_store;
