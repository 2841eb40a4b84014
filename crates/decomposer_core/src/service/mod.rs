//! Use-case services.
//!
//! # Responsibility
//! - Turn user intents into state transitions over the card store.
//! - Keep callers decoupled from store, codec and file-surface details.

pub mod session;
