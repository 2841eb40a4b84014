//! Span indexing for anchored cards.
//!
//! # See also
//! - `store::card_store` for the owner that keeps the index consistent.

pub mod span_index;
