//! Annotation domain model.
//!
//! # Responsibility
//! - Define the canonical records the core operates on: source text, cards,
//!   categories and the column visibility preference.
//!
//! # Invariants
//! - All offsets address one coordinate space: the UTF-16 code units of
//!   `SourceText`.
//! - Every card is identified by a stable `CardId`.

pub mod card;
pub mod card_type;
pub mod source_text;
pub mod visibility;
