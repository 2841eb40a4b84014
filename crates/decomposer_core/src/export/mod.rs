//! Write-only export formats.
//!
//! # Responsibility
//! - Render the card collection as grouped plain text or as a
//!   tab-separated table.
//!
//! # Invariants
//! - Exports never mutate state and are never re-imported.
//! - Category order is `CardType::ALL`; within a category cards follow
//!   their persisted start offset, unanchored cards (`-1`) first.

pub mod table;
pub mod text;

use crate::model::card::Card;

/// Cards ordered by category rank, then persisted start offset.
pub(crate) fn export_order(cards: &[Card]) -> Vec<&Card> {
    let mut ordered: Vec<&Card> = cards.iter().collect();
    ordered.sort_by_key(|card| (card.kind().rank(), card.wire_start()));
    ordered
}
