//! Position index over anchored cards.
//!
//! # Responsibility
//! - Map character ranges to card ids.
//! - Answer exact-match, overlap and containment queries.
//!
//! # Invariants
//! - Entries are ordered by `span.start` ascending; equal starts keep
//!   insertion order.
//! - An id appears at most once.

use crate::model::card::{CardId, Span};
use crate::model::card_type::CardType;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    span: Span,
    kind: CardType,
    id: CardId,
}

/// Sorted interval index keyed by span start.
#[derive(Debug, Clone, Default)]
pub struct SpanIndex {
    entries: Vec<Entry>,
}

impl SpanIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Inserts after every entry with the same or smaller start.
    ///
    /// Re-inserting a known id moves it to its new position.
    pub fn insert(&mut self, id: CardId, span: Span, kind: CardType) {
        self.remove(&id);
        let at = self
            .entries
            .partition_point(|entry| entry.span.start() <= span.start());
        self.entries.insert(at, Entry { span, kind, id });
    }

    /// Removes one id; returns whether it was present.
    pub fn remove(&mut self, id: &CardId) -> bool {
        match self.entries.iter().position(|entry| &entry.id == id) {
            Some(at) => {
                self.entries.remove(at);
                true
            }
            None => false,
        }
    }

    /// Updates the category of an indexed id without moving it.
    pub fn set_kind(&mut self, id: &CardId, kind: CardType) -> bool {
        match self.entries.iter_mut().find(|entry| &entry.id == id) {
            Some(entry) => {
                entry.kind = kind;
                true
            }
            None => false,
        }
    }

    /// Finds the card holding exactly `(span, kind)`.
    pub fn find_exact(&self, span: Span, kind: CardType) -> Option<&CardId> {
        self.candidates_starting_at(span.start())
            .find(|entry| entry.span == span && entry.kind == kind)
            .map(|entry| &entry.id)
    }

    /// Ids whose span shares at least one character with `span`.
    pub fn overlapping(&self, span: Span) -> impl Iterator<Item = &CardId> + '_ {
        let upper = self
            .entries
            .partition_point(|entry| entry.span.start() < span.end());
        self.entries[..upper]
            .iter()
            .filter(move |entry| entry.span.overlaps(span))
            .map(|entry| &entry.id)
    }

    /// Ids whose span covers character position `offset`.
    pub fn containing(&self, offset: usize) -> impl Iterator<Item = &CardId> + '_ {
        let upper = self
            .entries
            .partition_point(|entry| entry.span.start() <= offset);
        self.entries[..upper]
            .iter()
            .filter(move |entry| entry.span.contains_offset(offset))
            .map(|entry| &entry.id)
    }

    /// Ids in index order.
    pub fn ids(&self) -> impl Iterator<Item = &CardId> + '_ {
        self.entries.iter().map(|entry| &entry.id)
    }

    /// Index order position of `id`.
    pub fn position(&self, id: &CardId) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.id == id)
    }

    fn candidates_starting_at(&self, start: usize) -> impl Iterator<Item = &Entry> + '_ {
        let from = self
            .entries
            .partition_point(|entry| entry.span.start() < start);
        self.entries[from..]
            .iter()
            .take_while(move |entry| entry.span.start() == start)
    }
}
