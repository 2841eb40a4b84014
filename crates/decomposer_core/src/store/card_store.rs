//! Canonical card collection.
//!
//! # Responsibility
//! - Own every card record and keep the span index consistent with it.
//! - Provide create/update/delete/query entry points for the session.
//!
//! # Invariants
//! - No two anchored cards share `(start, end, type)` through create or
//!   update paths.
//! - Collection order: anchored cards ascending by `start` (ties keep
//!   insertion order), then unanchored cards in insertion order.
//! - Category changes never move a card.
//! - `replace_all` commits everything or nothing.

use crate::index::span_index::SpanIndex;
use crate::model::card::{Card, CardId, CardPatch, CardValidationError, Span};
use crate::model::card_type::CardType;
use crate::model::source_text::SourceText;
use crate::model::visibility::ColumnVisibility;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An anchored card with the same span and type already exists.
    DuplicateCard {
        start: usize,
        end: usize,
        kind: CardType,
    },
    NotFound(CardId),
    /// Anchored span reaches past the end of the source text.
    OutOfBounds {
        card_id: CardId,
        start: usize,
        end: usize,
        text_len: usize,
    },
    /// Anchored span starts or ends between the two halves of a surrogate
    /// pair.
    SplitsCharacter {
        card_id: CardId,
        start: usize,
        end: usize,
    },
    /// Two records in one bulk load share an id.
    DuplicateId(CardId),
    Validation(CardValidationError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateCard { start, end, kind } => write!(
                f,
                "card of type {kind} already exists for span [{start}, {end})"
            ),
            Self::NotFound(id) => write!(f, "card not found: {id}"),
            Self::OutOfBounds {
                card_id,
                start,
                end,
                text_len,
            } => write!(
                f,
                "card {card_id} span [{start}, {end}) exceeds text length {text_len}"
            ),
            Self::SplitsCharacter {
                card_id,
                start,
                end,
            } => write!(
                f,
                "card {card_id} span [{start}, {end}) splits a surrogate pair"
            ),
            Self::DuplicateId(id) => write!(f, "duplicate card id: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CardValidationError> for StoreError {
    fn from(value: CardValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Search/category filter for card pool queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFilter {
    /// Case-insensitive substring over label and note; empty matches all.
    pub search: String,
    /// `None` means every category.
    pub kind: Option<CardType>,
}

impl CardFilter {
    pub fn new(search: impl Into<String>, kind: Option<CardType>) -> Self {
        Self {
            search: search.into(),
            kind,
        }
    }

    /// Filter that matches every card.
    pub fn all() -> Self {
        Self::default()
    }
}

/// Cards of one category, as shown in one column or table section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardGroup<'a> {
    pub kind: CardType,
    pub cards: Vec<&'a Card>,
}

impl CardGroup<'_> {
    pub fn count(&self) -> usize {
        self.cards.len()
    }
}

/// In-memory owner of all cards.
#[derive(Debug, Clone, Default)]
pub struct CardStore {
    cards: Vec<Card>,
    index: SpanIndex,
}

impl CardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// All cards in collection order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn get(&self, id: &CardId) -> Option<&Card> {
        self.cards.iter().find(|card| card.id() == id)
    }

    /// Creates an anchored card.
    ///
    /// # Errors
    /// - `DuplicateCard` when `(span, kind)` is already taken; the store is
    ///   left unchanged.
    pub fn create(
        &mut self,
        span: Span,
        kind: CardType,
        label: impl Into<String>,
    ) -> StoreResult<Card> {
        if self.index.find_exact(span, kind).is_some() {
            info!(
                "event=card_create module=store status=rejected reason=duplicate type={} start={} end={}",
                kind,
                span.start(),
                span.end()
            );
            return Err(StoreError::DuplicateCard {
                start: span.start(),
                end: span.end(),
                kind,
            });
        }

        let card = Card::anchored(span, kind, label);
        self.index.insert(card.id().clone(), span, kind);
        self.cards.push(card.clone());
        self.restore_order();
        info!(
            "event=card_create module=store status=ok card_id={} type={} start={} end={}",
            card.id(),
            kind,
            span.start(),
            span.end()
        );
        Ok(card)
    }

    /// Creates a card with no text position; appended after all others.
    pub fn create_unanchored(&mut self, kind: CardType, label: impl Into<String>) -> Card {
        let card = Card::unanchored(kind, label);
        self.cards.push(card.clone());
        info!(
            "event=card_create module=store status=ok card_id={} type={} anchored=false",
            card.id(),
            kind
        );
        card
    }

    /// Merges `patch` into the card with `id`.
    ///
    /// Position is never affected, including on category change.
    ///
    /// # Errors
    /// - `NotFound` when no card has `id`.
    /// - `DuplicateCard` when a category change would collide with another
    ///   anchored card on the same span.
    pub fn update(&mut self, id: &CardId, patch: &CardPatch) -> StoreResult<()> {
        let at = self.position_of(id)?;
        let card = &self.cards[at];

        if let (Some(kind), Some(span)) = (patch.kind, card.anchor()) {
            if kind != card.kind() {
                if let Some(other) = self.index.find_exact(span, kind) {
                    if other != id {
                        return Err(StoreError::DuplicateCard {
                            start: span.start(),
                            end: span.end(),
                            kind,
                        });
                    }
                }
            }
        }

        let card = &mut self.cards[at];
        if let Some(kind) = patch.kind {
            card.set_kind(kind);
            self.index.set_kind(id, kind);
        }
        if let Some(label) = &patch.label {
            card.set_label(label.clone());
        }
        if let Some(note) = &patch.note {
            card.set_note(Some(note.clone()));
        }
        debug!(
            "event=card_update module=store status=ok card_id={} type_changed={} label_changed={} note_changed={}",
            id,
            patch.kind.is_some(),
            patch.label.is_some(),
            patch.note.is_some()
        );
        Ok(())
    }

    /// Changes only the category; returns whether anything changed.
    pub fn retype(&mut self, id: &CardId, kind: CardType) -> StoreResult<bool> {
        let current = self
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?
            .kind();
        if current == kind {
            return Ok(false);
        }
        self.update(id, &CardPatch::kind(kind))?;
        Ok(true)
    }

    /// Removes the card with `id`; returns whether it existed.
    pub fn delete(&mut self, id: &CardId) -> bool {
        let Some(at) = self.cards.iter().position(|card| card.id() == id) else {
            return false;
        };
        self.cards.remove(at);
        self.index.remove(id);
        info!("event=card_delete module=store status=ok card_id={id}");
        true
    }

    /// Drops every card.
    pub fn clear(&mut self) {
        let dropped = self.cards.len();
        self.cards.clear();
        self.index.clear();
        info!("event=cards_clear module=store status=ok dropped={dropped}");
    }

    /// Atomically replaces the collection with imported cards.
    ///
    /// # Errors
    /// - `OutOfBounds` when an anchored span exceeds the text.
    /// - `SplitsCharacter` when a span end falls inside a surrogate pair.
    /// - `DuplicateId` when two records share an id.
    ///
    /// On error the current collection is untouched.
    pub fn replace_all(&mut self, text: &SourceText, cards: Vec<Card>) -> StoreResult<()> {
        let index = build_index(text, &cards)?;
        self.cards = cards;
        self.index = index;
        self.restore_order();
        info!(
            "event=cards_replace module=store status=ok count={}",
            self.cards.len()
        );
        Ok(())
    }

    /// Anchored cards in position order.
    pub fn anchored(&self) -> impl Iterator<Item = &Card> + '_ {
        self.cards.iter().filter(|card| card.is_anchored())
    }

    /// Anchored cards of visible categories, in position order.
    pub fn query_visible(&self, visibility: &ColumnVisibility) -> Vec<&Card> {
        self.anchored()
            .filter(|card| visibility.is_visible(card.kind()))
            .collect()
    }

    /// Cards matching `filter` across the whole collection.
    pub fn query(&self, filter: &CardFilter) -> Vec<&Card> {
        let needle = filter.search.to_lowercase();
        self.cards
            .iter()
            .filter(|card| filter.kind.is_none_or(|kind| card.kind() == kind))
            .filter(|card| card.matches_lowercase(&needle))
            .collect()
    }

    /// Matching cards grouped by category in canonical order.
    ///
    /// With `visibility`, hidden categories are skipped and visible ones are
    /// kept even when empty (column view). Without it, only non-empty groups
    /// are returned (table view).
    pub fn grouped(
        &self,
        filter: &CardFilter,
        visibility: Option<&ColumnVisibility>,
    ) -> Vec<CardGroup<'_>> {
        let matches = self.query(filter);
        CardType::ALL
            .into_iter()
            .filter(|kind| visibility.is_none_or(|v| v.is_visible(*kind)))
            .map(|kind| CardGroup {
                kind,
                cards: matches
                    .iter()
                    .copied()
                    .filter(|card| card.kind() == kind)
                    .collect(),
            })
            .filter(|group| visibility.is_some() || !group.cards.is_empty())
            .collect()
    }

    /// Anchored cards covering character position `offset`.
    pub fn cards_at(&self, offset: usize) -> Vec<&Card> {
        self.index
            .containing(offset)
            .filter_map(|id| self.get(id))
            .collect()
    }

    /// Anchored cards sharing at least one character with `span`.
    pub fn overlapping(&self, span: Span) -> Vec<&Card> {
        self.index
            .overlapping(span)
            .filter_map(|id| self.get(id))
            .collect()
    }

    fn position_of(&self, id: &CardId) -> StoreResult<usize> {
        self.cards
            .iter()
            .position(|card| card.id() == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn restore_order(&mut self) {
        self.cards
            .sort_by_key(|card| card.anchor().map_or(usize::MAX, Span::start));
    }
}

fn build_index(text: &SourceText, cards: &[Card]) -> StoreResult<SpanIndex> {
    let text_len = text.len_utf16();
    let mut seen_ids = HashSet::with_capacity(cards.len());
    let mut index = SpanIndex::new();
    let mut duplicate_spans = 0usize;

    for card in cards {
        if !seen_ids.insert(card.id()) {
            return Err(StoreError::DuplicateId(card.id().clone()));
        }
        let Some(span) = card.anchor() else {
            continue;
        };
        if span.end() > text_len {
            return Err(StoreError::OutOfBounds {
                card_id: card.id().clone(),
                start: span.start(),
                end: span.end(),
                text_len,
            });
        }
        if !text.contains_span(span) {
            return Err(StoreError::SplitsCharacter {
                card_id: card.id().clone(),
                start: span.start(),
                end: span.end(),
            });
        }
        if index.find_exact(span, card.kind()).is_some() {
            duplicate_spans += 1;
        }
        index.insert(card.id().clone(), span, card.kind());
    }

    // Imported documents may predate duplicate checks on retype; keep them.
    if duplicate_spans > 0 {
        warn!("event=cards_replace module=store status=warn duplicate_spans={duplicate_spans}");
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::{CardFilter, CardStore, StoreError};
    use crate::model::card::{Card, CardId, CardPatch, Span};
    use crate::model::card_type::CardType;
    use crate::model::source_text::SourceText;
    use crate::model::visibility::ColumnVisibility;

    fn span(start: usize, end: usize) -> Span {
        Span::new(start, end).unwrap()
    }

    #[test]
    fn create_rejects_same_span_and_type_only() {
        let mut store = CardStore::new();
        store.create(span(4, 8), CardType::Role, "user").unwrap();

        let err = store.create(span(4, 8), CardType::Role, "user").unwrap_err();
        assert_eq!(
            err,
            StoreError::DuplicateCard {
                start: 4,
                end: 8,
                kind: CardType::Role
            }
        );
        store.create(span(4, 8), CardType::Object, "user").unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn anchored_cards_sort_before_unanchored_by_start() {
        let mut store = CardStore::new();
        let blank = store.create_unanchored(CardType::Question, "new");
        let late = store.create(span(10, 12), CardType::Object, "xy").unwrap();
        let early = store.create(span(1, 3), CardType::Role, "ab").unwrap();

        let order: Vec<_> = store.cards().iter().map(|c| c.id().clone()).collect();
        assert_eq!(
            order,
            vec![
                early.id().clone(),
                late.id().clone(),
                blank.id().clone()
            ]
        );
    }

    #[test]
    fn retype_keeps_position_and_reports_noop() {
        let mut store = CardStore::new();
        let a = store.create(span(0, 2), CardType::Role, "ab").unwrap();
        let b = store.create(span(5, 7), CardType::Role, "cd").unwrap();

        assert!(store.retype(a.id(), CardType::Scenario).unwrap());
        assert!(!store.retype(a.id(), CardType::Scenario).unwrap());

        let order: Vec<_> = store.cards().iter().map(|c| c.id()).collect();
        assert_eq!(order, vec![a.id(), b.id()]);
        assert_eq!(store.get(a.id()).unwrap().kind(), CardType::Scenario);
    }

    #[test]
    fn retype_rejects_collision_with_existing_card() {
        let mut store = CardStore::new();
        let a = store.create(span(0, 2), CardType::Role, "ab").unwrap();
        store.create(span(0, 2), CardType::Object, "ab").unwrap();

        let err = store.retype(a.id(), CardType::Object).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateCard { .. }));
        assert_eq!(store.get(a.id()).unwrap().kind(), CardType::Role);
    }

    #[test]
    fn update_merges_fields_and_reports_missing() {
        let mut store = CardStore::new();
        let card = store.create_unanchored(CardType::Property, "placeholder");
        store
            .update(
                card.id(),
                &CardPatch {
                    label: Some("status".to_string()),
                    note: Some(" active | archived ".to_string()),
                    kind: None,
                },
            )
            .unwrap();

        let stored = store.get(card.id()).unwrap();
        assert_eq!(stored.label(), "status");
        assert_eq!(stored.note(), Some("active | archived"));
        assert_eq!(stored.kind(), CardType::Property);

        let missing = CardId::parse("missing").unwrap();
        assert_eq!(
            store.update(&missing, &CardPatch::note("x")),
            Err(StoreError::NotFound(missing))
        );
    }

    #[test]
    fn delete_is_idempotent_and_frees_span() {
        let mut store = CardStore::new();
        let card = store.create(span(0, 3), CardType::Object, "abc").unwrap();
        assert!(store.delete(card.id()));
        assert!(!store.delete(card.id()));
        store.create(span(0, 3), CardType::Object, "abc").unwrap();
    }

    #[test]
    fn replace_all_is_atomic_on_out_of_bounds() {
        let mut store = CardStore::new();
        let kept = store.create(span(0, 3), CardType::Object, "abc").unwrap();

        let bad = Card::from_parts(
            CardId::parse("bad").unwrap(),
            CardType::Role,
            "x",
            None,
            Some(span(2, 20)),
        );
        let err = store
            .replace_all(&SourceText::new("0123456789"), vec![bad])
            .unwrap_err();
        assert!(matches!(err, StoreError::OutOfBounds { text_len: 10, .. }));
        assert_eq!(store.len(), 1);
        assert_eq!(store.cards()[0].id(), kept.id());
    }

    #[test]
    fn replace_all_rejects_spans_inside_surrogate_pairs() {
        let mut store = CardStore::new();
        let text = SourceText::new("😀 user");
        let split = Card::from_parts(
            CardId::parse("split").unwrap(),
            CardType::Role,
            "x",
            None,
            Some(span(1, 4)),
        );
        let err = store.replace_all(&text, vec![split]).unwrap_err();
        assert!(matches!(err, StoreError::SplitsCharacter { start: 1, .. }));
        assert!(store.is_empty());

        let aligned = Card::from_parts(
            CardId::parse("ok").unwrap(),
            CardType::Role,
            "user",
            None,
            Some(span(3, 7)),
        );
        store.replace_all(&text, vec![aligned]).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn replace_all_rejects_duplicate_ids() {
        let mut store = CardStore::new();
        let id = CardId::parse("same").unwrap();
        let cards = vec![
            Card::from_parts(id.clone(), CardType::Role, "a", None, None),
            Card::from_parts(id.clone(), CardType::Object, "b", None, None),
        ];
        assert_eq!(
            store.replace_all(&SourceText::new("abcde"), cards),
            Err(StoreError::DuplicateId(id))
        );
        assert!(store.is_empty());
    }

    #[test]
    fn query_visible_filters_hidden_and_unanchored() {
        let mut store = CardStore::new();
        store.create(span(0, 2), CardType::Role, "ab").unwrap();
        store.create(span(3, 5), CardType::Object, "cd").unwrap();
        store.create_unanchored(CardType::Role, "free");

        let mut visibility = ColumnVisibility::default();
        visibility.set(CardType::Object, false);
        let visible = store.query_visible(&visibility);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].label(), "ab");
    }

    #[test]
    fn query_matches_case_insensitively_across_collection() {
        let mut store = CardStore::new();
        store.create(span(0, 4), CardType::Role, "User").unwrap();
        let free = store.create_unanchored(CardType::Role, "Admin");
        store
            .update(free.id(), &CardPatch::note("manages USERS"))
            .unwrap();

        assert_eq!(store.query(&CardFilter::new("user", None)).len(), 2);
        assert_eq!(
            store
                .query(&CardFilter::new("user", Some(CardType::Object)))
                .len(),
            0
        );
        assert_eq!(store.query(&CardFilter::all()).len(), 2);
    }

    #[test]
    fn grouped_respects_visibility_and_canonical_order() {
        let mut store = CardStore::new();
        store.create(span(0, 1), CardType::Question, "q").unwrap();
        store.create(span(1, 2), CardType::Object, "o").unwrap();

        let table = store.grouped(&CardFilter::all(), None);
        let kinds: Vec<_> = table.iter().map(|g| g.kind).collect();
        assert_eq!(kinds, vec![CardType::Object, CardType::Question]);

        let mut visibility = ColumnVisibility::default();
        visibility.set(CardType::Question, false);
        let columns = store.grouped(&CardFilter::all(), Some(&visibility));
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[0].count(), 1);
        assert_eq!(columns[1].count(), 0);
    }

    #[test]
    fn cards_at_uses_span_containment() {
        let mut store = CardStore::new();
        store.create(span(0, 5), CardType::Scenario, "abcde").unwrap();
        store.create(span(2, 4), CardType::Object, "cd").unwrap();

        assert_eq!(store.cards_at(3).len(), 2);
        assert_eq!(store.cards_at(4).len(), 1);
        assert!(store.cards_at(5).is_empty());
        assert_eq!(store.overlapping(span(4, 6)).len(), 1);
    }
}
