//! Card (annotation) domain model.
//!
//! # Responsibility
//! - Define the canonical annotation record and its span.
//! - Map records to and from the persisted `cards[]` wire shape.
//!
//! # Invariants
//! - `id` is non-blank and never changes for the record lifetime.
//! - An anchored span is half-open and non-empty: `start < end`.
//! - Unanchored cards persist as `startIndex = endIndex = -1`.
//! - `label` is a snapshot taken at creation, never recomputed from text.

use crate::model::card_type::CardType;
use crate::model::source_text::trim;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Persisted offset marker for unanchored cards.
pub const UNANCHORED_OFFSET: i64 = -1;

/// Opaque stable card identifier.
///
/// Imported documents may carry ids in any non-blank format, so this wraps a
/// string rather than a `Uuid`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    /// Allocates a fresh identifier.
    pub fn generate() -> Self {
        Self(format!("card-{}", Uuid::new_v4()))
    }

    /// Wraps an externally provided identifier.
    pub fn parse(value: impl Into<String>) -> Result<Self, CardValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(CardValidationError::BlankId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CardId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Half-open UTF-16 offset range `[start, end)` into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Builds a non-empty span.
    pub fn new(start: usize, end: usize) -> Result<Self, CardValidationError> {
        if start >= end {
            return Err(CardValidationError::InvalidSpan {
                start: to_wire_offset(start),
                end: to_wire_offset(end),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(self) -> usize {
        self.start
    }

    pub fn end(self) -> usize {
        self.end
    }

    /// Number of UTF-16 code units covered.
    pub fn len(self) -> usize {
        self.end - self.start
    }

    /// Always `false`; kept for the `len`/`is_empty` pairing.
    pub fn is_empty(self) -> bool {
        false
    }

    /// Whether character position `offset` lies inside the span.
    pub fn contains_offset(self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Whether both spans share at least one character.
    pub fn overlaps(self, other: Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether `other` lies entirely inside this span.
    pub fn contains(self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Model-level validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardValidationError {
    BlankId,
    /// Anchored offsets are negative, inverted or empty.
    InvalidSpan { start: i64, end: i64 },
}

impl Display for CardValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankId => write!(f, "card id must not be blank"),
            Self::InvalidSpan { start, end } => write!(
                f,
                "invalid span [{start}, {end}); expected 0 <= start < end or both -1"
            ),
        }
    }
}

impl Error for CardValidationError {}

/// Canonical annotation record ("card").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CardRecord", into = "CardRecord")]
pub struct Card {
    id: CardId,
    kind: CardType,
    label: String,
    note: Option<String>,
    anchor: Option<Span>,
}

impl Card {
    /// Creates a card tied to a span of the source text.
    pub fn anchored(span: Span, kind: CardType, label: impl Into<String>) -> Self {
        Self::from_parts(CardId::generate(), kind, label, None, Some(span))
    }

    /// Creates a free-floating card with no text position.
    pub fn unanchored(kind: CardType, label: impl Into<String>) -> Self {
        Self::from_parts(CardId::generate(), kind, label, None, None)
    }

    /// Rebuilds a card from already validated parts.
    ///
    /// Used by import paths where identity exists externally. The note is
    /// kept verbatim so imported documents are written back unchanged.
    /// Edits go through [`CardPatch`], which normalizes the note.
    pub fn from_parts(
        id: CardId,
        kind: CardType,
        label: impl Into<String>,
        note: Option<String>,
        anchor: Option<Span>,
    ) -> Self {
        Self {
            id,
            kind,
            label: label.into(),
            note,
            anchor,
        }
    }

    pub fn id(&self) -> &CardId {
        &self.id
    }

    pub fn kind(&self) -> CardType {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn anchor(&self) -> Option<Span> {
        self.anchor
    }

    pub fn is_anchored(&self) -> bool {
        self.anchor.is_some()
    }

    /// Start offset in persisted form: the span start, or `-1` when unanchored.
    pub fn wire_start(&self) -> i64 {
        self.anchor
            .map_or(UNANCHORED_OFFSET, |span| to_wire_offset(span.start))
    }

    /// Case-insensitive substring match over label and note.
    ///
    /// `needle_lower` must already be lowercase; an empty needle matches all.
    pub fn matches_lowercase(&self, needle_lower: &str) -> bool {
        if needle_lower.is_empty() {
            return true;
        }
        self.label.to_lowercase().contains(needle_lower)
            || self
                .note
                .as_deref()
                .is_some_and(|note| note.to_lowercase().contains(needle_lower))
    }

    pub(crate) fn set_kind(&mut self, kind: CardType) {
        self.kind = kind;
    }

    pub(crate) fn set_label(&mut self, label: String) {
        self.label = label;
    }

    pub(crate) fn set_note(&mut self, note: Option<String>) {
        self.note = normalize_note(note);
    }
}

/// Partial update for mutable card fields.
///
/// `None` leaves a field untouched. A note that is blank after trimming
/// clears the stored note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardPatch {
    pub kind: Option<CardType>,
    pub label: Option<String>,
    pub note: Option<String>,
}

impl CardPatch {
    pub fn kind(kind: CardType) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn note(note: impl Into<String>) -> Self {
        Self {
            note: Some(note.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.label.is_none() && self.note.is_none()
    }
}

fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|value| trim(&value).to_string())
        .filter(|value| !value.is_empty())
}

fn to_wire_offset(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Persisted `cards[]` entry shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardRecord {
    id: String,
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    caption: Option<String>,
    #[serde(rename = "type")]
    kind: CardType,
    start_index: i64,
    end_index: i64,
}

impl TryFrom<CardRecord> for Card {
    type Error = CardValidationError;

    fn try_from(record: CardRecord) -> Result<Self, Self::Error> {
        let id = CardId::parse(record.id)?;
        let anchor = decode_anchor(record.start_index, record.end_index)?;
        Ok(Self::from_parts(
            id,
            record.kind,
            record.text,
            record.caption,
            anchor,
        ))
    }
}

impl From<Card> for CardRecord {
    fn from(card: Card) -> Self {
        let (start_index, end_index) = match card.anchor {
            Some(span) => (to_wire_offset(span.start), to_wire_offset(span.end)),
            None => (UNANCHORED_OFFSET, UNANCHORED_OFFSET),
        };
        Self {
            id: card.id.0,
            text: card.label,
            caption: card.note,
            kind: card.kind,
            start_index,
            end_index,
        }
    }
}

fn decode_anchor(start: i64, end: i64) -> Result<Option<Span>, CardValidationError> {
    if start == UNANCHORED_OFFSET && end == UNANCHORED_OFFSET {
        return Ok(None);
    }
    let invalid = CardValidationError::InvalidSpan { start, end };
    let start = usize::try_from(start).map_err(|_| invalid.clone())?;
    let end = usize::try_from(end).map_err(|_| invalid.clone())?;
    Span::new(start, end).map(Some).map_err(|_| invalid)
}
