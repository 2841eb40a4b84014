//! Render-time merge of source text and anchored cards.
//!
//! # Responsibility
//! - Interleave plain text with tagged segments for the rendering surface.
//!
//! # Invariants
//! - Neither the text nor the cards are mutated.
//! - Tagged segments carry the live text at the span, not the card label.
//! - Concatenating all segment texts reproduces the source text exactly.
//! - Overlap policy is first-wins: a card starting before the cursor is
//!   left out of the inline projection and listed in `shadowed`.

use crate::model::card::{Card, CardId, Span};
use crate::model::card_type::CardType;
use crate::model::source_text::SourceText;
use log::debug;

/// One rendered piece of the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Tagged {
        card_id: &'a CardId,
        kind: CardType,
        span: Span,
        text: &'a str,
    },
}

impl<'a> Segment<'a> {
    pub fn text(&self) -> &'a str {
        match *self {
            Self::Plain(text) => text,
            Self::Tagged { text, .. } => text,
        }
    }

    pub fn card_id(&self) -> Option<&'a CardId> {
        match *self {
            Self::Plain(_) => None,
            Self::Tagged { card_id, .. } => Some(card_id),
        }
    }
}

/// Ordered segment sequence plus the cards that could not be placed inline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection<'a> {
    pub segments: Vec<Segment<'a>>,
    /// Cards overlapping an earlier tagged segment, or reaching past the end
    /// of the text. They remain in card lists; only the inline highlight is
    /// missing.
    pub shadowed: Vec<&'a CardId>,
}

impl Projection<'_> {
    /// Concatenated segment text.
    pub fn render_plain(&self) -> String {
        self.segments.iter().map(Segment::text).collect()
    }

    pub fn tagged_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| segment.card_id().is_some())
            .count()
    }
}

/// Projects `cards` onto `text`.
///
/// Unanchored cards are ignored. Cards are walked in ascending start order
/// (stable for equal starts), so callers may pass any order.
pub fn project<'a, I>(text: &'a SourceText, cards: I) -> Projection<'a>
where
    I: IntoIterator<Item = &'a Card>,
{
    let mut anchored: Vec<(Span, &'a Card)> = cards
        .into_iter()
        .filter_map(|card| card.anchor().map(|span| (span, card)))
        .collect();
    anchored.sort_by_key(|(span, _)| span.start());

    let mut projection = Projection::default();
    let mut cursor = 0usize;

    for (span, card) in anchored {
        if span.start() < cursor {
            projection.shadowed.push(card.id());
            continue;
        }
        let Some(tagged) = text.slice_span(span) else {
            projection.shadowed.push(card.id());
            continue;
        };
        if span.start() > cursor {
            if let Some(plain) = text.slice(cursor, span.start()) {
                projection.segments.push(Segment::Plain(plain));
            }
        }
        projection.segments.push(Segment::Tagged {
            card_id: card.id(),
            kind: card.kind(),
            span,
            text: tagged,
        });
        cursor = span.end();
    }

    if cursor < text.len_utf16() {
        if let Some(plain) = text.tail(cursor) {
            projection.segments.push(Segment::Plain(plain));
        }
    }

    if !projection.shadowed.is_empty() {
        debug!(
            "event=project module=render status=ok segments={} shadowed={}",
            projection.segments.len(),
            projection.shadowed.len()
        );
    }
    projection
}
