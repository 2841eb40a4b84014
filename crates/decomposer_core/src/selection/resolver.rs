//! Raw text selection to validated span.
//!
//! # Responsibility
//! - Normalize anchor/focus points reported by the rendering surface into
//!   one UTF-16 offset range of the source text.
//! - Decide whether a selection can become a card.
//!
//! # Invariants
//! - Resolution is pure: same input, same output, no side effects.
//! - Offsets track the trimmed text: `text == source[start..end]` always
//!   holds for a resolved selection.
//! - Rejections are `None`, never errors.

use crate::model::card::Span;
use crate::model::source_text::{is_trimmable, utf16_len, SourceText};
use crate::render::projector::Projection;

/// One end of a raw selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPoint {
    /// Character offset inside the text container.
    Inside(usize),
    /// The point lies outside the text container.
    Outside,
}

impl SelectionPoint {
    /// Translates a point given as (rendered segment, UTF-16 offset within it)
    /// into a container offset.
    ///
    /// Surfaces render one node per projection segment, so the container
    /// offset is the UTF-16 length of all preceding segments plus the local
    /// offset. Unknown segments or offsets past the segment end map to
    /// `Outside`.
    pub fn from_segment(projection: &Projection<'_>, segment: usize, offset: usize) -> Self {
        let Some(target) = projection.segments.get(segment) else {
            return Self::Outside;
        };
        if offset > utf16_len(target.text()) {
            return Self::Outside;
        }
        let preceding: usize = projection.segments[..segment]
            .iter()
            .map(|segment| utf16_len(segment.text()))
            .sum();
        Self::Inside(preceding + offset)
    }
}

/// A selection accepted for card creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionInfo {
    /// Trimmed selected text.
    pub text: String,
    pub span: Span,
}

impl SelectionInfo {
    pub fn start_index(&self) -> usize {
        self.span.start()
    }

    pub fn end_index(&self) -> usize {
        self.span.end()
    }
}

/// Resolves a raw selection against the container text.
///
/// Returns `None` when either point is outside the container, the selection
/// is collapsed, a point is past the end of the text, or the selection holds
/// only whitespace. Backward selections (focus before anchor) are accepted.
pub fn resolve(
    anchor: SelectionPoint,
    focus: SelectionPoint,
    container: &SourceText,
) -> Option<SelectionInfo> {
    let (SelectionPoint::Inside(anchor), SelectionPoint::Inside(focus)) = (anchor, focus) else {
        return None;
    };
    let (start, end) = if anchor <= focus {
        (anchor, focus)
    } else {
        (focus, anchor)
    };
    if start == end {
        return None;
    }

    let raw = container.slice(start, end)?;
    let trimmed_start = raw.trim_start_matches(is_trimmable);
    let leading = utf16_len(&raw[..raw.len() - trimmed_start.len()]);
    let trimmed = trimmed_start.trim_end_matches(is_trimmable);
    if trimmed.is_empty() {
        return None;
    }

    let start = start + leading;
    let span = Span::new(start, start + utf16_len(trimmed)).ok()?;
    Some(SelectionInfo {
        text: trimmed.to_string(),
        span,
    })
}
