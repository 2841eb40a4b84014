//! Immutable source text and its offset coordinate space.
//!
//! # Responsibility
//! - Own the text every span offset refers to.
//! - Translate UTF-16 offsets into UTF-8 byte offsets for slicing.
//!
//! # Invariants
//! - Offsets are counted in UTF-16 code units, the unit persisted project
//!   documents use. A character outside the Basic Multilingual Plane takes
//!   two units.
//! - An offset between the two halves of a surrogate pair addresses no
//!   character boundary and never slices.
//! - The text is never mutated; replacing it means building a new value.

use crate::model::card::Span;
use std::fmt::{Debug, Formatter};

/// Whitespace as stripped by selection and blank-text checks.
///
/// Unicode `White_Space` plus U+FEFF (byte order mark).
pub(crate) fn is_trimmable(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

/// Trims [`is_trimmable`] characters from both ends.
pub(crate) fn trim(value: &str) -> &str {
    value.trim_matches(is_trimmable)
}

/// Length of `value` in UTF-16 code units.
pub fn utf16_len(value: &str) -> usize {
    value.chars().map(char::len_utf16).sum()
}

/// Immutable text buffer addressed by UTF-16 offsets.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceText {
    text: String,
    /// Byte offset for every UTF-16 offset `0..=len`; `None` inside a
    /// surrogate pair.
    boundaries: Vec<Option<usize>>,
}

impl SourceText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut boundaries = Vec::with_capacity(text.len() + 1);
        for (byte, ch) in text.char_indices() {
            boundaries.push(Some(byte));
            if ch.len_utf16() == 2 {
                boundaries.push(None);
            }
        }
        boundaries.push(Some(text.len()));
        Self { text, boundaries }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in UTF-16 code units.
    pub fn len_utf16(&self) -> usize {
        self.boundaries.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether the text holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        trim(&self.text).is_empty()
    }

    /// Byte offset of UTF-16 position `offset`.
    ///
    /// `offset == len_utf16()` maps to the end of the buffer; offsets past
    /// the end or inside a surrogate pair map to `None`.
    pub fn byte_offset(&self, offset: usize) -> Option<usize> {
        self.boundaries.get(offset).copied().flatten()
    }

    /// Whether `offset` falls on a character boundary within the text.
    pub fn is_boundary(&self, offset: usize) -> bool {
        self.byte_offset(offset).is_some()
    }

    /// Slices `[start, end)` in UTF-16 coordinates.
    ///
    /// Returns `None` for inverted, out-of-range or mid-character bounds.
    pub fn slice(&self, start: usize, end: usize) -> Option<&str> {
        if start > end {
            return None;
        }
        let from = self.byte_offset(start)?;
        let to = self.byte_offset(end)?;
        Some(&self.text[from..to])
    }

    /// Slices the text covered by `span`.
    pub fn slice_span(&self, span: Span) -> Option<&str> {
        self.slice(span.start(), span.end())
    }

    /// Slices from `start` to the end of the text.
    pub fn tail(&self, start: usize) -> Option<&str> {
        self.slice(start, self.len_utf16())
    }

    /// Whether both ends of `span` are character boundaries of the text.
    pub fn contains_span(&self, span: Span) -> bool {
        self.is_boundary(span.start()) && self.is_boundary(span.end())
    }
}

impl Default for SourceText {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl Debug for SourceText {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Source text is user content; keep debug output metadata-only.
        f.debug_struct("SourceText")
            .field("utf16_len", &self.len_utf16())
            .field("bytes", &self.text.len())
            .finish()
    }
}

impl From<String> for SourceText {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SourceText {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
