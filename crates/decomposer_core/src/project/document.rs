//! Persisted project document codec.
//!
//! # Responsibility
//! - Encode the full project state as the JSON project document.
//! - Decode and structurally validate a document before anyone applies it.
//!
//! # Invariants
//! - Decoding is all-or-nothing: any structural mismatch rejects the whole
//!   document and nothing is returned.
//! - Cards are persisted verbatim, ids included.
//! - Encoding uses two-space indented JSON.

use crate::model::card::Card;
use crate::model::card_type::CardType;
use crate::model::visibility::ColumnVisibility;
use crate::store::card_store::StoreError;
use log::warn;
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

const FIELD_RAW_TEXT: &str = "rawText";
const FIELD_CARDS: &str = "cards";
const FIELD_COLUMN_VISIBILITY: &str = "columnVisibility";

/// Malformed project document.
#[derive(Debug)]
pub enum FormatError {
    /// Input is not JSON at all.
    Json(serde_json::Error),
    /// Top-level value is not a JSON object.
    NotAnObject,
    /// A top-level field is missing or has the wrong JSON type.
    FieldType {
        field: &'static str,
        expected: &'static str,
    },
    /// One `cards[]` entry cannot be decoded.
    InvalidCard { index: usize, message: String },
    /// One `columnVisibility` entry is not a boolean.
    InvalidVisibility { key: String, message: String },
    /// Decoded cards are inconsistent with the text (bounds, duplicate ids).
    Store(StoreError),
}

impl Display for FormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "project document is not valid JSON: {err}"),
            Self::NotAnObject => write!(f, "project document must be a JSON object"),
            Self::FieldType { field, expected } => {
                write!(f, "project field `{field}` must be {expected}")
            }
            Self::InvalidCard { index, message } => {
                write!(f, "invalid card at index {index}: {message}")
            }
            Self::InvalidVisibility { key, message } => {
                write!(f, "invalid column visibility `{key}`: {message}")
            }
            Self::Store(err) => write!(f, "invalid project cards: {err}"),
        }
    }
}

impl Error for FormatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FormatError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<StoreError> for FormatError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Full persisted project state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    pub raw_text: String,
    pub cards: Vec<Card>,
    pub column_visibility: ColumnVisibility,
}

impl ProjectDocument {
    /// Encodes as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, FormatError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decodes and validates a JSON project document.
    ///
    /// # Errors
    /// - `Json` for unparsable input.
    /// - `NotAnObject`/`FieldType` when `rawText` is not a string, `cards`
    ///   is not an array or `columnVisibility` is not an object.
    /// - `InvalidCard`/`InvalidVisibility` for malformed entries.
    ///
    /// Span bounds against `rawText` are checked when the store applies the
    /// document.
    pub fn from_json(input: &str) -> Result<Self, FormatError> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    /// Same as [`ProjectDocument::from_json`] for an already parsed value.
    pub fn from_value(value: Value) -> Result<Self, FormatError> {
        let Value::Object(mut root) = value else {
            return Err(FormatError::NotAnObject);
        };

        let raw_text = match root.remove(FIELD_RAW_TEXT) {
            Some(Value::String(text)) => text,
            _ => {
                return Err(FormatError::FieldType {
                    field: FIELD_RAW_TEXT,
                    expected: "a string",
                })
            }
        };
        let card_values = match root.remove(FIELD_CARDS) {
            Some(Value::Array(values)) => values,
            _ => {
                return Err(FormatError::FieldType {
                    field: FIELD_CARDS,
                    expected: "an array",
                })
            }
        };
        let visibility_map = match root.remove(FIELD_COLUMN_VISIBILITY) {
            Some(Value::Object(map)) => map,
            _ => {
                return Err(FormatError::FieldType {
                    field: FIELD_COLUMN_VISIBILITY,
                    expected: "an object",
                })
            }
        };

        let cards = card_values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                serde_json::from_value::<Card>(value).map_err(|err| FormatError::InvalidCard {
                    index,
                    message: err.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw_text,
            cards,
            column_visibility: decode_visibility(visibility_map)?,
        })
    }
}

/// Missing categories default to visible; unknown keys are ignored.
fn decode_visibility(map: Map<String, Value>) -> Result<ColumnVisibility, FormatError> {
    let mut visibility = ColumnVisibility::all_visible();
    for (key, value) in map {
        let Ok(kind) = key.parse::<CardType>() else {
            warn!("event=project_decode module=project status=warn reason=unknown_visibility_key");
            continue;
        };
        let Value::Bool(flag) = value else {
            return Err(FormatError::InvalidVisibility {
                key,
                message: "expected a boolean".to_string(),
            });
        };
        visibility.set(kind, flag);
    }
    Ok(visibility)
}
