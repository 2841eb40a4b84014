//! Per-category column visibility preference.
//!
//! Purely presentational; persisted next to the cards for convenience and
//! never consulted by store invariants.

use crate::model::card_type::CardType;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Visibility flag for every category, all visible by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnVisibility {
    flags: [bool; CardType::ALL.len()],
}

impl ColumnVisibility {
    pub fn all_visible() -> Self {
        Self {
            flags: [true; CardType::ALL.len()],
        }
    }

    pub fn all_hidden() -> Self {
        Self {
            flags: [false; CardType::ALL.len()],
        }
    }

    pub fn is_visible(&self, kind: CardType) -> bool {
        self.flags[kind.rank()]
    }

    pub fn set(&mut self, kind: CardType, visible: bool) {
        self.flags[kind.rank()] = visible;
    }

    /// Flips one flag and returns the new value.
    pub fn toggle(&mut self, kind: CardType) -> bool {
        let flag = &mut self.flags[kind.rank()];
        *flag = !*flag;
        *flag
    }

    /// Visible categories in canonical order.
    pub fn visible_types(&self) -> impl Iterator<Item = CardType> + '_ {
        CardType::ALL
            .into_iter()
            .filter(move |kind| self.is_visible(*kind))
    }
}

impl Default for ColumnVisibility {
    fn default() -> Self {
        Self::all_visible()
    }
}

impl Serialize for ColumnVisibility {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let map: BTreeMap<&'static str, bool> = CardType::ALL
            .into_iter()
            .map(|kind| (kind.as_str(), self.is_visible(kind)))
            .collect();
        map.serialize(serializer)
    }
}
