//! Card category model and static presentation descriptors.
//!
//! # Responsibility
//! - Define the closed set of annotation categories.
//! - Map every category to one presentation descriptor at compile time.
//!
//! # Invariants
//! - `CardType::ALL` order is the canonical category order for grouped
//!   views and exports.
//! - Wire names (`Object`, `Role`, ...) are stable and used as map keys in
//!   persisted documents.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Closed enumeration of annotation categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CardType {
    /// A domain entity the requirement talks about.
    Object,
    /// An actor interacting with the system.
    Role,
    /// A process or use-case flow.
    Scenario,
    /// An attribute of an object.
    Property,
    /// An open question raised by the text.
    Question,
}

/// Presentation descriptor consumed by rendering surfaces and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardTypeDefinition {
    /// Human-facing display name, also used as export header.
    pub name: &'static str,
    /// Foreground color token.
    pub color: &'static str,
    /// Highlight background color token.
    pub bg_color: &'static str,
    /// Icon identifier resolved by the rendering surface.
    pub icon: &'static str,
}

impl CardType {
    /// All categories in canonical order.
    pub const ALL: [CardType; 5] = [
        CardType::Object,
        CardType::Role,
        CardType::Scenario,
        CardType::Property,
        CardType::Question,
    ];

    /// Position of this category in [`CardType::ALL`].
    pub fn rank(self) -> usize {
        match self {
            Self::Object => 0,
            Self::Role => 1,
            Self::Scenario => 2,
            Self::Property => 3,
            Self::Question => 4,
        }
    }

    /// Stable wire name used in persisted documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Object => "Object",
            Self::Role => "Role",
            Self::Scenario => "Scenario",
            Self::Property => "Property",
            Self::Question => "Question",
        }
    }

    /// Returns the static presentation descriptor for this category.
    pub fn definition(self) -> &'static CardTypeDefinition {
        match self {
            Self::Object => &OBJECT,
            Self::Role => &ROLE,
            Self::Scenario => &SCENARIO,
            Self::Property => &PROPERTY,
            Self::Question => &QUESTION,
        }
    }

    /// Shortcut for `definition().name`.
    pub fn display_name(self) -> &'static str {
        self.definition().name
    }
}

const OBJECT: CardTypeDefinition = CardTypeDefinition {
    name: "Объект",
    color: "text-blue-300",
    bg_color: "bg-blue-500/20",
    icon: "cube",
};
const ROLE: CardTypeDefinition = CardTypeDefinition {
    name: "Роль",
    color: "text-green-300",
    bg_color: "bg-green-500/20",
    icon: "user-circle",
};
const SCENARIO: CardTypeDefinition = CardTypeDefinition {
    name: "Сценарий",
    color: "text-purple-300",
    bg_color: "bg-purple-500/20",
    icon: "play",
};
const PROPERTY: CardTypeDefinition = CardTypeDefinition {
    name: "Свойство",
    color: "text-yellow-300",
    bg_color: "bg-yellow-500/20",
    icon: "tag",
};
const QUESTION: CardTypeDefinition = CardTypeDefinition {
    name: "Вопрос",
    color: "text-red-300",
    bg_color: "bg-red-500/20",
    icon: "question-mark-circle",
};

impl Display for CardType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a wire name does not match any category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCardType(pub String);

impl Display for UnknownCardType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown card type `{}`; expected Object|Role|Scenario|Property|Question",
            self.0
        )
    }
}

impl std::error::Error for UnknownCardType {}

impl FromStr for CardType {
    type Err = UnknownCardType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        CardType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| UnknownCardType(value.to_string()))
    }
}
