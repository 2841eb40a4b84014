//! Core annotation logic for the requirements decomposer.
//! This crate is the single source of truth for card invariants.

pub mod config;
pub mod export;
pub mod index;
pub mod io;
pub mod logging;
pub mod model;
pub mod project;
pub mod render;
pub mod selection;
pub mod service;
pub mod store;

pub use config::SessionConfig;
pub use export::table::export_table;
pub use export::text::export_grouped_text;
pub use io::{FileSurface, FsSurface, IoError, IoResult};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::card::{Card, CardId, CardPatch, CardValidationError, Span};
pub use model::card_type::{CardType, CardTypeDefinition, UnknownCardType};
pub use model::source_text::SourceText;
pub use model::visibility::ColumnVisibility;
pub use project::document::{FormatError, ProjectDocument};
pub use render::projector::{project, Projection, Segment};
pub use selection::resolver::{resolve, SelectionInfo, SelectionPoint};
pub use service::session::{LoadTicket, Session, SessionError};
pub use store::card_store::{CardFilter, CardGroup, CardStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
