//! Annotation session controller.
//!
//! # Responsibility
//! - Own the whole application state: source text, card store, column
//!   visibility and the transient active/edit targets.
//! - Expose every user intent as one named operation.
//! - Serialize project loads.
//!
//! # Invariants
//! - Replacing the text clears all cards and transient targets.
//! - Loading a project is atomic: on any error the previous state is kept.
//! - At most one load is in flight; a second `begin_load` is rejected.
//! - Update/retype/delete on an unknown id is a silent no-op.

use crate::config::SessionConfig;
use crate::export::table::export_table;
use crate::export::text::export_grouped_text;
use crate::io::{FileSurface, IoError, MIME_JSON, MIME_TABLE, MIME_TEXT};
use crate::model::card::{Card, CardId, CardPatch};
use crate::model::card_type::CardType;
use crate::model::source_text::SourceText;
use crate::model::visibility::ColumnVisibility;
use crate::project::document::{FormatError, ProjectDocument};
use crate::render::projector::{project, Projection};
use crate::selection::resolver::{resolve, SelectionInfo, SelectionPoint};
use crate::store::card_store::{CardFilter, CardGroup, CardStore, StoreError};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

const NOTICE_DUPLICATE: &str = "Карточка с таким текстом и типом уже существует.";
const NOTICE_INVALID_FORMAT: &str = "Неверный формат файла проекта.";
const NOTICE_READ_FAILED: &str = "Не удалось прочитать файл проекта.";
const NOTICE_BLANK_TEXT: &str = "Текст требований не может быть пустым.";
const NOTICE_LOAD_BUSY: &str = "Загрузка проекта уже выполняется.";
const NOTICE_STALE_SELECTION: &str = "Выделение больше не соответствует тексту.";

/// Errors surfaced by session operations.
#[derive(Debug)]
pub enum SessionError {
    /// Replacement text is empty or whitespace only.
    BlankText,
    /// A card with the same span and type already exists.
    Duplicate { start: usize, end: usize, kind: CardType },
    /// The selection does not fit the current text (text was replaced).
    StaleSelection,
    /// Malformed project document; state unchanged.
    Format(FormatError),
    /// Another project load has not finished yet.
    LoadInFlight,
    /// The ticket does not belong to the load in flight.
    UnknownLoad,
    Io(IoError),
    Store(StoreError),
}

impl SessionError {
    /// Short user-facing notice for this failure.
    pub fn user_notice(&self) -> &'static str {
        match self {
            Self::BlankText => NOTICE_BLANK_TEXT,
            Self::Duplicate { .. } => NOTICE_DUPLICATE,
            Self::StaleSelection => NOTICE_STALE_SELECTION,
            Self::Format(FormatError::Json(_)) | Self::Io(_) => NOTICE_READ_FAILED,
            Self::Format(_) => NOTICE_INVALID_FORMAT,
            Self::LoadInFlight | Self::UnknownLoad => NOTICE_LOAD_BUSY,
            Self::Store(_) => NOTICE_INVALID_FORMAT,
        }
    }
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankText => write!(f, "source text must not be blank"),
            Self::Duplicate { start, end, kind } => write!(
                f,
                "card of type {kind} already exists for span [{start}, {end})"
            ),
            Self::StaleSelection => write!(f, "selection does not match the current text"),
            Self::Format(err) => write!(f, "{err}"),
            Self::LoadInFlight => write!(f, "a project load is already in flight"),
            Self::UnknownLoad => write!(f, "load ticket does not match the load in flight"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Format(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FormatError> for SessionError {
    fn from(value: FormatError) -> Self {
        Self::Format(value)
    }
}

impl From<IoError> for SessionError {
    fn from(value: IoError) -> Self {
        Self::Io(value)
    }
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::DuplicateCard { start, end, kind } => Self::Duplicate { start, end, kind },
            other => Self::Store(other),
        }
    }
}

/// Proof of a started load, consumed by [`Session::finish_load`].
#[derive(Debug, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Single-owner application state.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    source: SourceText,
    store: CardStore,
    visibility: ColumnVisibility,
    active_card: Option<CardId>,
    editing_card: Option<CardId>,
    load_in_flight: Option<u64>,
    next_load: u64,
}

impl Session {
    pub fn new(config: SessionConfig, text: impl Into<String>) -> Self {
        Self {
            config,
            source: SourceText::new(text),
            store: CardStore::new(),
            visibility: ColumnVisibility::default(),
            active_card: None,
            editing_card: None,
            load_in_flight: None,
            next_load: 0,
        }
    }

    /// Session with default configuration.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new(SessionConfig::default(), text)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn source_text(&self) -> &SourceText {
        &self.source
    }

    pub fn store(&self) -> &CardStore {
        &self.store
    }

    pub fn cards(&self) -> &[Card] {
        self.store.cards()
    }

    pub fn visibility(&self) -> &ColumnVisibility {
        &self.visibility
    }

    pub fn active_card(&self) -> Option<&CardId> {
        self.active_card.as_ref()
    }

    pub fn editing_card(&self) -> Option<&Card> {
        self.editing_card.as_ref().and_then(|id| self.store.get(id))
    }

    pub fn is_loading(&self) -> bool {
        self.load_in_flight.is_some()
    }

    /// Replaces the source text and drops every card.
    ///
    /// # Errors
    /// - `BlankText` for empty/whitespace-only text; nothing changes.
    pub fn replace_text(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        let text = SourceText::new(text);
        if text.is_blank() {
            return Err(SessionError::BlankText);
        }
        self.source = text;
        self.store.clear();
        self.reset_transient();
        info!(
            "event=text_replace module=session status=ok len_utf16={}",
            self.source.len_utf16()
        );
        Ok(())
    }

    /// Resolves a raw selection against the current text.
    pub fn resolve_selection(
        &self,
        anchor: SelectionPoint,
        focus: SelectionPoint,
    ) -> Option<SelectionInfo> {
        resolve(anchor, focus, &self.source)
    }

    /// Creates an anchored card from a resolved selection.
    ///
    /// # Errors
    /// - `Duplicate` when the span already carries a card of `kind`.
    /// - `StaleSelection` when the selection no longer matches the text.
    pub fn create_card(
        &mut self,
        selection: &SelectionInfo,
        kind: CardType,
    ) -> Result<CardId, SessionError> {
        if self.source.slice_span(selection.span) != Some(selection.text.as_str()) {
            return Err(SessionError::StaleSelection);
        }
        let card = self
            .store
            .create(selection.span, kind, selection.text.clone())?;
        Ok(card.id().clone())
    }

    /// Creates an unanchored placeholder card and makes it the edit target.
    pub fn create_blank_card(&mut self, kind: CardType) -> CardId {
        let card = self
            .store
            .create_unanchored(kind, self.config.blank_card_label.clone());
        self.editing_card = Some(card.id().clone());
        card.id().clone()
    }

    /// Applies an edit and closes the edit target.
    ///
    /// # Errors
    /// - `Duplicate` when a category change collides with another card; the
    ///   edit target stays open.
    pub fn update_card(&mut self, id: &CardId, patch: &CardPatch) -> Result<(), SessionError> {
        match self.store.update(id, patch) {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => {
                debug!("event=card_update module=session status=noop reason=not_found card_id={id}");
            }
            Err(err) => return Err(err.into()),
        }
        self.editing_card = None;
        Ok(())
    }

    /// Drag-and-drop recategorization; returns whether the card changed.
    pub fn retype_card(&mut self, id: &CardId, kind: CardType) -> Result<bool, SessionError> {
        match self.store.retype(id, kind) {
            Ok(changed) => Ok(changed),
            Err(StoreError::NotFound(_)) => {
                debug!("event=card_retype module=session status=noop reason=not_found card_id={id}");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Deletes a card and clears transient targets pointing at it.
    pub fn delete_card(&mut self, id: &CardId) -> bool {
        let removed = self.store.delete(id);
        if self.active_card.as_ref() == Some(id) {
            self.active_card = None;
        }
        if self.editing_card.as_ref() == Some(id) {
            self.editing_card = None;
        }
        removed
    }

    /// Sets or clears the hover link between text and card list.
    pub fn set_active_card(&mut self, id: Option<CardId>) {
        self.active_card = id.filter(|id| self.store.get(id).is_some());
    }

    /// Opens the edit target; unknown ids are ignored.
    pub fn begin_edit(&mut self, id: &CardId) {
        if self.store.get(id).is_some() {
            self.editing_card = Some(id.clone());
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing_card = None;
    }

    pub fn set_column_visible(&mut self, kind: CardType, visible: bool) {
        self.visibility.set(kind, visible);
    }

    /// Flips one column and returns the new flag.
    pub fn toggle_column(&mut self, kind: CardType) -> bool {
        self.visibility.toggle(kind)
    }

    /// Text interleaved with every anchored card.
    pub fn projection(&self) -> Projection<'_> {
        project(&self.source, self.store.anchored())
    }

    /// Anchored cards of visible categories in position order.
    pub fn visible_cards(&self) -> Vec<&Card> {
        self.store.query_visible(&self.visibility)
    }

    /// Card pool matching `filter`.
    pub fn filter_cards(&self, filter: &CardFilter) -> Vec<&Card> {
        self.store.query(filter)
    }

    /// Column view: one group per visible category, empty ones included.
    pub fn column_groups(&self, filter: &CardFilter) -> Vec<CardGroup<'_>> {
        self.store.grouped(filter, Some(&self.visibility))
    }

    /// Table view: one group per non-empty category.
    pub fn table_groups(&self, filter: &CardFilter) -> Vec<CardGroup<'_>> {
        self.store.grouped(filter, None)
    }

    /// Cards highlighted at character position `offset`.
    pub fn cards_at(&self, offset: usize) -> Vec<&Card> {
        self.store.cards_at(offset)
    }

    /// Snapshot of the persistable state.
    pub fn to_document(&self) -> ProjectDocument {
        ProjectDocument {
            raw_text: self.source.as_str().to_string(),
            cards: self.store.cards().to_vec(),
            column_visibility: self.visibility,
        }
    }

    /// Encodes the project document as JSON.
    pub fn save_project(&self) -> Result<String, SessionError> {
        Ok(self.to_document().to_json_pretty()?)
    }

    pub fn export_text(&self) -> String {
        export_grouped_text(self.store.cards())
    }

    pub fn export_table(&self) -> String {
        export_table(self.store.cards())
    }

    /// Replaces the whole state with a decoded document.
    ///
    /// # Errors
    /// - `Format` for malformed documents or spans outside `rawText`; the
    ///   previous state is kept.
    pub fn apply_document(&mut self, document: ProjectDocument) -> Result<(), SessionError> {
        let source = SourceText::new(document.raw_text);
        let mut store = CardStore::new();
        store
            .replace_all(&source, document.cards)
            .map_err(FormatError::from)?;

        self.source = source;
        self.store = store;
        self.visibility = document.column_visibility;
        self.reset_transient();
        info!(
            "event=project_load module=session status=ok cards={} len_utf16={}",
            self.store.len(),
            self.source.len_utf16()
        );
        Ok(())
    }

    /// Decodes and applies a JSON project document atomically.
    pub fn load_project(&mut self, json: &str) -> Result<(), SessionError> {
        let result = ProjectDocument::from_json(json)
            .map_err(SessionError::from)
            .and_then(|document| self.apply_document(document));
        if let Err(err) = &result {
            warn!("event=project_load module=session status=rejected error={err}");
        }
        result
    }

    /// Marks a load as started.
    ///
    /// # Errors
    /// - `LoadInFlight` while a previous load has not finished.
    pub fn begin_load(&mut self) -> Result<LoadTicket, SessionError> {
        if self.load_in_flight.is_some() {
            return Err(SessionError::LoadInFlight);
        }
        let ticket = self.next_load;
        self.next_load += 1;
        self.load_in_flight = Some(ticket);
        Ok(LoadTicket(ticket))
    }

    /// Completes the load started with `ticket` using the read result.
    ///
    /// The in-flight slot is released whether or not the load succeeds.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        contents: Result<String, IoError>,
    ) -> Result<(), SessionError> {
        if self.load_in_flight != Some(ticket.0) {
            return Err(SessionError::UnknownLoad);
        }
        self.load_in_flight = None;
        let contents = contents.inspect_err(|err| {
            warn!("event=project_load module=session status=error reason=read error={err}");
        })?;
        self.load_project(&contents)
    }

    /// Reads and loads a project through `surface`.
    pub fn load_from<S: FileSurface>(
        &mut self,
        surface: &S,
        path: &Path,
    ) -> Result<(), SessionError> {
        let ticket = self.begin_load()?;
        let contents = surface.read_text(path);
        self.finish_load(ticket, contents)
    }

    /// Offers the project document for download.
    pub fn save_to<S: FileSurface>(&self, surface: &S) -> Result<(), SessionError> {
        let json = self.save_project()?;
        surface.offer_download(&self.config.project_file_name, &json, MIME_JSON)?;
        Ok(())
    }

    /// Offers the grouped plain-text export for download.
    pub fn export_text_to<S: FileSurface>(&self, surface: &S) -> Result<(), SessionError> {
        surface.offer_download(
            &self.config.text_export_file_name,
            &self.export_text(),
            MIME_TEXT,
        )?;
        Ok(())
    }

    /// Offers the tab-separated export for download.
    pub fn export_table_to<S: FileSurface>(&self, surface: &S) -> Result<(), SessionError> {
        surface.offer_download(
            &self.config.table_export_file_name,
            &self.export_table(),
            MIME_TABLE,
        )?;
        Ok(())
    }

    fn reset_transient(&mut self) {
        self.active_card = None;
        self.editing_card = None;
    }
}

#[cfg(test)]
mod tests {
    use super::{LoadTicket, Session, SessionError};
    use crate::io::IoError;
    use crate::model::card::{CardId, CardPatch};
    use crate::model::card_type::CardType;
    use crate::selection::resolver::SelectionPoint::Inside;
    use std::path::PathBuf;

    #[test]
    fn blank_card_becomes_edit_target_until_update() {
        let mut session = Session::with_text("text");
        let id = session.create_blank_card(CardType::Role);
        assert_eq!(session.editing_card().unwrap().id(), &id);
        assert_eq!(session.editing_card().unwrap().label(), "Новая карточка");

        session.update_card(&id, &CardPatch::note("n")).unwrap();
        assert!(session.editing_card().is_none());
    }

    #[test]
    fn delete_clears_active_and_edit_targets() {
        let mut session = Session::with_text("The user can login.");
        let selection = session.resolve_selection(Inside(4), Inside(8)).unwrap();
        let id = session.create_card(&selection, CardType::Role).unwrap();
        session.set_active_card(Some(id.clone()));
        session.begin_edit(&id);

        assert!(session.delete_card(&id));
        assert!(session.active_card().is_none());
        assert!(session.editing_card().is_none());
    }

    #[test]
    fn missing_ids_are_silent_noops() {
        let mut session = Session::with_text("abc");
        let ghost = CardId::parse("ghost").unwrap();
        session.update_card(&ghost, &CardPatch::note("x")).unwrap();
        assert!(!session.retype_card(&ghost, CardType::Object).unwrap());
        assert!(!session.delete_card(&ghost));
        session.set_active_card(Some(ghost));
        assert!(session.active_card().is_none());
    }

    #[test]
    fn stale_selection_is_rejected_after_text_replacement() {
        let mut session = Session::with_text("The user can login.");
        let selection = session.resolve_selection(Inside(4), Inside(8)).unwrap();
        session.replace_text("A different text").unwrap();
        assert!(matches!(
            session.create_card(&selection, CardType::Role),
            Err(SessionError::StaleSelection)
        ));
    }

    #[test]
    fn blank_replacement_text_is_rejected() {
        let mut session = Session::with_text("abc");
        session.create_blank_card(CardType::Object);
        let err = session.replace_text(" \n\t").unwrap_err();
        assert!(matches!(err, SessionError::BlankText));
        assert_eq!(session.cards().len(), 1);
    }

    #[test]
    fn second_load_is_rejected_while_first_is_in_flight() {
        let mut session = Session::with_text("abc");
        let first = session.begin_load().unwrap();
        assert!(matches!(session.begin_load(), Err(SessionError::LoadInFlight)));

        let read_error = IoError::Read {
            path: PathBuf::from("p.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let err = session.finish_load(first, Err(read_error)).unwrap_err();
        assert_eq!(err.user_notice(), "Не удалось прочитать файл проекта.");
        assert!(!session.is_loading());
        assert!(session.begin_load().is_ok());
    }

    #[test]
    fn foreign_ticket_does_not_finish_load() {
        let mut session = Session::with_text("abc");
        let first = session.begin_load().unwrap();
        let err = session.finish_load(first, Ok("{}".to_string())).unwrap_err();
        assert!(matches!(err, SessionError::Format(_)));

        let _second = session.begin_load().unwrap();
        let err = session.finish_load(LoadTicket(0), Ok(String::new())).unwrap_err();
        assert!(matches!(err, SessionError::UnknownLoad));
        assert!(session.is_loading());
    }

    #[test]
    fn duplicate_error_carries_user_notice() {
        let mut session = Session::with_text("The user can login.");
        let selection = session.resolve_selection(Inside(4), Inside(8)).unwrap();
        session.create_card(&selection, CardType::Role).unwrap();
        let err = session.create_card(&selection, CardType::Role).unwrap_err();
        assert_eq!(
            err.user_notice(),
            "Карточка с таким текстом и типом уже существует."
        );
    }
}
