use decomposer_core::{
    CardPatch, CardType, ColumnVisibility, FormatError, FsSurface, ProjectDocument, SelectionPoint,
    Session, SessionConfig, SessionError, StoreError,
};
use serde_json::json;

fn annotated_session() -> Session {
    let mut session = Session::with_text("Менеджер создает заказ.\nКлиент оплачивает.");
    for (start, end, kind) in [
        (0, 8, CardType::Role),
        (17, 22, CardType::Object),
        (24, 30, CardType::Role),
    ] {
        let selection = session
            .resolve_selection(SelectionPoint::Inside(start), SelectionPoint::Inside(end))
            .unwrap();
        session.create_card(&selection, kind).unwrap();
    }
    let question = session.create_blank_card(CardType::Question);
    session
        .update_card(&question, &CardPatch::note("  Кто подтверждает?\nИ когда?  "))
        .unwrap();
    session
}

#[test]
fn save_then_load_restores_identical_state() {
    let mut source = annotated_session();
    source.set_column_visible(CardType::Scenario, false);
    let json = source.save_project().unwrap();

    let mut target = Session::with_text("placeholder");
    target.load_project(&json).unwrap();
    assert_eq!(target.to_document(), source.to_document());
    assert_eq!(target.save_project().unwrap(), json);
}

#[test]
fn empty_and_all_hidden_states_roundtrip() {
    let document = ProjectDocument {
        raw_text: String::new(),
        cards: Vec::new(),
        column_visibility: ColumnVisibility::all_hidden(),
    };
    let decoded = ProjectDocument::from_json(&document.to_json_pretty().unwrap()).unwrap();
    assert_eq!(decoded, document);

    let mut session = Session::with_text("x");
    session
        .load_project(&document.to_json_pretty().unwrap())
        .unwrap();
    assert!(session.cards().is_empty());
    assert!(CardType::ALL
        .into_iter()
        .all(|kind| !session.visibility().is_visible(kind)));
}

#[test]
fn persisted_document_uses_wire_field_names() {
    let session = annotated_session();
    let value: serde_json::Value = serde_json::from_str(&session.save_project().unwrap()).unwrap();

    assert_eq!(value["rawText"], json!("Менеджер создает заказ.\nКлиент оплачивает."));
    assert_eq!(value["cards"][0]["type"], json!("Role"));
    assert_eq!(value["cards"][0]["startIndex"], json!(0));
    assert_eq!(value["cards"][0]["endIndex"], json!(8));
    assert_eq!(value["cards"][0]["text"], json!("Менеджер"));
    assert_eq!(value["cards"][3]["startIndex"], json!(-1));
    assert_eq!(value["cards"][3]["caption"], json!("Кто подтверждает?\nИ когда?"));
    assert!(value["cards"][0].get("caption").is_none());
    assert_eq!(value["columnVisibility"]["Object"], json!(true));
}

#[test]
fn grouped_text_export_lists_categories_in_canonical_order() {
    let session = annotated_session();
    let text = session.export_text();

    let object = text.find("=== Объект ===").unwrap();
    let role = text.find("=== Роль ===").unwrap();
    let question = text.find("=== Вопрос ===").unwrap();
    assert!(object < role && role < question);
    assert!(!text.contains("=== Сценарий ==="));
    assert!(text.contains("Новая карточка\n    Кто подтверждает?\n    И когда?\n"));
    assert!(text.find("Менеджер").unwrap() < text.find("Клиент").unwrap());
}

#[test]
fn downloads_and_reload_go_through_file_surface() {
    let dir = tempfile::tempdir().unwrap();
    let surface = FsSurface::new(dir.path());
    let session = annotated_session();

    session.save_to(&surface).unwrap();
    session.export_text_to(&surface).unwrap();
    session.export_table_to(&surface).unwrap();

    let config = SessionConfig::default();
    for name in [
        &config.project_file_name,
        &config.text_export_file_name,
        &config.table_export_file_name,
    ] {
        assert!(dir.path().join(name).is_file(), "{name} missing");
    }

    let mut reloaded = Session::with_text("placeholder");
    reloaded
        .load_from(&surface, &dir.path().join(&config.project_file_name))
        .unwrap();
    assert_eq!(reloaded.to_document(), session.to_document());
    assert!(!reloaded.is_loading());
}

#[test]
fn failed_read_releases_load_slot_and_keeps_state() {
    let dir = tempfile::tempdir().unwrap();
    let surface = FsSurface::new(dir.path());
    let mut session = annotated_session();
    let before = session.to_document();

    let err = session
        .load_from(&surface, &dir.path().join("missing.json"))
        .unwrap_err();
    assert!(matches!(err, SessionError::Io(_)));
    assert_eq!(session.to_document(), before);
    assert!(!session.is_loading());
}

#[test]
fn duplicate_ids_in_document_are_rejected() {
    let mut session = Session::with_text("abc");
    let err = session
        .load_project(
            &json!({
                "rawText": "abc",
                "cards": [
                    {"id": "same", "text": "a", "type": "Role", "startIndex": 0, "endIndex": 1},
                    {"id": "same", "text": "b", "type": "Object", "startIndex": 1, "endIndex": 2}
                ],
                "columnVisibility": {}
            })
            .to_string(),
        )
        .unwrap_err();
    assert!(matches!(err, SessionError::Format(_)));
    assert!(session.cards().is_empty());
}

#[test]
fn astral_plane_offsets_are_utf16_units() {
    let document = json!({
        "rawText": "😀 user 🚀 logs in",
        "cards": [
            {"id": "c1", "text": "user", "type": "Role", "startIndex": 3, "endIndex": 7},
            {"id": "c2", "text": "🚀 logs", "type": "Scenario", "startIndex": 8, "endIndex": 15}
        ],
        "columnVisibility": {}
    })
    .to_string();

    let mut session = Session::with_text("placeholder");
    session.load_project(&document).unwrap();
    assert_eq!(session.source_text().len_utf16(), 18);

    let projection = session.projection();
    let tagged: Vec<_> = projection
        .segments
        .iter()
        .filter(|segment| segment.card_id().is_some())
        .map(|segment| segment.text())
        .collect();
    assert_eq!(tagged, vec!["user", "🚀 logs"]);
    assert_eq!(projection.render_plain(), "😀 user 🚀 logs in");

    let selection = session
        .resolve_selection(SelectionPoint::Inside(16), SelectionPoint::Inside(18))
        .unwrap();
    assert_eq!(selection.text, "in");
    let saved: serde_json::Value = serde_json::from_str(&session.save_project().unwrap()).unwrap();
    assert_eq!(saved["cards"][1]["endIndex"], json!(15));
}

#[test]
fn span_inside_surrogate_pair_rejects_load() {
    let mut session = annotated_session();
    let before = session.to_document();
    let err = session
        .load_project(
            &json!({
                "rawText": "😀 user",
                "cards": [
                    {"id": "c1", "text": "?", "type": "Role", "startIndex": 1, "endIndex": 3}
                ],
                "columnVisibility": {}
            })
            .to_string(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Format(FormatError::Store(StoreError::SplitsCharacter {
            start: 1,
            end: 3,
            ..
        }))
    ));
    assert_eq!(session.to_document(), before);
}

#[test]
fn imported_captions_are_written_back_verbatim() {
    let document = json!({
        "rawText": "abc",
        "cards": [
            {"id": "a", "text": "a", "caption": "  line\n", "type": "Role", "startIndex": 0, "endIndex": 1},
            {"id": "b", "text": "b", "caption": "", "type": "Object", "startIndex": 1, "endIndex": 2}
        ],
        "columnVisibility": {}
    });

    let mut session = Session::with_text("placeholder");
    session.load_project(&document.to_string()).unwrap();
    let saved: serde_json::Value = serde_json::from_str(&session.save_project().unwrap()).unwrap();
    assert_eq!(saved["cards"], document["cards"]);
}
