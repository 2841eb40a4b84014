//! Grouped plain-text export.

use crate::export::export_order;
use crate::model::card::Card;

const NOTE_INDENT: &str = "    ";

/// Renders cards grouped under `=== <display name> ===` headers.
///
/// Each card contributes its label line, then its non-empty note with every
/// line indented, then a blank line. Categories without cards are omitted.
pub fn export_grouped_text(cards: &[Card]) -> String {
    let mut content = String::new();
    let mut current_kind = None;

    for card in export_order(cards) {
        if current_kind != Some(card.kind()) {
            current_kind = Some(card.kind());
            content.push_str("=== ");
            content.push_str(card.kind().display_name());
            content.push_str(" ===\n\n");
        }
        content.push_str(card.label());
        content.push('\n');
        if let Some(note) = card.note().filter(|note| !note.is_empty()) {
            content.push_str(NOTE_INDENT);
            content.push_str(&note.replace('\n', &format!("\n{NOTE_INDENT}")));
            content.push('\n');
        }
        content.push('\n');
    }

    content
}

#[cfg(test)]
mod tests {
    use super::export_grouped_text;
    use crate::model::card::{Card, CardId, Span};
    use crate::model::card_type::CardType;

    fn card(id: &str, kind: CardType, label: &str, note: Option<&str>, at: Option<(usize, usize)>) -> Card {
        Card::from_parts(
            CardId::parse(id).unwrap(),
            kind,
            label,
            note.map(str::to_string),
            at.map(|(start, end)| Span::new(start, end).unwrap()),
        )
    }

    #[test]
    fn groups_in_category_order_with_indented_notes() {
        let cards = vec![
            card("q", CardType::Question, "why?", None, Some((20, 24))),
            card("r2", CardType::Role, "admin", Some("line one\nline two"), Some((10, 15))),
            card("r1", CardType::Role, "user", None, Some((4, 8))),
        ];

        let expected = "=== Роль ===\n\n\
                        user\n\n\
                        admin\n    line one\n    line two\n\n\
                        === Вопрос ===\n\n\
                        why?\n\n";
        assert_eq!(export_grouped_text(&cards), expected);
    }

    #[test]
    fn unanchored_cards_lead_their_group() {
        let cards = vec![
            card("a", CardType::Object, "anchored", None, Some((0, 3))),
            card("b", CardType::Object, "free", None, None),
        ];
        let text = export_grouped_text(&cards);
        assert!(text.find("free").unwrap() < text.find("anchored").unwrap());
    }

    #[test]
    fn empty_imported_note_adds_no_line() {
        let cards = vec![card("a", CardType::Scenario, "login", Some(""), Some((0, 5)))];
        assert_eq!(export_grouped_text(&cards), "=== Сценарий ===\n\nlogin\n\n");
    }

    #[test]
    fn empty_collection_exports_nothing() {
        assert_eq!(export_grouped_text(&[]), "");
    }
}
