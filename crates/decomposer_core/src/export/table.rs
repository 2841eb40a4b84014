//! Tab-separated table export.

use crate::export::export_order;
use crate::model::card::Card;
use once_cell::sync::Lazy;
use regex::Regex;

const TABLE_HEADER: &str = "Type\tText\tCaption";

static ROW_BREAKING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r\n|[\r\n\t]").expect("valid row-breaking regex"));

/// Renders one header row plus one row per card.
///
/// The header line always ends with `\n`; card rows are joined with `\n`
/// and carry no trailing newline. Line breaks and tabs inside fields become
/// single spaces.
pub fn export_table(cards: &[Card]) -> String {
    let rows: Vec<String> = export_order(cards)
        .into_iter()
        .map(|card| {
            let label = sanitize_field(card.label());
            let note = sanitize_field(card.note().unwrap_or_default());
            format!("{}\t{label}\t{note}", card.kind().display_name())
        })
        .collect();
    format!("{TABLE_HEADER}\n{}", rows.join("\n"))
}

fn sanitize_field(value: &str) -> String {
    ROW_BREAKING_RE.replace_all(value, " ").into_owned()
}
