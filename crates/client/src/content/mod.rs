//! Content normalization for decision detail markup.
//!
//! - [`clean`]: strip boilerplate elements and collapse whitespace
//! - [`truncate`]: sentence-aware preview cut
//! - [`highlight_keywords`]: bold query words in a preview
//! - [`metadata`]: case/ruling number and date recovery from decision text

pub mod metadata;

pub use metadata::{DecisionMetadata, extract_metadata};

use regex::RegexBuilder;
use scraper::{Html, Selector};

/// Elements removed before text extraction.
const STRIPPED: &str = "script, style, iframe, nav, header, footer, .ad, .advertisement";

/// Convert raw markup into plain text.
///
/// Scripts, styles, frames, navigation chrome and ad containers are dropped,
/// the text of `<body>` (or the whole document if it has none) is taken, and
/// every whitespace run collapses into one space. Never fails: empty or
/// malformed markup yields an empty string or whatever text survives parsing.
pub fn clean(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let mut doc = Html::parse_document(raw);
    let stripped = Selector::parse(STRIPPED).expect("invalid selector");
    let ids: Vec<_> = doc.select(&stripped).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }

    let body = Selector::parse("body").expect("invalid selector");
    let text = match doc.select(&body).next() {
        Some(body) => body.text().collect::<String>(),
        None => doc.root_element().text().collect::<String>(),
    };

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max_len` characters plus an ellipsis.
///
/// When a sentence terminator lies beyond 80% of `max_len` inside the cut,
/// the cut backs off to just after it. Text within the limit is returned
/// unchanged.
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }

    let cut: Vec<char> = text.chars().take(max_len).collect();
    let end = cut
        .iter()
        .rposition(|c| matches!(c, '.' | '!' | '?'))
        .filter(|&pos| pos * 10 > max_len * 8)
        .map_or(cut.len(), |pos| pos + 1);

    let mut out: String = cut[..end].iter().collect();
    out.push_str("...");
    out
}

/// Wrap every case-insensitive occurrence of the query's words in `**`.
///
/// Words of two characters or fewer are ignored.
pub fn highlight_keywords(text: &str, query: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut highlighted = text.to_string();
    for word in query.split_whitespace().filter(|w| w.chars().count() > 2) {
        let Ok(re) = RegexBuilder::new(&format!("({})", regex::escape(word)))
            .case_insensitive(true)
            .build()
        else {
            continue;
        };
        highlighted = re.replace_all(&highlighted, "**$1**").into_owned();
    }
    highlighted
}
