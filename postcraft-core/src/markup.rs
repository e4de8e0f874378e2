//! Inline emphasis markup for text content.
//!
//! `**...**` marks an accent span, painted with the highlight color and the
//! accent font. An unmatched trailing `**` is kept as literal text.

use serde::{Deserialize, Serialize};

const DELIMITER: &str = "**";

/// A run of text, either plain or accented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Text of the run, delimiters removed.
    pub text: String,
    /// Whether the run is an accent span.
    pub accent: bool,
}

impl Span {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            accent: false,
        }
    }
}

/// Split content into plain and accent spans. Empty runs are dropped.
#[must_use]
pub fn parse(content: &str) -> Vec<Span> {
    let parts: Vec<&str> = content.split(DELIMITER).collect();
    // An even number of parts means the last delimiter has no partner.
    let unmatched_tail = parts.len() % 2 == 0;

    let mut spans: Vec<Span> = Vec::new();
    for (index, part) in parts.iter().enumerate() {
        let is_tail = unmatched_tail && index == parts.len() - 1;
        let accent = index % 2 == 1 && !is_tail;
        let text = if is_tail {
            format!("{DELIMITER}{part}")
        } else {
            (*part).to_string()
        };
        if text.is_empty() {
            continue;
        }
        match spans.last_mut() {
            Some(last) if last.accent == accent => last.text.push_str(&text),
            _ => spans.push(Span { text, accent }),
        }
    }
    if spans.is_empty() && !content.is_empty() {
        spans.push(Span::plain(content));
    }
    spans
}

/// Content with markup removed.
#[must_use]
pub fn strip(content: &str) -> String {
    parse(content).into_iter().map(|s| s.text).collect()
}

/// Whether content contains at least one accent span.
#[must_use]
pub fn has_accent(content: &str) -> bool {
    parse(content).iter().any(|s| s.accent)
}
