//! Follow-up suggestion parsing.
//!
//! Every response is asked to end with a line such as
//! `/// First question | Second question | Third question`. The final answer
//! is split at the *last* marker; while streaming, everything from the
//! *first* marker on is hidden so half-written suggestion text never shows.
//! A `///` inside legitimate content before the real marker therefore stays
//! in the answer, while one after it truncates the answer.

use regex::Regex;
use std::sync::LazyLock;

pub const SUGGESTION_MARKER: &str = "///";

/// Numbered (`1.` / `1、`) or bulleted (`-` / `•`) list separators
static LIST_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s+)(?:\d+[.、]\s*|[-•]\s+)").expect("valid separator regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResponse {
    pub content: String,
    pub suggestions: Vec<String>,
}

/// Split a finished response into its answer and follow-up suggestions.
///
/// Without a marker the text is returned untouched and there are no
/// suggestions.
pub fn parse_response(text: &str) -> ParsedResponse {
    let Some(idx) = text.rfind(SUGGESTION_MARKER) else {
        return ParsedResponse {
            content: text.to_string(),
            suggestions: Vec::new(),
        };
    };

    let tail = text[idx + SUGGESTION_MARKER.len()..].trim();
    ParsedResponse {
        content: text[..idx].trim().to_string(),
        suggestions: split_suggestions(tail),
    }
}

/// Part of a partially streamed response that may be shown right now
pub fn visible_prefix(text: &str) -> &str {
    match text.find(SUGGESTION_MARKER) {
        Some(idx) => &text[..idx],
        None => text,
    }
}

fn split_suggestions(tail: &str) -> Vec<String> {
    let candidates: Vec<&str> = if tail.contains('|') {
        tail.split('|').collect()
    } else {
        LIST_SEPARATOR.split(tail).collect()
    };

    candidates
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
