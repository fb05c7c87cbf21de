use std::fmt::Write as _;

use unicode_segmentation::UnicodeSegmentation as _;

use crate::notification::{Category, Notification};

/// Display width budget for toast bodies.
pub const TOAST_WIDTH: usize = 80;

pub fn marker(kind: Category) -> &'static str {
    match kind {
        Category::Success => "✓",
        Category::Error => "✗",
        Category::Info => "•",
    }
}

/// Renders the feed as plain text, newest first, unread flagged with `*`.
pub fn render(records: &[Notification]) -> String {
    if records.is_empty() {
        return "no notifications\n".to_string();
    }

    let mut out = String::new();
    for record in records {
        let flag = if record.read { ' ' } else { '*' };
        let when = record
            .timestamp()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        writeln!(
            out,
            "{flag} {} #{:<6} {when:<16} {}",
            marker(record.kind),
            record.id,
            record.title
        )
        .unwrap();
        if !record.body.is_empty() {
            writeln!(out, "      {}", ellipsize(&record.body, TOAST_WIDTH)).unwrap();
        }
    }
    out
}

/// Truncates to `max` grapheme clusters, appending an ellipsis when
/// anything was cut.
pub fn ellipsize(s: &str, max: usize) -> String {
    let mut clusters = s.grapheme_indices(true);
    match clusters.nth(max) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
