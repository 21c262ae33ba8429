//! Error rendering for stderr.
//!
//! The first line is always `ERROR: <message>`. When stderr is a terminal
//! the error code and fix suggestions follow.

use crate::error::{FixSuggestion, TrackDayError};

/// Render an error for stderr.
#[must_use]
pub fn render_error(error: &TrackDayError, detailed: bool) -> String {
    let mut lines = vec![format!("ERROR: {error}")];
    if !detailed {
        return lines.join("\n");
    }

    lines.push(format!(
        "  [{}] {}",
        error.error_code(),
        error.category().description()
    ));

    let suggestions = error.fix_suggestions();
    if !suggestions.is_empty() {
        lines.push(String::new());
        lines.push(render_suggestions(&suggestions));
    }

    if let Some(context) = suggestions
        .first()
        .map(|s| s.context.as_str())
        .filter(|c| !c.is_empty())
    {
        lines.push(String::new());
        lines.push("Why this happened:".to_string());
        lines.extend(wrap_text(context, 72).into_iter().map(|l| format!("  {l}")));
    }

    if let Some(prevention) = suggestions.first().and_then(|s| s.prevention.as_deref()) {
        lines.push(String::new());
        lines.push("Prevention:".to_string());
        lines.extend(wrap_text(prevention, 72).into_iter().map(|l| format!("  {l}")));
    }

    lines.join("\n")
}

fn render_suggestions(suggestions: &[FixSuggestion]) -> String {
    let mut lines = vec!["How to fix:".to_string()];
    for (i, suggestion) in suggestions.iter().enumerate() {
        for (j, cmd) in suggestion.commands.iter().enumerate() {
            if j == 0 {
                lines.push(format!("  {}. {cmd}", i + 1));
            } else {
                lines.push(format!("     Or: {cmd}"));
            }
        }
    }
    lines.join("\n")
}

/// Greedy word wrap.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
