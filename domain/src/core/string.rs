//! String utilities for the domain layer.

/// Shorten text for log lines, cutting on a char boundary.
///
/// Newlines are folded to spaces so a preview always fits one line.
pub fn preview(s: &str, max_chars: usize) -> String {
    let flat: String = s
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let kept: String = flat.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}
