//! Sprint marker handling in the whiteboard field.
//!
//! The sprint marker is the bracketed token `[bzkanban-sprint]`. A bug whose
//! whiteboard carries it is pulled from the backlog into the todo column.

/// The bracketed sprint token
pub const SPRINT_TAG: &str = "[bzkanban-sprint]";

/// Whether the whiteboard carries the sprint token.
///
/// The token includes its closing bracket, so longer bracketed tokens such
/// as `[bzkanban-sprint-old]` do not match.
pub fn has_sprint_tag(whiteboard: &str) -> bool {
    whiteboard.contains(SPRINT_TAG)
}

/// Append the sprint token to the whiteboard.
///
/// If the token is already present, this is a no-op. Otherwise the existing
/// text is trimmed and joined to the token with a single space.
pub fn add_sprint_tag(whiteboard: &str) -> String {
    if has_sprint_tag(whiteboard) {
        return whiteboard.to_string();
    }

    let trimmed = whiteboard.trim();
    if trimmed.is_empty() {
        SPRINT_TAG.to_string()
    } else {
        format!("{} {}", trimmed, SPRINT_TAG)
    }
}

/// Remove every occurrence of the sprint token.
///
/// Remaining whitespace runs collapse to single spaces and the ends are trimmed.
pub fn remove_sprint_tag(whiteboard: &str) -> String {
    whiteboard
        .replace(SPRINT_TAG, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
