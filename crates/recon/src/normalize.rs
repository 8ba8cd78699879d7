//! Name normalization shared by the consolidator and duplicate detector.

/// Case-insensitive identity key for a brand name.
pub fn brand_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Normalize a model name for storage: trim, collapse internal
/// whitespace, preserve case for display. `None` when nothing is left.
pub fn normalize_model(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Display form of a brand name: trimmed, case preserved as first seen.
pub fn brand_display(raw: &str) -> String {
    raw.trim().to_string()
}
