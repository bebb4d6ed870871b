use std::sync::LazyLock;

use regex::Regex;

use crate::reference::ReferenceData;

static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Clean raw free text: trim, lowercase, collapse internal whitespace.
fn clean(raw: &str) -> String {
    RE_WHITESPACE
        .replace_all(raw.trim().to_lowercase().as_str(), " ")
        .into_owned()
}

/// Normalize a free-text symptom name to its canonical key:
/// clean -> synonym map -> spaces to underscores.
/// Returns None when nothing remains after cleaning.
pub fn canonical_key(raw: &str, reference: &ReferenceData) -> Option<String> {
    let cleaned = clean(raw);
    if cleaned.is_empty() {
        return None;
    }
    let canonical = match reference.resolve_synonym(&cleaned) {
        Some(canonical) => canonical.to_string(),
        None => cleaned,
    };
    Some(canonical.replace(' ', "_"))
}

/// Human-readable name retained for display: trimmed original text.
pub fn display_name(raw: &str) -> String {
    RE_WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}
