use std::collections::BTreeSet;

use crate::model::entry::Entry;

/// Free-text query plus optional tag predicate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub tag: Option<String>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        SearchQuery {
            text: text.into(),
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// A free-text term is present. Drag and drop is disabled while it is.
    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.tag.is_none()
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        matches(entry, &self.text.to_lowercase(), self.tag.as_deref())
    }

    pub fn apply(&self, entries: &[Entry]) -> Vec<Entry> {
        filter(entries, &self.text, self.tag.as_deref())
    }
}

/// Match predicate. `needle` must already be lowercase.
fn matches(entry: &Entry, needle: &str, tag: Option<&str>) -> bool {
    let text_ok = needle.is_empty()
        || entry.title.to_lowercase().contains(needle)
        || entry.username.to_lowercase().contains(needle)
        || entry.url.iter().any(|u| u.to_lowercase().contains(needle))
        || entry.notes.to_lowercase().contains(needle);
    let tag_ok = tag.is_none_or(|t| entry.has_tag(t));
    text_ok && tag_ok
}

/// Entries matching `query` (case-insensitive substring over title, username,
/// urls and notes) and carrying `tag` when one is given. Input order is kept.
pub fn filter(entries: &[Entry], query: &str, tag: Option<&str>) -> Vec<Entry> {
    let needle = query.to_lowercase();
    entries
        .iter()
        .filter(|e| matches(e, &needle, tag))
        .cloned()
        .collect()
}

/// Every distinct non-empty tag, sorted.
pub fn all_tags(entries: &[Entry]) -> Vec<String> {
    entries
        .iter()
        .flat_map(|e| e.tags.iter())
        .filter(|t| !t.is_empty())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
