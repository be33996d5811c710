use uuid::Uuid;

use crate::model::entry::Entry;
use crate::ops::history::record_edit;

/// Error type for entry operations
#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    #[error("entry title is required")]
    EmptyTitle,
    #[error("entry not found: {0}")]
    NotFound(String),
}

/// User-supplied fields for a new entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryDraft {
    pub title: String,
    pub username: String,
    pub password: String,
    pub url: Vec<String>,
    pub notes: String,
    pub totp_secret: Option<String>,
    pub icon: Option<String>,
    pub tags: Vec<String>,
    pub group_id: Option<String>,
}

/// Fields changed by an edit. `None` leaves the field as it was.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub title: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub url: Option<Vec<String>>,
    pub notes: Option<String>,
    /// `Some(None)` clears the secret
    pub totp_secret: Option<Option<String>>,
    pub icon: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        *self == EntryPatch::default()
    }
}

/// Fresh random entry id
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Trim tags, drop empty ones and remove duplicates, keeping first occurrence.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

fn normalize_urls(urls: &[String]) -> Vec<String> {
    urls.iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build a new entry from a draft. It starts without a `sort_order` (so it
/// sorts after every ordered entry) and with empty history.
pub fn build_entry(draft: EntryDraft, id: String, now: i64) -> Result<Entry, EntryError> {
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(EntryError::EmptyTitle);
    }
    let mut entry = Entry::new(id, title, now);
    entry.username = draft.username;
    entry.password = draft.password;
    entry.url = normalize_urls(&draft.url);
    entry.notes = draft.notes;
    entry.totp_secret = draft.totp_secret.filter(|s| !s.trim().is_empty());
    entry.icon = draft.icon;
    entry.tags = normalize_tags(&draft.tags);
    entry.group_id = draft.group_id;
    Ok(entry)
}

/// Apply an edit to `previous`.
///
/// Identity, `created_at`, `sort_order` and `group_id` carry over; group
/// changes go through a move, not an edit. History gains a record when a
/// tracked field changed.
pub fn apply_patch(previous: &Entry, patch: EntryPatch, now: i64) -> Result<Entry, EntryError> {
    let mut next = previous.clone();
    if let Some(title) = patch.title {
        let title = title.trim();
        if title.is_empty() {
            return Err(EntryError::EmptyTitle);
        }
        next.title = title.to_string();
    }
    if let Some(username) = patch.username {
        next.username = username;
    }
    if let Some(password) = patch.password {
        next.password = password;
    }
    if let Some(url) = patch.url {
        next.url = normalize_urls(&url);
    }
    if let Some(notes) = patch.notes {
        next.notes = notes;
    }
    if let Some(secret) = patch.totp_secret {
        next.totp_secret = secret.filter(|s| !s.trim().is_empty());
    }
    if let Some(icon) = patch.icon {
        next.icon = icon;
    }
    if let Some(tags) = patch.tags {
        next.tags = normalize_tags(&tags);
    }
    next.updated_at = now;
    next.history = record_edit(previous, &next);
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn draft(title: &str) -> EntryDraft {
        EntryDraft {
            title: title.into(),
            ..Default::default()
        }
    }

    #[test]
    fn build_requires_title() {
        assert!(matches!(
            build_entry(draft("   "), "x".into(), 0),
            Err(EntryError::EmptyTitle)
        ));
    }

    #[test]
    fn build_starts_unordered_without_history() {
        let mut d = draft("  Bank ");
        d.tags = vec![" money".into(), "".into(), "money".into(), "work".into()];
        d.url = vec!["https://bank.example".into(), "  ".into()];
        d.group_id = Some("g1".into());
        let e = build_entry(d, "e1".into(), 42).unwrap();
        assert_eq!(e.title, "Bank");
        assert_eq!(e.tags, vec!["money", "work"]);
        assert_eq!(e.url, vec!["https://bank.example"]);
        assert_eq!(e.sort_order, None);
        assert_eq!(e.created_at, 42);
        assert_eq!(e.updated_at, 42);
        assert_eq!(e.group_id.as_deref(), Some("g1"));
        assert!(e.history.is_empty());
    }

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(new_id(), new_id());
    }

    #[test]
    fn patch_preserves_identity_order_and_group() {
        let mut prev = Entry::new("e1", "Bank", 10);
        prev.sort_order = Some(3);
        prev.group_id = Some("g1".into());
        prev.notes = "a".into();
        prev.updated_at = 20;

        let patch = EntryPatch {
            title: Some("Bank 2".into()),
            notes: Some("b".into()),
            ..Default::default()
        };
        let next = apply_patch(&prev, patch, 30).unwrap();
        assert_eq!(next.id, "e1");
        assert_eq!(next.created_at, 10);
        assert_eq!(next.sort_order, Some(3));
        assert_eq!(next.group_id.as_deref(), Some("g1"));
        assert_eq!(next.updated_at, 30);
        assert_eq!(next.history.len(), 1);
        assert_eq!(next.history[0].timestamp, 20);
        assert_eq!(next.history[0].notes.as_deref(), Some("a"));
    }

    #[test]
    fn patch_rejects_blank_title() {
        let prev = Entry::new("e1", "Bank", 0);
        let patch = EntryPatch {
            title: Some(" ".into()),
            ..Default::default()
        };
        assert!(matches!(apply_patch(&prev, patch, 1), Err(EntryError::EmptyTitle)));
    }

    #[test]
    fn title_only_patch_adds_no_history() {
        let prev = Entry::new("e1", "Bank", 0);
        let patch = EntryPatch {
            title: Some("Other".into()),
            ..Default::default()
        };
        let next = apply_patch(&prev, patch, 1).unwrap();
        assert!(next.history.is_empty());
        assert!(EntryPatch::default().is_empty());
    }
}
