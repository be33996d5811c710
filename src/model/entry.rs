use serde::{Deserialize, Serialize};

/// Maximum number of history records kept on an entry. Oldest are evicted first.
pub const HISTORY_LIMIT: usize = 10;

/// Previous values of the tracked fields, captured when an edit changed them.
///
/// A `None` field means that field did not change in the edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// The entry's `updated_at` before the edit (not the time of the edit)
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A managed credential record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Zero or more URLs
    #[serde(default)]
    pub url: Vec<String>,
    #[serde(default)]
    pub notes: String,
    /// Base32 TOTP secret; codes are computed by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totp_secret: Option<String>,
    /// Emoji or icon id shown next to the title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Tags in display order (membership ignores order)
    #[serde(default)]
    pub tags: Vec<String>,
    /// Weak reference to a group; `None` means ungrouped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// User-chosen position; entries without one sort last
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    /// Epoch milliseconds
    pub created_at: i64,
    /// Epoch milliseconds
    pub updated_at: i64,
    /// Most recent first, at most [`HISTORY_LIMIT`] records
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryRecord>,
}

impl Entry {
    /// Create a bare entry with no order, no group and empty history.
    pub fn new(id: impl Into<String>, title: impl Into<String>, now: i64) -> Self {
        Entry {
            id: id.into(),
            title: title.into(),
            username: String::new(),
            password: String::new(),
            url: Vec::new(),
            notes: String::new(),
            totp_secret: None,
            icon: None,
            tags: Vec::new(),
            group_id: None,
            sort_order: None,
            created_at: now,
            updated_at: now,
            history: Vec::new(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether the entry belongs to `group_id` (`None` = ungrouped).
    pub fn in_group(&self, group_id: Option<&str>) -> bool {
        self.group_id.as_deref() == group_id
    }
}
