use serde::{Deserialize, Serialize};

/// Icon given to groups created without one
pub const DEFAULT_GROUP_ICON: &str = "📁";

/// A named container that entries may optionally belong to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Dense `0..N-1` across the full group list
    #[serde(default)]
    pub sort_order: i64,
    /// Epoch milliseconds
    pub created_at: i64,
}

impl Group {
    pub fn new(id: impl Into<String>, name: impl Into<String>, sort_order: i64, now: i64) -> Self {
        Group {
            id: id.into(),
            name: name.into(),
            icon: default_icon(),
            color: None,
            sort_order,
            created_at: now,
        }
    }
}

fn default_icon() -> String {
    DEFAULT_GROUP_ICON.to_string()
}
