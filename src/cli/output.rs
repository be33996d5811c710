use serde::Serialize;

use crate::model::entry::{Entry, HistoryRecord};
use crate::model::group::Group;
use crate::session::selection::BatchReport;

const MASK: &str = "••••••••";

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

/// Entry as listed; never carries secrets
#[derive(Serialize)]
pub struct EntryJson {
    pub id: String,
    pub title: String,
    pub username: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub url: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    pub has_totp: bool,
    pub updated_at: i64,
}

#[derive(Serialize)]
pub struct EntryDetailJson {
    #[serde(flatten)]
    pub entry: EntryJson,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryJson>,
}

/// History record; previous passwords are masked unless revealed
#[derive(Serialize)]
pub struct HistoryJson {
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct GroupJson {
    pub id: String,
    pub name: String,
    pub icon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub sort_order: i64,
    pub entries: usize,
}

#[derive(Serialize)]
pub struct GroupListJson {
    pub groups: Vec<GroupJson>,
    pub ungrouped: usize,
    pub total: usize,
}

#[derive(Serialize)]
pub struct BatchJson {
    pub succeeded: usize,
    pub failed: Vec<FailureJson>,
}

#[derive(Serialize)]
pub struct FailureJson {
    pub id: String,
    pub error: String,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn entry_to_json(entry: &Entry) -> EntryJson {
    EntryJson {
        id: entry.id.clone(),
        title: entry.title.clone(),
        username: entry.username.clone(),
        url: entry.url.clone(),
        tags: entry.tags.clone(),
        group_id: entry.group_id.clone(),
        sort_order: entry.sort_order,
        has_totp: entry.totp_secret.is_some(),
        updated_at: entry.updated_at,
    }
}

fn history_to_json(record: &HistoryRecord, reveal: bool) -> HistoryJson {
    HistoryJson {
        timestamp: record.timestamp,
        password: record
            .password
            .as_ref()
            .map(|p| if reveal { p.clone() } else { MASK.to_string() }),
        username: record.username.clone(),
        notes: record.notes.clone(),
    }
}

pub fn entry_detail_to_json(entry: &Entry, reveal: bool) -> EntryDetailJson {
    EntryDetailJson {
        entry: entry_to_json(entry),
        password: reveal.then(|| entry.password.clone()),
        notes: entry.notes.clone(),
        created_at: entry.created_at,
        history: entry.history.iter().map(|r| history_to_json(r, reveal)).collect(),
    }
}

pub fn group_to_json(group: &Group, entries: usize) -> GroupJson {
    GroupJson {
        id: group.id.clone(),
        name: group.name.clone(),
        icon: group.icon.clone(),
        color: group.color.clone(),
        sort_order: group.sort_order,
        entries,
    }
}

pub fn batch_to_json(report: &BatchReport) -> BatchJson {
    BatchJson {
        succeeded: report.succeeded,
        failed: report
            .failed
            .iter()
            .map(|(id, error)| FailureJson {
                id: id.clone(),
                error: error.clone(),
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn format_tags(tags: &[String]) -> String {
    tags.iter().map(|t| format!("#{}", t)).collect::<Vec<_>>().join(" ")
}

fn format_time(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ms.to_string())
}

/// One-line entry summary
pub fn format_entry_line(entry: &Entry, groups: &[Group]) -> String {
    let icon = entry.icon.as_deref().map(|i| format!("{} ", i)).unwrap_or_default();
    let user = if entry.username.is_empty() {
        String::new()
    } else {
        format!(" <{}>", entry.username)
    };
    let group = entry
        .group_id
        .as_deref()
        .and_then(|id| groups.iter().find(|g| g.id == id))
        .map(|g| format!(" [{} {}]", g.icon, g.name))
        .unwrap_or_default();
    let tags = if entry.tags.is_empty() {
        String::new()
    } else {
        format!(" {}", format_tags(&entry.tags))
    };
    format!("{}  {}{}{}{}{}", entry.id, icon, entry.title, user, group, tags)
}

/// Detailed entry view. The password is masked unless `reveal`.
pub fn format_entry_detail(entry: &Entry, groups: &[Group], reveal: bool) -> Vec<String> {
    let mut lines = vec![format_entry_line(entry, groups)];
    if !entry.username.is_empty() {
        lines.push(format!("username: {}", entry.username));
    }
    if !entry.password.is_empty() {
        let shown = if reveal { entry.password.as_str() } else { MASK };
        lines.push(format!("password: {}", shown));
    }
    for url in &entry.url {
        lines.push(format!("url: {}", url));
    }
    if entry.totp_secret.is_some() {
        lines.push("totp: configured".to_string());
    }
    if !entry.notes.is_empty() {
        lines.push("notes:".to_string());
        for line in entry.notes.lines() {
            lines.push(format!("  {}", line));
        }
    }
    lines.push(format!("created: {}", format_time(entry.created_at)));
    lines.push(format!("updated: {}", format_time(entry.updated_at)));

    if !entry.history.is_empty() {
        lines.push(String::new());
        lines.push("history:".to_string());
        for record in &entry.history {
            let mut changed = Vec::new();
            if let Some(p) = &record.password {
                changed.push(format!("password={}", if reveal { p.as_str() } else { MASK }));
            }
            if let Some(u) = &record.username {
                changed.push(format!("username={}", u));
            }
            if record.notes.is_some() {
                changed.push("notes".to_string());
            }
            lines.push(format!("  {}  {}", format_time(record.timestamp), changed.join(", ")));
        }
    }
    lines
}

/// Group line with its entry count
pub fn format_group_line(group: &Group, entries: usize) -> String {
    format!("{}  {} {} ({})", group.id, group.icon, group.name, entries)
}

pub fn format_batch_report(report: &BatchReport) -> Vec<String> {
    let mut lines = vec![format!(
        "deleted {} of {}",
        report.succeeded,
        report.total()
    )];
    for (id, error) in &report.failed {
        lines.push(format!("  failed {}: {}", id, error));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret_entry() -> Entry {
        let mut e = Entry::new("e1", "Bank", 0);
        e.username = "alice".into();
        e.password = "hunter2".into();
        e.totp_secret = Some("JBSWY3DP".into());
        e.tags = vec!["money".into()];
        e.history = vec![HistoryRecord {
            timestamp: 0,
            password: Some("old-secret".into()),
            username: None,
            notes: None,
        }];
        e
    }

    #[test]
    fn list_json_has_no_secrets() {
        let json = serde_json::to_string(&entry_to_json(&secret_entry())).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!json.contains("JBSWY3DP"));
        assert!(json.contains("\"has_totp\":true"));
    }

    #[test]
    fn detail_masks_unless_revealed() {
        let e = secret_entry();
        let masked = format_entry_detail(&e, &[], false).join("\n");
        assert!(!masked.contains("hunter2"));
        assert!(!masked.contains("old-secret"));
        let shown = format_entry_detail(&e, &[], true).join("\n");
        assert!(shown.contains("password: hunter2"));

        let json = serde_json::to_string(&entry_detail_to_json(&e, false)).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!json.contains("old-secret"));
    }

    #[test]
    fn entry_line_shows_group_and_tags() {
        let mut e = secret_entry();
        e.group_id = Some("g".into());
        let groups = vec![Group::new("g", "Work", 0, 0)];
        assert_eq!(format_entry_line(&e, &groups), "e1  Bank <alice> [📁 Work] #money");
    }
}
