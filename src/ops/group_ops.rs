use crate::model::group::{DEFAULT_GROUP_ICON, Group};
use crate::ops::ordering::{reindexed, sorted};

/// Error type for group operations
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("group name is required")]
    EmptyName,
    #[error("group not found: {0}")]
    NotFound(String),
}

/// Fields changed by a group edit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupPatch {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<Option<String>>,
}

fn clean_name(name: &str) -> Result<String, GroupError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GroupError::EmptyName);
    }
    Ok(name.to_string())
}

fn clean_icon(icon: Option<&str>) -> String {
    match icon.map(str::trim) {
        Some(icon) if !icon.is_empty() => icon.to_string(),
        _ => DEFAULT_GROUP_ICON.to_string(),
    }
}

/// New group appended after the `existing` groups.
pub fn new_group(
    name: &str,
    icon: Option<&str>,
    id: String,
    existing: &[Group],
    now: i64,
) -> Result<Group, GroupError> {
    let mut group = Group::new(id, clean_name(name)?, existing.len() as i64, now);
    group.icon = clean_icon(icon);
    Ok(group)
}

/// Edited copy of `previous`. Order and creation time are untouched.
pub fn apply_group_patch(previous: &Group, patch: GroupPatch) -> Result<Group, GroupError> {
    let mut next = previous.clone();
    if let Some(name) = patch.name {
        next.name = clean_name(&name)?;
    }
    if let Some(icon) = patch.icon {
        next.icon = clean_icon(Some(&icon));
    }
    if let Some(color) = patch.color {
        next.color = color;
    }
    Ok(next)
}

/// Groups left after removing `group_id`, re-densified in display order.
pub fn reindex_after_removal(groups: &[Group], group_id: &str) -> Result<Vec<Group>, GroupError> {
    if !groups.iter().any(|g| g.id == group_id) {
        return Err(GroupError::NotFound(group_id.to_string()));
    }
    let remaining: Vec<Group> = sorted(groups)
        .into_iter()
        .filter(|g| g.id != group_id)
        .collect();
    Ok(reindexed(&remaining))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_group_appends_with_default_icon() {
        let existing = vec![Group::new("a", "A", 0, 0), Group::new("b", "B", 1, 0)];
        let g = new_group("  Work ", None, "c".into(), &existing, 7).unwrap();
        assert_eq!(g.name, "Work");
        assert_eq!(g.icon, DEFAULT_GROUP_ICON);
        assert_eq!(g.sort_order, 2);
        assert_eq!(g.created_at, 7);
    }

    #[test]
    fn new_group_requires_name() {
        assert!(matches!(
            new_group(" ", Some("🔑"), "x".into(), &[], 0),
            Err(GroupError::EmptyName)
        ));
    }

    #[test]
    fn patch_keeps_order() {
        let g = Group::new("a", "A", 4, 0);
        let next = apply_group_patch(
            &g,
            GroupPatch {
                name: Some("Alpha".into()),
                icon: Some("🔑".into()),
                color: Some(Some("#ff0000".into())),
            },
        )
        .unwrap();
        assert_eq!(next.name, "Alpha");
        assert_eq!(next.icon, "🔑");
        assert_eq!(next.color.as_deref(), Some("#ff0000"));
        assert_eq!(next.sort_order, 4);
    }

    #[test]
    fn removal_redensifies() {
        let groups = vec![
            Group::new("a", "A", 0, 0),
            Group::new("b", "B", 1, 0),
            Group::new("c", "C", 2, 0),
        ];
        let rest = reindex_after_removal(&groups, "a").unwrap();
        let view: Vec<(&str, i64)> = rest.iter().map(|g| (g.id.as_str(), g.sort_order)).collect();
        assert_eq!(view, vec![("b", 0), ("c", 1)]);
        assert!(matches!(
            reindex_after_removal(&groups, "zz"),
            Err(GroupError::NotFound(_))
        ));
    }
}
