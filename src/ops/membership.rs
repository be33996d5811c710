//! Group membership derived from the entry list.
//!
//! Everything here is recomputed from the entries on demand; nothing is cached.

use std::fmt;

use indexmap::IndexMap;

use crate::model::entry::Entry;
use crate::model::group::Group;

/// Key of the counts map. Entries without a group land under `Ungrouped`,
/// which can never collide with a real group id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    Ungrouped,
    Group(String),
}

impl GroupKey {
    pub fn of(entry: &Entry) -> Self {
        match &entry.group_id {
            Some(id) => GroupKey::Group(id.clone()),
            None => GroupKey::Ungrouped,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Ungrouped => write!(f, "(ungrouped)"),
            GroupKey::Group(id) => write!(f, "{}", id),
        }
    }
}

/// Count entries per group, keyed in order of first appearance.
pub fn counts_by_group(entries: &[Entry]) -> IndexMap<GroupKey, usize> {
    let mut counts = IndexMap::new();
    for entry in entries {
        *counts.entry(GroupKey::of(entry)).or_insert(0) += 1;
    }
    counts
}

/// Number of entries referencing `group_id`.
pub fn count_for(counts: &IndexMap<GroupKey, usize>, group_id: &str) -> usize {
    counts
        .get(&GroupKey::Group(group_id.to_string()))
        .copied()
        .unwrap_or(0)
}

/// All entries when `group_id` is `None`, else exactly the group's members.
pub fn filter_by_group(entries: &[Entry], group_id: Option<&str>) -> Vec<Entry> {
    match group_id {
        None => entries.to_vec(),
        Some(id) => entries
            .iter()
            .filter(|e| e.in_group(Some(id)))
            .cloned()
            .collect(),
    }
}

/// Resolve a requested group against the existing groups. Unknown ids resolve
/// to ungrouped.
pub fn resolve_group(groups: &[Group], group_id: Option<&str>) -> Option<String> {
    let id = group_id?;
    groups.iter().find(|g| g.id == id).map(|g| g.id.clone())
}

/// Read-only membership view over a borrowed entry list.
#[derive(Debug, Clone, Copy)]
pub struct GroupMembershipIndex<'a> {
    entries: &'a [Entry],
}

impl<'a> GroupMembershipIndex<'a> {
    pub fn new(entries: &'a [Entry]) -> Self {
        GroupMembershipIndex { entries }
    }

    pub fn counts(&self) -> IndexMap<GroupKey, usize> {
        counts_by_group(self.entries)
    }

    pub fn filter(&self, group_id: Option<&str>) -> Vec<Entry> {
        filter_by_group(self.entries, group_id)
    }

    /// The "all" container's count
    pub fn total(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(id: &str, group: Option<&str>) -> Entry {
        let mut e = Entry::new(id, id, 0);
        e.group_id = group.map(str::to_string);
        e
    }

    fn sample() -> Vec<Entry> {
        vec![
            entry("a", Some("g1")),
            entry("b", None),
            entry("c", Some("g2")),
            entry("d", Some("g1")),
        ]
    }

    #[test]
    fn counts_use_sentinel_for_ungrouped() {
        let counts = counts_by_group(&sample());
        assert_eq!(counts.get(&GroupKey::Group("g1".into())), Some(&2));
        assert_eq!(counts.get(&GroupKey::Group("g2".into())), Some(&1));
        assert_eq!(counts.get(&GroupKey::Ungrouped), Some(&1));
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn counts_keep_first_appearance_order() {
        let counts = counts_by_group(&sample());
        let keys: Vec<GroupKey> = counts.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                GroupKey::Group("g1".into()),
                GroupKey::Ungrouped,
                GroupKey::Group("g2".into()),
            ]
        );
    }

    #[test]
    fn count_for_missing_group_is_zero() {
        let counts = counts_by_group(&sample());
        assert_eq!(count_for(&counts, "g1"), 2);
        assert_eq!(count_for(&counts, "nope"), 0);
    }

    #[test]
    fn filter_all_returns_everything() {
        let entries = sample();
        assert_eq!(filter_by_group(&entries, None), entries);
    }

    #[test]
    fn filter_by_id_returns_exact_members() {
        let members = filter_by_group(&sample(), Some("g1"));
        let ids: Vec<&str> = members.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "d"]);
    }

    #[test]
    fn resolve_unknown_group_is_ungrouped() {
        let groups = vec![Group::new("g1", "Work", 0, 0)];
        assert_eq!(resolve_group(&groups, Some("g1")), Some("g1".to_string()));
        assert_eq!(resolve_group(&groups, Some("ghost")), None);
        assert_eq!(resolve_group(&groups, None), None);
    }

    #[test]
    fn index_view_matches_free_functions() {
        let entries = sample();
        let index = GroupMembershipIndex::new(&entries);
        assert_eq!(index.total(), 4);
        assert_eq!(index.counts(), counts_by_group(&entries));
        assert_eq!(index.filter(Some("g2")).len(), 1);
    }
}
