//! Pure state transitions.
//!
//! `reduce` maps the current mirror and a requested change to the next
//! mirror plus the backend calls that make it durable. It never talks to the
//! backend itself; the gateway runs the effects.

use std::fmt;

use crate::model::entry::Entry;
use crate::model::group::Group;
use crate::ops::group_ops::reindex_after_removal;
use crate::ops::membership::resolve_group;

/// Local mirror of the backend's entry and group lists
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub entries: Vec<Entry>,
    pub groups: Vec<Group>,
}

impl Snapshot {
    pub fn new(entries: Vec<Entry>, groups: Vec<Group>) -> Self {
        Snapshot { entries, groups }
    }

    pub fn entry(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }
}

/// A requested state change
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Full group list in its new order, already reindexed
    ReorderGroups(Vec<Group>),
    /// The reordered view's entries, already reindexed and restamped
    ReorderEntries(Vec<Entry>),
    MoveEntry {
        entry_id: String,
        group_id: Option<String>,
        at: i64,
    },
    AddEntry(Entry),
    UpdateEntry(Entry),
    DeleteEntry(String),
    AddGroup(Group),
    UpdateGroup(Group),
    DeleteGroup(String),
}

/// One backend call
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    AddEntry(Entry),
    UpdateEntry(Entry),
    DeleteEntry(String),
    AddGroup(Group),
    UpdateGroup(Group),
    DeleteGroup(String),
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::AddEntry(e) => write!(f, "add_entry {}", e.id),
            Effect::UpdateEntry(e) => write!(f, "update_entry {}", e.id),
            Effect::DeleteEntry(id) => write!(f, "delete_entry {}", id),
            Effect::AddGroup(g) => write!(f, "add_group {}", g.id),
            Effect::UpdateGroup(g) => write!(f, "update_group {}", g.id),
            Effect::DeleteGroup(id) => write!(f, "delete_group {}", id),
        }
    }
}

fn replace_entries(entries: &mut [Entry], updated: &[Entry]) {
    for entry in entries.iter_mut() {
        if let Some(next) = updated.iter().find(|u| u.id == entry.id) {
            *entry = next.clone();
        }
    }
}

/// Next state and the effects to persist it. An empty effect list means the
/// change is a no-op and the state is returned unchanged.
pub fn reduce(state: &Snapshot, change: &Change) -> (Snapshot, Vec<Effect>) {
    let mut next = state.clone();
    let mut effects = Vec::new();

    match change {
        Change::ReorderGroups(order) => {
            for group in order {
                let changed = state
                    .group(&group.id)
                    .is_none_or(|current| current.sort_order != group.sort_order);
                if changed {
                    effects.push(Effect::UpdateGroup(group.clone()));
                }
            }
            if !effects.is_empty() {
                next.groups = order.clone();
            }
        }
        Change::ReorderEntries(order) => {
            let known: Vec<Entry> = order
                .iter()
                .filter(|e| state.entry(&e.id).is_some())
                .cloned()
                .collect();
            replace_entries(&mut next.entries, &known);
            effects.extend(known.into_iter().map(Effect::UpdateEntry));
        }
        Change::MoveEntry {
            entry_id,
            group_id,
            at,
        } => {
            let target = resolve_group(&state.groups, group_id.as_deref());
            if let Some(entry) = next.entries.iter_mut().find(|e| &e.id == entry_id) {
                if entry.group_id != target {
                    entry.group_id = target;
                    entry.updated_at = *at;
                    effects.push(Effect::UpdateEntry(entry.clone()));
                }
            }
        }
        Change::AddEntry(entry) => {
            next.entries.push(entry.clone());
            effects.push(Effect::AddEntry(entry.clone()));
        }
        Change::UpdateEntry(entry) => {
            if let Some(slot) = next.entries.iter_mut().find(|e| e.id == entry.id) {
                if slot != entry {
                    *slot = entry.clone();
                    effects.push(Effect::UpdateEntry(entry.clone()));
                }
            }
        }
        Change::DeleteEntry(id) => {
            if state.entry(id).is_some() {
                next.entries.retain(|e| &e.id != id);
                effects.push(Effect::DeleteEntry(id.clone()));
            }
        }
        Change::AddGroup(group) => {
            next.groups.push(group.clone());
            effects.push(Effect::AddGroup(group.clone()));
        }
        Change::UpdateGroup(group) => {
            if let Some(slot) = next.groups.iter_mut().find(|g| g.id == group.id) {
                if slot != group {
                    *slot = group.clone();
                    effects.push(Effect::UpdateGroup(group.clone()));
                }
            }
        }
        Change::DeleteGroup(id) => {
            if let Ok(remaining) = reindex_after_removal(&state.groups, id) {
                effects.push(Effect::DeleteGroup(id.clone()));
                for group in &remaining {
                    let moved = state
                        .group(&group.id)
                        .is_none_or(|g| g.sort_order != group.sort_order);
                    if moved {
                        effects.push(Effect::UpdateGroup(group.clone()));
                    }
                }
                next.groups = remaining;
            }
        }
    }

    if effects.is_empty() {
        return (state.clone(), effects);
    }
    (next, effects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::ordering::reindexed;
    use pretty_assertions::assert_eq;

    fn groups() -> Vec<Group> {
        vec![
            Group::new("a", "A", 0, 0),
            Group::new("b", "B", 1, 0),
            Group::new("c", "C", 2, 0),
        ]
    }

    fn state() -> Snapshot {
        let mut e1 = Entry::new("e1", "One", 0);
        e1.group_id = Some("a".into());
        let e2 = Entry::new("e2", "Two", 0);
        Snapshot::new(vec![e1, e2], groups())
    }

    #[test]
    fn group_reorder_emits_only_changed_groups() {
        let order = reindexed(&[
            Group::new("b", "B", 1, 0),
            Group::new("a", "A", 0, 0),
            Group::new("c", "C", 2, 0),
        ]);
        let (next, effects) = reduce(&state(), &Change::ReorderGroups(order.clone()));
        assert_eq!(next.groups, order);
        let labels: Vec<String> = effects.iter().map(|e| e.to_string()).collect();
        assert_eq!(labels, vec!["update_group b", "update_group a"]);
    }

    #[test]
    fn move_to_current_group_is_noop() {
        let change = Change::MoveEntry {
            entry_id: "e1".into(),
            group_id: Some("a".into()),
            at: 9,
        };
        let (next, effects) = reduce(&state(), &change);
        assert!(effects.is_empty());
        assert_eq!(next, state());
    }

    #[test]
    fn move_to_unknown_group_means_ungrouped() {
        let change = Change::MoveEntry {
            entry_id: "e1".into(),
            group_id: Some("ghost".into()),
            at: 9,
        };
        let (next, effects) = reduce(&state(), &change);
        assert_eq!(effects.len(), 1);
        let moved = next.entry("e1").unwrap();
        assert_eq!(moved.group_id, None);
        assert_eq!(moved.updated_at, 9);
        assert_eq!(moved.sort_order, None);
    }

    #[test]
    fn group_delete_redensifies_the_rest() {
        let (next, effects) = reduce(&state(), &Change::DeleteGroup("a".into()));
        let orders: Vec<(&str, i64)> = next.groups.iter().map(|g| (g.id.as_str(), g.sort_order)).collect();
        assert_eq!(orders, vec![("b", 0), ("c", 1)]);
        let labels: Vec<String> = effects.iter().map(|e| e.to_string()).collect();
        assert_eq!(labels, vec!["delete_group a", "update_group b", "update_group c"]);
    }

    #[test]
    fn deleting_missing_entry_is_noop() {
        let (_, effects) = reduce(&state(), &Change::DeleteEntry("nope".into()));
        assert!(effects.is_empty());
    }

    #[test]
    fn unchanged_update_is_noop() {
        let same = state().entries[0].clone();
        let (_, effects) = reduce(&state(), &Change::UpdateEntry(same));
        assert!(effects.is_empty());
    }
}
