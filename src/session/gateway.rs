use std::fmt;

use tracing::{debug, info, warn};

use crate::backend::{Backend, BackendError};
use crate::ops::ordering::sorted;
use crate::session::reducer::{Change, Effect, Snapshot, reduce};

/// How local state was reconciled after a failed persistence sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollback {
    /// Replaced with the backend's authoritative lists
    Reloaded,
    /// The reload failed too; the pre-change state was restored
    Restored,
}

impl fmt::Display for Rollback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rollback::Reloaded => write!(f, "reloaded from backend"),
            Rollback::Restored => write!(f, "restored previous state"),
        }
    }
}

/// Error type for gateway operations
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{effect} failed after {completed} call(s), {rollback}: {source}")]
    Persistence {
        effect: String,
        completed: usize,
        rollback: Rollback,
        source: BackendError,
    },
    #[error("could not load vault: {0}")]
    Load(#[source] BackendError),
}

/// Outcome of a successful `apply`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// Nothing to do; no backend call was made
    Unchanged,
    Applied { calls: usize },
}

/// Applies changes optimistically and persists them one call at a time.
///
/// On any failure the mirror is reconciled with the backend, so it is never
/// left holding a partially-applied local-only state.
#[derive(Debug)]
pub struct Gateway<B> {
    backend: B,
    reload_after_commit: bool,
}

impl<B: Backend> Gateway<B> {
    pub fn new(backend: B, reload_after_commit: bool) -> Self {
        Gateway {
            backend,
            reload_after_commit,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Fetch the authoritative lists, sorted.
    pub fn load(&mut self) -> Result<Snapshot, BackendError> {
        let entries = self.backend.get_all_entries()?;
        let groups = self.backend.get_all_groups()?;
        debug!(entries = entries.len(), groups = groups.len(), "loaded vault");
        Ok(Snapshot::new(sorted(&entries), sorted(&groups)))
    }

    /// Apply `change` to `mirror`, then persist it.
    pub fn apply(&mut self, mirror: &mut Snapshot, change: &Change) -> Result<Commit, GatewayError> {
        let (next, effects) = reduce(mirror, change);
        if effects.is_empty() {
            debug!("change is a no-op");
            return Ok(Commit::Unchanged);
        }

        let previous = std::mem::replace(mirror, next);
        for (completed, effect) in effects.iter().enumerate() {
            if let Err(source) = self.run(effect) {
                warn!(%effect, completed, error = %source, "persistence failed, rolling back");
                let rollback = match self.load() {
                    Ok(fresh) => {
                        *mirror = fresh;
                        Rollback::Reloaded
                    }
                    Err(e) => {
                        warn!(error = %e, "reload after failure failed, restoring previous state");
                        *mirror = previous;
                        Rollback::Restored
                    }
                };
                return Err(GatewayError::Persistence {
                    effect: effect.to_string(),
                    completed,
                    rollback,
                    source,
                });
            }
        }

        info!(calls = effects.len(), "change persisted");
        if self.reload_after_commit {
            match self.load() {
                Ok(fresh) => *mirror = fresh,
                Err(e) => warn!(error = %e, "reload after commit failed, keeping local state"),
            }
        }
        Ok(Commit::Applied {
            calls: effects.len(),
        })
    }

    /// Run a single backend call. A delete whose target is already gone
    /// counts as success.
    pub fn run(&mut self, effect: &Effect) -> Result<(), BackendError> {
        let result = match effect {
            Effect::AddEntry(e) => self.backend.add_entry(e),
            Effect::UpdateEntry(e) => self.backend.update_entry(e),
            Effect::DeleteEntry(id) => self.backend.delete_entry(id),
            Effect::AddGroup(g) => self.backend.add_group(g),
            Effect::UpdateGroup(g) => self.backend.update_group(g),
            Effect::DeleteGroup(id) => self.backend.delete_group(id),
        };
        match result {
            Err(e) if e.is_not_found() && matches!(effect, Effect::DeleteEntry(_) | Effect::DeleteGroup(_)) => {
                debug!(%effect, "target already absent");
                Ok(())
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{Call, MemoryBackend};
    use crate::model::entry::Entry;
    use crate::model::group::Group;
    use crate::ops::ordering::reindexed;
    use pretty_assertions::assert_eq;

    fn groups() -> Vec<Group> {
        vec![
            Group::new("a", "A", 0, 0),
            Group::new("b", "B", 1, 0),
            Group::new("c", "C", 2, 0),
        ]
    }

    fn gateway(reload: bool) -> (Gateway<MemoryBackend>, Snapshot) {
        let mut gw = Gateway::new(MemoryBackend::with_data(vec![], groups()), reload);
        let mirror = gw.load().unwrap();
        gw.backend_mut().clear_calls();
        (gw, mirror)
    }

    fn swap_ab() -> Change {
        let g = groups();
        Change::ReorderGroups(reindexed(&[g[1].clone(), g[0].clone(), g[2].clone()]))
    }

    #[test]
    fn success_persists_and_reloads() {
        let (mut gw, mut mirror) = gateway(true);
        let commit = gw.apply(&mut mirror, &swap_ab()).unwrap();
        assert_eq!(commit, Commit::Applied { calls: 2 });
        assert_eq!(gw.backend().count(Call::UpdateGroup), 2);
        assert_eq!(gw.backend().count(Call::GetAllGroups), 1);
        let ids: Vec<&str> = mirror.groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn noop_makes_no_calls() {
        let (mut gw, mut mirror) = gateway(true);
        let same = Change::ReorderGroups(groups());
        assert_eq!(gw.apply(&mut mirror, &same).unwrap(), Commit::Unchanged);
        assert!(gw.backend().calls().is_empty());
    }

    #[test]
    fn failure_reloads_authoritative_state() {
        let (mut gw, mut mirror) = gateway(false);
        gw.backend_mut().fail_on(Call::UpdateGroup, Some("a"));
        let err = gw.apply(&mut mirror, &swap_ab()).unwrap_err();
        match err {
            GatewayError::Persistence {
                completed, rollback, ..
            } => {
                assert_eq!(completed, 1);
                assert_eq!(rollback, Rollback::Reloaded);
            }
            other => panic!("unexpected error: {other}"),
        }
        // "b" was written before the failure; the mirror shows exactly that.
        let backend_groups = sorted(&gw.backend().store().groups);
        assert_eq!(mirror.groups, backend_groups);
    }

    #[test]
    fn failed_reload_restores_previous() {
        let (mut gw, mut mirror) = gateway(false);
        let before = mirror.clone();
        gw.backend_mut().fail_on(Call::UpdateGroup, None);
        gw.backend_mut().fail_on(Call::GetAllEntries, None);
        let err = gw.apply(&mut mirror, &swap_ab()).unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Persistence {
                rollback: Rollback::Restored,
                completed: 0,
                ..
            }
        ));
        assert_eq!(mirror, before);
    }

    #[test]
    fn deleting_absent_entry_counts_as_success() {
        let mut gw = Gateway::new(MemoryBackend::new(), false);
        assert!(gw.run(&Effect::DeleteEntry("gone".into())).is_ok());
        assert!(gw.run(&Effect::UpdateEntry(Entry::new("x", "X", 0))).is_ok());
    }
}
