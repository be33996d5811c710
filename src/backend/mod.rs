//! Persistence boundary.
//!
//! A backend stores whole entries and groups. `add_*` and `update_*` are
//! upserts keyed by id; there is no batch call, so multi-item changes are
//! persisted one record at a time.

pub mod file;
pub mod memory;

use std::path::PathBuf;

use crate::model::entry::Entry;
use crate::model::group::Group;

pub use file::FileBackend;
pub use memory::MemoryBackend;

/// Error type for backend calls
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("entry not found: {0}")]
    EntryNotFound(String),
    #[error("group not found: {0}")]
    GroupNotFound(String),
    #[error("group {id} has entries ({count})")]
    GroupHasMembers { id: String, count: usize },
    #[error("backend rejected the request: {0}")]
    Rejected(String),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse store: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

impl BackendError {
    /// The target record was already absent.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BackendError::EntryNotFound(_) | BackendError::GroupNotFound(_)
        )
    }
}

/// Operations the vault store exposes.
pub trait Backend {
    fn get_all_entries(&mut self) -> Result<Vec<Entry>, BackendError>;
    fn get_all_groups(&mut self) -> Result<Vec<Group>, BackendError>;
    fn add_entry(&mut self, entry: &Entry) -> Result<(), BackendError>;
    fn update_entry(&mut self, entry: &Entry) -> Result<(), BackendError>;
    fn delete_entry(&mut self, id: &str) -> Result<(), BackendError>;
    fn add_group(&mut self, group: &Group) -> Result<(), BackendError>;
    fn update_group(&mut self, group: &Group) -> Result<(), BackendError>;
    /// Fails with [`BackendError::GroupHasMembers`] while entries reference it.
    fn delete_group(&mut self, id: &str) -> Result<(), BackendError>;
}

/// Shared record store used by both backends. Upserts replace in place so
/// the stored order is stable.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl StoreSnapshot {
    pub fn upsert_entry(&mut self, entry: &Entry) {
        match self.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(slot) => *slot = entry.clone(),
            None => self.entries.push(entry.clone()),
        }
    }

    pub fn remove_entry(&mut self, id: &str) -> Result<(), BackendError> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        if self.entries.len() == before {
            return Err(BackendError::EntryNotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn upsert_group(&mut self, group: &Group) {
        match self.groups.iter_mut().find(|g| g.id == group.id) {
            Some(slot) => *slot = group.clone(),
            None => self.groups.push(group.clone()),
        }
    }

    pub fn remove_group(&mut self, id: &str) -> Result<(), BackendError> {
        if !self.groups.iter().any(|g| g.id == id) {
            return Err(BackendError::GroupNotFound(id.to_string()));
        }
        let count = self
            .entries
            .iter()
            .filter(|e| e.group_id.as_deref() == Some(id))
            .count();
        if count > 0 {
            return Err(BackendError::GroupHasMembers {
                id: id.to_string(),
                count,
            });
        }
        self.groups.retain(|g| g.id != id);
        Ok(())
    }
}
