use crate::backend::{Backend, BackendError, StoreSnapshot};
use crate::model::entry::Entry;
use crate::model::group::Group;

/// Backend operation kinds, as recorded in the call log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    GetAllEntries,
    GetAllGroups,
    AddEntry,
    UpdateEntry,
    DeleteEntry,
    AddGroup,
    UpdateGroup,
    DeleteGroup,
}

/// In-process backend. Records every call and can be told to fail specific
/// ones, which makes it the harness for persistence and rollback behavior.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    store: StoreSnapshot,
    calls: Vec<(Call, Option<String>)>,
    failures: Vec<(Call, Option<String>)>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(entries: Vec<Entry>, groups: Vec<Group>) -> Self {
        MemoryBackend {
            store: StoreSnapshot { entries, groups },
            ..Default::default()
        }
    }

    /// Stored records, bypassing the call log
    pub fn store(&self) -> &StoreSnapshot {
        &self.store
    }

    pub fn calls(&self) -> &[(Call, Option<String>)] {
        &self.calls
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls.iter().filter(|(c, _)| *c == call).count()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Make `call` fail. With an id, only calls targeting that id fail.
    pub fn fail_on(&mut self, call: Call, id: Option<&str>) {
        self.failures.push((call, id.map(str::to_string)));
    }

    pub fn clear_failures(&mut self) {
        self.failures.clear();
    }

    fn record(&mut self, call: Call, id: Option<&str>) -> Result<(), BackendError> {
        self.calls.push((call, id.map(str::to_string)));
        let injected = self.failures.iter().any(|(c, target)| {
            *c == call && (target.is_none() || target.as_deref() == id)
        });
        if injected {
            return Err(BackendError::Rejected(format!(
                "{:?} {}",
                call,
                id.unwrap_or("")
            )));
        }
        Ok(())
    }
}

impl Backend for MemoryBackend {
    fn get_all_entries(&mut self) -> Result<Vec<Entry>, BackendError> {
        self.record(Call::GetAllEntries, None)?;
        Ok(self.store.entries.clone())
    }

    fn get_all_groups(&mut self) -> Result<Vec<Group>, BackendError> {
        self.record(Call::GetAllGroups, None)?;
        Ok(self.store.groups.clone())
    }

    fn add_entry(&mut self, entry: &Entry) -> Result<(), BackendError> {
        self.record(Call::AddEntry, Some(&entry.id))?;
        self.store.upsert_entry(entry);
        Ok(())
    }

    fn update_entry(&mut self, entry: &Entry) -> Result<(), BackendError> {
        self.record(Call::UpdateEntry, Some(&entry.id))?;
        self.store.upsert_entry(entry);
        Ok(())
    }

    fn delete_entry(&mut self, id: &str) -> Result<(), BackendError> {
        self.record(Call::DeleteEntry, Some(id))?;
        self.store.remove_entry(id)
    }

    fn add_group(&mut self, group: &Group) -> Result<(), BackendError> {
        self.record(Call::AddGroup, Some(&group.id))?;
        self.store.upsert_group(group);
        Ok(())
    }

    fn update_group(&mut self, group: &Group) -> Result<(), BackendError> {
        self.record(Call::UpdateGroup, Some(&group.id))?;
        self.store.upsert_group(group);
        Ok(())
    }

    fn delete_group(&mut self, id: &str) -> Result<(), BackendError> {
        self.record(Call::DeleteGroup, Some(id))?;
        self.store.remove_group(id)
    }
}
