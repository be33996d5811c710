use indexmap::IndexSet;

use crate::model::entry::Entry;

/// Multi-select state over the current view.
///
/// Changing the selection never changes the active filter. Leaving batch
/// mode always empties the selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSelection {
    active: bool,
    selected: IndexSet<String>,
}

impl BatchSelection {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn enter(&mut self) {
        self.active = true;
    }

    /// Enter batch mode with `id` selected (long press).
    pub fn enter_with(&mut self, id: &str) {
        self.active = true;
        self.selected.clear();
        self.selected.insert(id.to_string());
    }

    pub fn exit(&mut self) {
        self.active = false;
        self.selected.clear();
    }

    /// Flip batch mode. The selection is cleared either way.
    pub fn toggle_mode(&mut self) {
        self.active = !self.active;
        self.selected.clear();
    }

    /// Flip one id's membership, entering batch mode if needed.
    pub fn toggle(&mut self, id: &str) {
        self.active = true;
        if !self.selected.shift_remove(id) {
            self.selected.insert(id.to_string());
        }
    }

    /// Select exactly the ids of `view`.
    pub fn select_all(&mut self, view: &[Entry]) {
        self.selected = view.iter().map(|e| e.id.clone()).collect();
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    /// Drop ids that are no longer in `view`.
    pub fn retain_visible(&mut self, view: &[Entry]) {
        self.selected.retain(|id| view.iter().any(|e| &e.id == id));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected ids in selection order
    pub fn selected_ids(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }
}

/// Some deletes in a batch failed
#[derive(Debug, thiserror::Error)]
#[error("{succeeded} succeeded, {} failed", .failed.len())]
pub struct PartialBatchFailure {
    pub succeeded: usize,
    pub failed: Vec<(String, String)>,
}

/// Aggregate outcome of a batch operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub succeeded: usize,
    /// (id, error message) per failed item
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn into_result(self) -> Result<usize, PartialBatchFailure> {
        if self.failed.is_empty() {
            Ok(self.succeeded)
        } else {
            Err(PartialBatchFailure {
                succeeded: self.succeeded,
                failed: self.failed,
            })
        }
    }
}

/// Progress of a running batch, reported after each item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress<'a> {
    pub done: usize,
    pub total: usize,
    pub id: &'a str,
    pub ok: bool,
}
