//! The stateful engine.
//!
//! A `Session` owns the local mirror of the backend's lists and every piece
//! of interaction state (search, group filter, batch selection, drag
//! gesture). All mutations go through [`Gateway::apply`]; views are derived
//! from the mirror on demand.

pub mod drag;
pub mod gateway;
pub mod reducer;
pub mod selection;
pub mod timer;

use std::collections::VecDeque;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::backend::{Backend, BackendError};
use crate::model::config::AppConfig;
use crate::model::entry::Entry;
use crate::model::group::Group;
use crate::ops::entry_ops::{EntryDraft, EntryError, EntryPatch, apply_patch, build_entry, new_id};
use crate::ops::group_ops::{GroupError, GroupPatch, apply_group_patch, new_group};
use crate::ops::membership::{GroupKey, GroupMembershipIndex, count_for, filter_by_group, resolve_group};
use crate::ops::ordering::{move_to_target, reindexed, sorted};
use crate::ops::search::{SearchQuery, all_tags};

use drag::{DragCoordinator, DragItem, DragOutcome, DropContext, DropTarget, HitRegion, Point, Release, resolve};
use gateway::{Commit, Gateway, GatewayError, Rollback};
use reducer::{Change, Snapshot};
use selection::{BatchProgress, BatchReport, BatchSelection, PartialBatchFailure};
use timer::{Clock, SystemClock};

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("group \"{name}\" still has {count} entries; move or delete them first")]
    GroupNotEmpty { id: String, name: String, count: usize },
    #[error("drag and drop is disabled while searching or in batch mode")]
    InteractionDisabled,
    #[error("entry not found: {0}")]
    EntryNotFound(String),
    #[error("group not found: {0}")]
    GroupNotFound(String),
    #[error(transparent)]
    Entry(#[from] EntryError),
    #[error(transparent)]
    Group(#[from] GroupError),
    #[error(transparent)]
    Persistence(#[from] GatewayError),
    #[error("batch incomplete: {0}")]
    PartialBatch(#[from] PartialBatchFailure),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Transient user-visible notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Notice {
            level,
            message: message.into(),
        }
    }
}

/// A user intent, as raised by the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Drop { item: DragItem, target: Option<DropTarget> },
    ReorderGroups { dragged: String, onto: String },
    ReorderEntries { dragged: String, onto: String },
    MoveEntryToGroup { entry_id: String, group_id: Option<String> },
    AddEntry(EntryDraft),
    EditEntry { id: String, patch: EntryPatch },
    DeleteEntry(String),
    BatchDelete(Vec<String>),
    ToggleSelect(String),
    AddGroup { name: String, icon: Option<String> },
    EditGroup { id: String, patch: GroupPatch },
    DeleteGroup(String),
}

pub struct Session<B> {
    gateway: Gateway<B>,
    mirror: Snapshot,
    query: SearchQuery,
    active_group: Option<String>,
    selection: BatchSelection,
    drag: DragCoordinator,
    clock: Box<dyn Clock>,
    notices: Vec<Notice>,
    queue: VecDeque<Intent>,
    stale: bool,
}

impl<B: Backend> Session<B> {
    /// Load the backend's lists and start an idle session.
    pub fn open(backend: B, config: &AppConfig) -> Result<Self, SessionError> {
        let mut gateway = Gateway::new(backend, config.sync.reload_after_commit);
        let mirror = gateway.load()?;
        Ok(Session {
            gateway,
            mirror,
            query: SearchQuery::default(),
            active_group: None,
            selection: BatchSelection::default(),
            drag: DragCoordinator::new(config.drag.clone()),
            clock: Box::new(SystemClock),
            notices: Vec::new(),
            queue: VecDeque::new(),
            stale: false,
        })
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the mirror with the backend's lists.
    pub fn reload(&mut self) -> Result<(), SessionError> {
        self.mirror = self.gateway.load()?;
        self.stale = false;
        self.reconcile();
        Ok(())
    }

    pub fn backend(&self) -> &B {
        self.gateway.backend()
    }

    pub fn backend_mut(&mut self) -> &mut B {
        self.gateway.backend_mut()
    }

    // -----------------------------------------------------------------------
    // Derived views
    // -----------------------------------------------------------------------

    pub fn sorted_entries(&self) -> Vec<Entry> {
        sorted(&self.mirror.entries)
    }

    pub fn sorted_groups(&self) -> Vec<Group> {
        sorted(&self.mirror.groups)
    }

    pub fn counts_by_group(&self) -> IndexMap<GroupKey, usize> {
        GroupMembershipIndex::new(&self.mirror.entries).counts()
    }

    pub fn entry(&self, id: &str) -> Option<&Entry> {
        self.mirror.entry(id)
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.mirror.group(id)
    }

    /// Sorted entries narrowed by the group filter, then by the search query.
    pub fn visible_entries(&self) -> Vec<Entry> {
        let in_group = filter_by_group(&self.sorted_entries(), self.active_group.as_deref());
        self.query.apply(&in_group)
    }

    pub fn all_tags(&self) -> Vec<String> {
        all_tags(&self.mirror.entries)
    }

    /// Entries can be dragged only in an unsearched view outside batch mode.
    pub fn drag_enabled(&self) -> bool {
        !self.query.has_text() && !self.selection.is_active()
    }

    pub fn dragging(&self) -> Option<&DragItem> {
        self.drag.dragged()
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn active_group(&self) -> Option<&str> {
        self.active_group.as_deref()
    }

    pub fn selection(&self) -> &BatchSelection {
        &self.selection
    }

    /// The last rollback could not reload; local state may differ from the
    /// backend until the next successful `reload`.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // -----------------------------------------------------------------------
    // View controls
    // -----------------------------------------------------------------------

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.query.text = text.into();
        self.reconcile();
    }

    pub fn set_tag(&mut self, tag: Option<String>) {
        self.query.tag = tag;
        self.reconcile();
    }

    /// Filter by group; `None` shows all entries.
    pub fn select_group(&mut self, group_id: Option<&str>) -> Result<(), SessionError> {
        if let Some(id) = group_id {
            if self.mirror.group(id).is_none() {
                return Err(SessionError::GroupNotFound(id.to_string()));
            }
        }
        self.active_group = group_id.map(str::to_string);
        self.reconcile();
        Ok(())
    }

    /// Restore the cross-cutting invariants after the mirror or a filter
    /// changed.
    fn reconcile(&mut self) {
        if let Some(id) = &self.active_group {
            if self.mirror.group(id).is_none() {
                info!(group = %id, "active group disappeared, showing all");
                self.active_group = None;
            }
        }
        let visible = self.visible_entries();
        self.selection.retain_visible(&visible);
        self.drag.set_inert(!self.drag_enabled());
    }

    fn commit(&mut self, change: Change) -> Result<Commit, SessionError> {
        let result = self.gateway.apply(&mut self.mirror, &change);
        if let Err(GatewayError::Persistence { rollback, .. }) = &result {
            if *rollback == Rollback::Restored {
                self.stale = true;
            }
        }
        self.reconcile();
        match result {
            Ok(commit) => Ok(commit),
            Err(e) => {
                self.notices.push(Notice::new(NoticeLevel::Error, e.to_string()));
                Err(e.into())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------------

    /// Handle one intent, then anything queued while it ran.
    pub fn dispatch(&mut self, intent: Intent) -> Result<(), SessionError> {
        let result = self.handle(intent);
        self.run_queued();
        result
    }

    /// Queue an intent to run after the current one.
    pub fn enqueue(&mut self, intent: Intent) {
        self.queue.push_back(intent);
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Run queued intents in order. Failures become notices.
    pub fn run_queued(&mut self) {
        while let Some(intent) = self.queue.pop_front() {
            if let Err(e) = self.handle(intent) {
                warn!(error = %e, "queued intent failed");
                if !matches!(e, SessionError::Persistence(_) | SessionError::PartialBatch(_)) {
                    self.notices.push(Notice::new(NoticeLevel::Error, e.to_string()));
                }
            }
        }
    }

    fn handle(&mut self, intent: Intent) -> Result<(), SessionError> {
        match intent {
            Intent::Drop { item, target } => self.drop(&item, target.as_ref()).map(|_| ()),
            Intent::ReorderGroups { dragged, onto } => self.reorder_groups(&dragged, &onto).map(|_| ()),
            Intent::ReorderEntries { dragged, onto } => self.reorder_entries(&dragged, &onto).map(|_| ()),
            Intent::MoveEntryToGroup { entry_id, group_id } => {
                self.move_entry_to_group(&entry_id, group_id.as_deref()).map(|_| ())
            }
            Intent::AddEntry(draft) => self.add_entry(draft).map(|_| ()),
            Intent::EditEntry { id, patch } => self.edit_entry(&id, patch).map(|_| ()),
            Intent::DeleteEntry(id) => self.delete_entry(&id).map(|_| ()),
            Intent::BatchDelete(ids) => {
                self.batch_delete(&ids, |_| None).into_result()?;
                Ok(())
            }
            Intent::ToggleSelect(id) => {
                self.toggle_select(&id);
                Ok(())
            }
            Intent::AddGroup { name, icon } => self.add_group(&name, icon.as_deref()).map(|_| ()),
            Intent::EditGroup { id, patch } => self.edit_group(&id, patch).map(|_| ()),
            Intent::DeleteGroup(id) => self.delete_group(&id).map(|_| ()),
        }
    }

    /// Apply a drop. Refused outright while drag is disabled, as are the
    /// reorder and move intents below.
    pub fn drop(&mut self, item: &DragItem, target: Option<&DropTarget>) -> Result<Commit, SessionError> {
        self.ensure_drag_enabled()?;
        let view = self.visible_entries();
        let ctx = DropContext {
            groups: &self.mirror.groups,
            entries: &self.mirror.entries,
            view: &view,
        };
        let outcome = resolve(item, target, &ctx, self.clock.now());
        self.apply_outcome(outcome)
    }

    fn apply_outcome(&mut self, outcome: DragOutcome) -> Result<Commit, SessionError> {
        let change = match outcome {
            DragOutcome::Cancelled => return Ok(Commit::Unchanged),
            DragOutcome::ReorderGroups(order) => Change::ReorderGroups(order),
            DragOutcome::ReorderEntries(order) => Change::ReorderEntries(order),
            DragOutcome::MoveEntry { entry_id, group_id } => Change::MoveEntry {
                entry_id,
                group_id,
                at: self.clock.now(),
            },
        };
        self.commit(change)
    }

    fn ensure_drag_enabled(&self) -> Result<(), SessionError> {
        if self.drag_enabled() {
            Ok(())
        } else {
            Err(SessionError::InteractionDisabled)
        }
    }

    /// Move group `dragged` to the position of group `onto`.
    pub fn reorder_groups(&mut self, dragged: &str, onto: &str) -> Result<Commit, SessionError> {
        self.ensure_drag_enabled()?;
        for id in [dragged, onto] {
            if self.mirror.group(id).is_none() {
                return Err(SessionError::GroupNotFound(id.to_string()));
            }
        }
        match move_to_target(&self.sorted_groups(), dragged, onto) {
            Some(order) => self.commit(Change::ReorderGroups(reindexed(&order))),
            None => Ok(Commit::Unchanged),
        }
    }

    /// Move entry `dragged` to the position of entry `onto` within the
    /// current view. The whole view is reindexed.
    pub fn reorder_entries(&mut self, dragged: &str, onto: &str) -> Result<Commit, SessionError> {
        self.ensure_drag_enabled()?;
        let view = self.visible_entries();
        for id in [dragged, onto] {
            if !view.iter().any(|e| e.id == id) {
                return Err(SessionError::EntryNotFound(id.to_string()));
            }
        }
        let ctx = DropContext {
            groups: &self.mirror.groups,
            entries: &self.mirror.entries,
            view: &view,
        };
        let outcome = resolve(
            &DragItem::Entry(dragged.to_string()),
            Some(&DropTarget::Entry(onto.to_string())),
            &ctx,
            self.clock.now(),
        );
        self.apply_outcome(outcome)
    }

    /// Put an entry in `group_id`, or ungroup it with `None`. Unknown groups
    /// resolve to ungrouped.
    pub fn move_entry_to_group(&mut self, entry_id: &str, group_id: Option<&str>) -> Result<Commit, SessionError> {
        self.ensure_drag_enabled()?;
        if self.mirror.entry(entry_id).is_none() {
            return Err(SessionError::EntryNotFound(entry_id.to_string()));
        }
        self.commit(Change::MoveEntry {
            entry_id: entry_id.to_string(),
            group_id: group_id.map(str::to_string),
            at: self.clock.now(),
        })
    }

    /// Create an entry and return its id.
    pub fn add_entry(&mut self, mut draft: EntryDraft) -> Result<String, SessionError> {
        draft.group_id = resolve_group(&self.mirror.groups, draft.group_id.as_deref());
        let entry = build_entry(draft, new_id(), self.clock.now())?;
        let id = entry.id.clone();
        self.commit(Change::AddEntry(entry))?;
        info!(entry = %id, "entry added");
        Ok(id)
    }

    pub fn edit_entry(&mut self, id: &str, patch: EntryPatch) -> Result<Commit, SessionError> {
        let previous = self
            .mirror
            .entry(id)
            .ok_or_else(|| SessionError::EntryNotFound(id.to_string()))?;
        let next = apply_patch(previous, patch, self.clock.now())?;
        self.commit(Change::UpdateEntry(next))
    }

    pub fn delete_entry(&mut self, id: &str) -> Result<Commit, SessionError> {
        if self.mirror.entry(id).is_none() {
            return Err(SessionError::EntryNotFound(id.to_string()));
        }
        self.commit(Change::DeleteEntry(id.to_string()))
    }

    /// Delete each id with its own backend call, continuing past failures.
    ///
    /// `progress` sees every item as it completes; any intent it returns is
    /// queued and runs after the batch.
    pub fn batch_delete<F>(&mut self, ids: &[String], mut progress: F) -> BatchReport
    where
        F: FnMut(&BatchProgress<'_>) -> Option<Intent>,
    {
        let mut report = BatchReport::default();
        for (index, id) in ids.iter().enumerate() {
            let result = if self.mirror.entry(id).is_some() {
                self.delete_mirrored(id)
            } else {
                self.delete_unmirrored(id)
            };
            let ok = match result {
                Ok(()) => {
                    report.succeeded += 1;
                    true
                }
                Err(message) => {
                    report.failed.push((id.clone(), message));
                    false
                }
            };
            let step = BatchProgress {
                done: index + 1,
                total: ids.len(),
                id,
                ok,
            };
            if let Some(intent) = progress(&step) {
                self.queue.push_back(intent);
            }
        }
        self.reconcile();

        if report.is_complete_success() {
            info!(deleted = report.succeeded, "batch delete complete");
            self.notices.push(Notice::new(
                NoticeLevel::Info,
                format!("deleted {} entries", report.succeeded),
            ));
        } else {
            warn!(succeeded = report.succeeded, failed = report.failed.len(), "batch delete partially failed");
            self.notices.push(Notice::new(
                NoticeLevel::Warning,
                format!(
                    "deleted {} of {} entries; {} failed",
                    report.succeeded,
                    report.total(),
                    report.failed.len()
                ),
            ));
        }
        report
    }

    fn delete_mirrored(&mut self, id: &str) -> Result<(), String> {
        match self.gateway.apply(&mut self.mirror, &Change::DeleteEntry(id.to_string())) {
            Ok(_) => Ok(()),
            Err(e) => {
                if let GatewayError::Persistence {
                    rollback: Rollback::Restored,
                    ..
                } = &e
                {
                    self.stale = true;
                }
                Err(e.to_string())
            }
        }
    }

    /// An id the mirror does not know still gets its delete call. Not-found
    /// from the backend is a failure here: nothing was deleted.
    fn delete_unmirrored(&mut self, id: &str) -> Result<(), String> {
        debug!(entry = %id, "deleting entry missing from mirror");
        match self.gateway.backend_mut().delete_entry(id) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Err(SessionError::EntryNotFound(id.to_string()).to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Batch-delete the current selection, then leave batch mode.
    pub fn delete_selected<F>(&mut self, progress: F) -> BatchReport
    where
        F: FnMut(&BatchProgress<'_>) -> Option<Intent>,
    {
        let ids = self.selection.selected_ids();
        let report = self.batch_delete(&ids, progress);
        self.exit_batch_mode();
        report
    }

    /// Create a group at the end of the list and return its id.
    pub fn add_group(&mut self, name: &str, icon: Option<&str>) -> Result<String, SessionError> {
        let group = new_group(name, icon, new_id(), &self.mirror.groups, self.clock.now())?;
        let id = group.id.clone();
        self.commit(Change::AddGroup(group))?;
        info!(group = %id, "group added");
        Ok(id)
    }

    pub fn edit_group(&mut self, id: &str, patch: GroupPatch) -> Result<Commit, SessionError> {
        let previous = self
            .mirror
            .group(id)
            .ok_or_else(|| SessionError::GroupNotFound(id.to_string()))?;
        let next = apply_group_patch(previous, patch)?;
        self.commit(Change::UpdateGroup(next))
    }

    /// Delete an empty group. A group that still has entries is refused
    /// before any backend call, reporting how many entries block it.
    pub fn delete_group(&mut self, id: &str) -> Result<Commit, SessionError> {
        let group = self
            .mirror
            .group(id)
            .ok_or_else(|| SessionError::GroupNotFound(id.to_string()))?;
        let count = count_for(&self.counts_by_group(), id);
        if count > 0 {
            let err = SessionError::GroupNotEmpty {
                id: id.to_string(),
                name: group.name.clone(),
                count,
            };
            warn!(group = %id, count, "refusing to delete non-empty group");
            self.notices.push(Notice::new(NoticeLevel::Warning, err.to_string()));
            return Err(err);
        }
        self.commit(Change::DeleteGroup(id.to_string()))
    }

    // -----------------------------------------------------------------------
    // Batch selection
    // -----------------------------------------------------------------------

    /// Flip one entry's selection. Entries outside the current view cannot
    /// be selected.
    pub fn toggle_select(&mut self, id: &str) {
        if !self.visible_entries().iter().any(|e| e.id == id) {
            debug!(entry = %id, "ignoring selection of hidden entry");
            return;
        }
        self.selection.toggle(id);
        self.drag.set_inert(!self.drag_enabled());
    }

    /// Select exactly the visible entries.
    pub fn select_all(&mut self) {
        let visible = self.visible_entries();
        self.selection.select_all(&visible);
    }

    pub fn deselect_all(&mut self) {
        self.selection.deselect_all();
    }

    pub fn toggle_batch_mode(&mut self) {
        self.selection.toggle_mode();
        self.drag.set_inert(!self.drag_enabled());
    }

    pub fn exit_batch_mode(&mut self) {
        self.selection.exit();
        self.drag.set_inert(!self.drag_enabled());
    }

    /// Escape key: abandon any gesture and leave batch mode.
    pub fn escape(&mut self) {
        self.drag.cancel();
        self.exit_batch_mode();
    }

    // -----------------------------------------------------------------------
    // Pointer events
    // -----------------------------------------------------------------------

    pub fn pointer_down(&mut self, item: DragItem, region: HitRegion, at: Point) {
        let now = self.clock.now();
        self.drag.pointer_down(item, region, at, now);
    }

    pub fn pointer_move(&mut self, at: Point) -> bool {
        self.drag.pointer_move(at)
    }

    pub fn hover(&mut self, target: Option<DropTarget>) {
        self.drag.hover(target);
    }

    /// Advance timers. A long press enters batch mode with the pressed entry
    /// selected and returns its id.
    pub fn tick(&mut self) -> Option<String> {
        let id = self.drag.tick(self.clock.now())?;
        self.selection.enter_with(&id);
        self.drag.set_inert(true);
        Some(id)
    }

    /// Release the pointer, applying a drop if a drag was in progress.
    pub fn pointer_up(&mut self) -> Result<Commit, SessionError> {
        match self.drag.pointer_up() {
            Release::Drop { item, target } => self.drop(&item, target.as_ref()),
            Release::Click(_) | Release::Nothing => Ok(Commit::Unchanged),
        }
    }
}
