//! Pointer gesture state machine and drop resolution.
//!
//! A gesture is `Idle` until a pointer-down lands on the body of a draggable
//! item (`Armed`). It becomes `Dragging` only once the pointer has travelled
//! the item kind's activation distance; releasing before that is a click.
//! While armed on an entry, a long-press timer runs and is cancelled by the
//! same movement that would start a drag.

use crate::model::config::DragConfig;
use crate::model::entry::Entry;
use crate::model::group::Group;
use crate::ops::membership::resolve_group;
use crate::ops::ordering::{move_to_target, reindexed, sorted};
use crate::session::timer::Timer;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// What is being dragged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragItem {
    Group(String),
    Entry(String),
}

/// What the pointer is over when released
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    Group(String),
    /// The "all" container; dropping an entry here ungroups it
    AllContainer,
    Entry(String),
}

/// Part of an item the pointer went down on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitRegion {
    Body,
    /// A nested button, link or input; never starts a gesture
    Control,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GesturePhase {
    Idle,
    Armed { item: DragItem, origin: Point },
    Dragging { item: DragItem, over: Option<DropTarget> },
}

/// Result of releasing the pointer
#[derive(Debug, Clone, PartialEq)]
pub enum Release {
    Nothing,
    Click(DragItem),
    Drop { item: DragItem, target: Option<DropTarget> },
}

/// Resolved effect of a drop
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    ReorderGroups(Vec<Group>),
    ReorderEntries(Vec<Entry>),
    MoveEntry {
        entry_id: String,
        group_id: Option<String>,
    },
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct DragCoordinator {
    phase: GesturePhase,
    config: DragConfig,
    inert: bool,
    long_press: Timer,
}

impl DragCoordinator {
    pub fn new(config: DragConfig) -> Self {
        DragCoordinator {
            phase: GesturePhase::Idle,
            config,
            inert: false,
            long_press: Timer::default(),
        }
    }

    pub fn phase(&self) -> &GesturePhase {
        &self.phase
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, GesturePhase::Dragging { .. })
    }

    /// The item currently being dragged, for the drag-in-progress indicator
    pub fn dragged(&self) -> Option<&DragItem> {
        match &self.phase {
            GesturePhase::Dragging { item, .. } => Some(item),
            _ => None,
        }
    }

    /// Disable or re-enable gestures. Disabling abandons any gesture in flight.
    pub fn set_inert(&mut self, inert: bool) {
        if inert {
            self.cancel();
        }
        self.inert = inert;
    }

    fn threshold(&self, item: &DragItem) -> f64 {
        match item {
            DragItem::Group(_) => self.config.group_activation_distance,
            DragItem::Entry(_) => self.config.entry_activation_distance,
        }
    }

    pub fn pointer_down(&mut self, item: DragItem, region: HitRegion, at: Point, now: i64) {
        if self.inert || region == HitRegion::Control {
            return;
        }
        self.long_press.cancel();
        if matches!(item, DragItem::Entry(_)) {
            self.long_press.arm(now, self.config.long_press_ms);
        }
        self.phase = GesturePhase::Armed { item, origin: at };
    }

    /// Track pointer movement. Returns true when this move started a drag.
    pub fn pointer_move(&mut self, at: Point) -> bool {
        let GesturePhase::Armed { item, origin } = &self.phase else {
            return false;
        };
        if origin.distance(&at) < self.threshold(item) {
            return false;
        }
        let item = item.clone();
        self.long_press.cancel();
        self.phase = GesturePhase::Dragging { item, over: None };
        true
    }

    /// Record the drop target under the pointer; `None` when it left every
    /// valid target.
    pub fn hover(&mut self, target: Option<DropTarget>) {
        if let GesturePhase::Dragging { over, .. } = &mut self.phase {
            *over = target;
        }
    }

    /// Advance the long-press timer. Returns the entry id when it fires,
    /// which ends the gesture without a drag.
    pub fn tick(&mut self, now: i64) -> Option<String> {
        if !self.long_press.poll(now) {
            return None;
        }
        match std::mem::replace(&mut self.phase, GesturePhase::Idle) {
            GesturePhase::Armed {
                item: DragItem::Entry(id),
                ..
            } => Some(id),
            other => {
                self.phase = other;
                None
            }
        }
    }

    pub fn pointer_up(&mut self) -> Release {
        self.long_press.cancel();
        match std::mem::replace(&mut self.phase, GesturePhase::Idle) {
            GesturePhase::Idle => Release::Nothing,
            GesturePhase::Armed { item, .. } => Release::Click(item),
            GesturePhase::Dragging { item, over } => Release::Drop { item, target: over },
        }
    }

    pub fn cancel(&mut self) {
        self.long_press.cancel();
        self.phase = GesturePhase::Idle;
    }
}

/// Lists a drop is resolved against
#[derive(Debug, Clone, Copy)]
pub struct DropContext<'a> {
    /// All groups
    pub groups: &'a [Group],
    /// All entries
    pub entries: &'a [Entry],
    /// The currently filtered and sorted entry view
    pub view: &'a [Entry],
}

/// Classify a drop and compute its result.
pub fn resolve(item: &DragItem, target: Option<&DropTarget>, ctx: &DropContext<'_>, now: i64) -> DragOutcome {
    let Some(target) = target else {
        return DragOutcome::Cancelled;
    };
    match (item, target) {
        (DragItem::Group(dragged), DropTarget::Group(over)) => {
            match move_to_target(&sorted(ctx.groups), dragged, over) {
                Some(order) => DragOutcome::ReorderGroups(reindexed(&order)),
                None => DragOutcome::Cancelled,
            }
        }
        (DragItem::Entry(entry_id), DropTarget::Group(_) | DropTarget::AllContainer) => {
            let Some(entry) = ctx.entries.iter().find(|e| &e.id == entry_id) else {
                return DragOutcome::Cancelled;
            };
            let requested = match target {
                DropTarget::Group(id) => Some(id.as_str()),
                _ => None,
            };
            let group_id = resolve_group(ctx.groups, requested);
            if entry.group_id == group_id {
                return DragOutcome::Cancelled;
            }
            DragOutcome::MoveEntry {
                entry_id: entry_id.clone(),
                group_id,
            }
        }
        (DragItem::Entry(dragged), DropTarget::Entry(over)) => match move_to_target(ctx.view, dragged, over) {
            Some(order) => {
                let mut order = reindexed(&order);
                for entry in &mut order {
                    entry.updated_at = now;
                }
                DragOutcome::ReorderEntries(order)
            }
            None => DragOutcome::Cancelled,
        },
        _ => DragOutcome::Cancelled,
    }
}
