//! Ordering and grouping engine for a credential manager.
//!
//! Entries and groups live in an external backend; this crate keeps a local
//! mirror of them consistent under drag-and-drop reordering, cross-group
//! moves, filtered views and batch deletion.

pub mod backend;
pub mod cli;
pub mod io;
pub mod model;
pub mod ops;
pub mod session;
