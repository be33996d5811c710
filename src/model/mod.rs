pub mod config;
pub mod entry;
pub mod group;

pub use config::*;
pub use entry::*;
pub use group::*;
