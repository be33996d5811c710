pub mod entry_ops;
pub mod group_ops;
pub mod history;
pub mod membership;
pub mod ordering;
pub mod search;
