//! Command implementations for dmr-merge.

pub mod merge_join;

pub use crate::streaming::verify_sorted;
pub use merge_join::{MergeJoinCommand, MergeJoinStats};
