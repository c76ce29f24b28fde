//! Streaming utilities for the merge-join.
//!
//! This module provides the pieces the sweep is built from:
//! - Forward-only record reading with blank-line skipping
//! - Optional sort validation
//! - Buffered tab-delimited output
//!
//! Memory use is O(s) where s = the most sites attached to a single region.

pub mod buffers;
pub mod output;
pub mod reader;
pub mod validation;

pub use output::TsvWriter;
pub use reader::TsvReader;
pub use validation::{verify_sorted, OrderValidator};
