//! dmr-merge: attach methylation sites to the DMR regions that contain them.
//!
//! Both inputs are tab-delimited files with a header line and
//! `chrom, start, end` leading columns, sorted by chromosome (numeric, then
//! `X`, `Y`), start and end. One forward sweep over both files writes every
//! region once, followed by the trailing columns of each site that fell
//! inside it.
//!
//! # Example
//!
//! ```rust,no_run
//! use dmr_merge::commands::MergeJoinCommand;
//!
//! let cmd = MergeJoinCommand::new();
//! let stats = cmd
//!     .run_to_path("dmrs.tsv", "sites.tsv", "merged.tsv", true)
//!     .unwrap();
//! eprintln!("{}", stats);
//! ```

pub mod chrom;
pub mod commands;
pub mod config;
pub mod error;
pub mod record;
pub mod streaming;

// Re-export commonly used types
pub use chrom::ChromKey;
pub use commands::{MergeJoinCommand, MergeJoinStats};
pub use config::RunConfig;
pub use error::{MergeError, Result};
pub use record::{MergedRecord, Record, Region, Site};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
