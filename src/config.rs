//! Run configuration for a merge-join.
//!
//! The only inputs are the two file locations and the output destination;
//! nothing is read from the environment.

use crate::commands::merge_join::ensure_not_input;
use crate::commands::{MergeJoinCommand, MergeJoinStats};
use crate::error::{MergeError, Result};
use std::io;
use std::path::PathBuf;

/// Validated settings for one merge-join run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Sorted region (DMR) file
    pub regions: PathBuf,
    /// Sorted site file
    pub sites: PathBuf,
    /// Output file; stdout when `None`
    pub output: Option<PathBuf>,
    /// Verify sort order while reading
    pub validate_order: bool,
    /// Write to a temporary file and rename on success
    pub atomic: bool,
}

impl RunConfig {
    pub fn new(regions: impl Into<PathBuf>, sites: impl Into<PathBuf>) -> Self {
        Self {
            regions: regions.into(),
            sites: sites.into(),
            output: None,
            validate_order: false,
            atomic: false,
        }
    }

    /// Check the settings before the merge starts.
    ///
    /// Inputs are not checked here: they may be pipes or process
    /// substitutions, and opening them reports a missing file as
    /// `MergeError::Io`. Atomic output needs an output path, and the output
    /// may not resolve to either input.
    pub fn validate(&self) -> Result<()> {
        match &self.output {
            None if self.atomic => Err(MergeError::Config(
                "--atomic requires an output file".to_string(),
            )),
            Some(out) => ensure_not_input(out, &[self.regions.as_path(), self.sites.as_path()]),
            None => Ok(()),
        }
    }

    /// The command these settings describe.
    pub fn command(&self) -> MergeJoinCommand {
        MergeJoinCommand {
            validate_order: self.validate_order,
        }
    }

    /// Validate, then run the merge to the configured destination.
    pub fn execute(&self) -> Result<MergeJoinStats> {
        self.validate()?;
        let cmd = self.command();
        match &self.output {
            Some(path) => cmd.run_to_path(&self.regions, &self.sites, path, self.atomic),
            None => {
                let stdout = io::stdout();
                let handle = stdout.lock();
                cmd.run(&self.regions, &self.sites, handle)
            }
        }
    }
}
