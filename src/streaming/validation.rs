//! Sort validation for the merge-join inputs.
//!
//! The sweep assumes both streams are non-decreasing under
//! (chromosome key, start, end). It never checks this on its own; these
//! utilities are opt-in. Unlike a plain "chromosomes are contiguous" check,
//! the chromosome order here is the numeric one defined by [`ChromKey`], so
//! `chr10` before `chr2` is an error.

use crate::chrom::ChromKey;
use crate::error::{MergeError, Result};
use crate::record::Record;
use crate::streaming::reader::TsvReader;
use std::path::Path;

/// Inline order validator for use within streaming loops.
///
/// Validates that each record sorts at or after the previous one.
#[derive(Debug)]
pub struct OrderValidator {
    stream: String,
    prev: Option<(ChromKey, u64, u64)>,
}

impl OrderValidator {
    /// Create a validator; `stream` names the input in error messages.
    pub fn new(stream: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            prev: None,
        }
    }

    /// Validate that `record` (read from `line`) keeps the stream sorted.
    #[inline]
    pub fn validate(&mut self, record: &Record, line: usize) -> Result<()> {
        let current = (record.key(), record.start(), record.end());

        if let Some(prev) = self.prev {
            if current < prev {
                let message = if current.0 < prev.0 {
                    format!(
                        "chromosome {} comes after chromosome {}",
                        current.0, prev.0
                    )
                } else {
                    format!(
                        "interval {}-{} comes after {}-{} on chromosome {}",
                        current.1, current.2, prev.1, prev.2, current.0
                    )
                };
                return Err(MergeError::UnorderedInput {
                    stream: self.stream.clone(),
                    line,
                    message,
                });
            }
        }

        self.prev = Some(current);
        Ok(())
    }
}

/// Verify that a file is sorted by (chromosome key, start, end).
///
/// The first non-blank line is treated as a header. Returns the number of
/// data records on success.
///
/// # Example
///
/// ```rust,no_run
/// use dmr_merge::streaming::verify_sorted;
///
/// let records = verify_sorted("regions.tsv", "regions").expect("regions must be sorted");
/// println!("{} records in order", records);
/// ```
pub fn verify_sorted<P: AsRef<Path>>(path: P, stream: &str) -> Result<usize> {
    let mut reader = TsvReader::from_path(path, stream)?.with_order_validation();
    reader.read_header()?;
    let mut count = 0;
    while reader.next_record()?.is_some() {
        count += 1;
    }
    Ok(count)
}
