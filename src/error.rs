//! Error types for the merge-join.

use std::io;
use thiserror::Error;

/// Errors that can occur while reading, merging or writing records.
///
/// Every variant is fatal for the run: the merge aborts on the first error
/// and leaves any partially written output in place.
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{stream} input has no header line")]
    MissingHeader { stream: String },

    #[error("Malformed record in {stream} at line {line}: {message}")]
    MalformedRecord {
        stream: String,
        line: usize,
        message: String,
    },

    #[error("Unrecognized chromosome '{label}' in {stream} at line {line}")]
    UnrecognizedChromosome {
        stream: String,
        line: usize,
        label: String,
    },

    #[error("{stream} input not sorted at line {line}: {message}")]
    UnorderedInput {
        stream: String,
        line: usize,
        message: String,
    },

    #[error("Failed to finalize output: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MergeError>;
