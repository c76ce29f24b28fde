//! Buffer size constants for streaming operations.

/// Default output buffer size (2 MB).
pub const DEFAULT_OUTPUT_BUFFER: usize = 2 * 1024 * 1024;

/// Default input buffer size (256 KB).
/// Good balance for reading sorted region and site files.
pub const DEFAULT_INPUT_BUFFER: usize = 256 * 1024;

/// Default line buffer capacity (1 KB).
/// Site lines with many tissue columns grow past this on their own.
pub const DEFAULT_LINE_BUFFER: usize = 1024;
