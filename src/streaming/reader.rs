//! Forward-only reader for tab-delimited region and site files.
//!
//! The reader owns blank-line skipping and end-of-stream detection, so the
//! merge loop only ever sees `Ok(Some(record))` or `Ok(None)`.

use crate::error::{MergeError, Result};
use crate::record::{split_fields, Record};
use crate::streaming::buffers::{DEFAULT_INPUT_BUFFER, DEFAULT_LINE_BUFFER};
use crate::streaming::validation::OrderValidator;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::Path;

/// A streaming reader over one tab-delimited input.
pub struct TsvReader<R: Read> {
    reader: BufReader<R>,
    stream: String,
    line_number: usize,
    buffer: String,
    validator: Option<OrderValidator>,
}

impl TsvReader<File> {
    /// Open a file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P, stream: &str) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        log::debug!("opened {} input {}", stream, path.as_ref().display());
        Ok(Self::new(file, stream))
    }
}

impl<R: Read> TsvReader<R> {
    /// Create a reader from any readable source.
    ///
    /// `stream` names the input ("regions", "sites") in error messages.
    pub fn new(reader: R, stream: &str) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_INPUT_BUFFER, reader),
            stream: stream.to_string(),
            line_number: 0,
            buffer: String::with_capacity(DEFAULT_LINE_BUFFER),
            validator: None,
        }
    }

    /// Check sort order of every record as it is read.
    pub fn with_order_validation(mut self) -> Self {
        self.validator = Some(OrderValidator::new(self.stream.clone()));
        self
    }

    /// Name of this stream.
    pub fn stream(&self) -> &str {
        &self.stream
    }

    /// Line number of the most recently read line (1-based).
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Read the header: the first non-blank line, split into fields.
    pub fn read_header(&mut self) -> Result<Vec<String>> {
        if !self.next_line()? {
            return Err(MergeError::MissingHeader {
                stream: self.stream.clone(),
            });
        }
        Ok(split_fields(self.current_line()))
    }

    /// Read the next record, skipping blank lines.
    ///
    /// Returns `Ok(None)` at end of stream.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        if !self.next_line()? {
            return Ok(None);
        }

        let record = Record::parse(self.current_line(), &self.stream, self.line_number)?;
        if let Some(validator) = self.validator.as_mut() {
            validator.validate(&record, self.line_number)?;
        }
        Ok(Some(record))
    }

    /// Advance to the next non-blank line. Returns false at EOF.
    fn next_line(&mut self) -> Result<bool> {
        loop {
            self.buffer.clear();
            let bytes_read = match self.reader.read_line(&mut self.buffer) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    return Err(MergeError::MalformedRecord {
                        stream: self.stream.clone(),
                        line: self.line_number + 1,
                        message: "line is not valid UTF-8".to_string(),
                    });
                }
                Err(e) => return Err(MergeError::Io(e)),
            };
            if bytes_read == 0 {
                return Ok(false);
            }
            self.line_number += 1;

            if !self.buffer.trim().is_empty() {
                return Ok(true);
            }
        }
    }

    #[inline]
    fn current_line(&self) -> &str {
        self.buffer.trim_end_matches(['\n', '\r'])
    }
}
