//! Buffered tab-delimited output.

use crate::error::{MergeError, Result};
use crate::record::{MergedRecord, Region};
use crate::streaming::buffers::DEFAULT_OUTPUT_BUFFER;
use std::io::{BufWriter, Write};

/// Tab-delimited output writer.
pub struct TsvWriter<W: Write> {
    writer: BufWriter<W>,
    rows_written: usize,
}

impl<W: Write> TsvWriter<W> {
    /// Create a new TsvWriter with default 2MB buffer.
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_OUTPUT_BUFFER, output)
    }

    /// Create a new TsvWriter with specified buffer size.
    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            rows_written: 0,
        }
    }

    /// Write fields joined by tabs, followed by a newline.
    pub fn write_fields<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<()> {
        self.write_row(fields.iter().map(|field| field.as_ref()))
    }

    fn write_row<'a, I>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                self.writer.write_all(b"\t").map_err(MergeError::Io)?;
            }
            self.writer
                .write_all(field.as_bytes())
                .map_err(MergeError::Io)?;
        }
        self.writer.write_all(b"\n").map_err(MergeError::Io)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Write the combined header: all region columns, then site columns
    /// from index 3 on.
    pub fn write_header(&mut self, region_header: &[String], site_header: &[String]) -> Result<()> {
        let site_extra = site_header.get(3..).unwrap_or(&[]);
        let mut header = Vec::with_capacity(region_header.len() + site_extra.len());
        header.extend(region_header.iter().map(String::as_str));
        header.extend(site_extra.iter().map(String::as_str));
        self.write_fields(&header)
    }

    /// Write a region with nothing attached.
    #[inline]
    pub fn write_region(&mut self, region: &Region) -> Result<()> {
        self.write_fields(region.fields())
    }

    /// Write a merged row. Takes ownership; the row is done once written.
    #[inline]
    pub fn write_merged(&mut self, row: MergedRecord) -> Result<()> {
        self.write_row(row.fields())
    }

    /// Rows written so far, header included.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush the output buffer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(MergeError::Io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    fn strings(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_write_header_drops_site_coordinates() {
        let mut output = Vec::new();
        {
            let mut writer = TsvWriter::new(&mut output);
            writer
                .write_header(
                    &strings(&["chr", "start", "end", "dmr"]),
                    &strings(&["chr", "start", "end", "liver", "lung"]),
                )
                .unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(output, b"chr\tstart\tend\tdmr\tliver\tlung\n");
    }

    #[test]
    fn test_write_header_short_site_header() {
        let mut output = Vec::new();
        {
            let mut writer = TsvWriter::new(&mut output);
            writer
                .write_header(&strings(&["chr", "start", "end"]), &strings(&["chr"]))
                .unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(output, b"chr\tstart\tend\n");
    }

    #[test]
    fn test_write_region_and_merged() {
        let region = Record::parse("1\t100\t200\tA", "regions", 2).unwrap();
        let site = Record::parse("1\t120\t121\t0.9", "sites", 2).unwrap();
        let mut row = MergedRecord::new(region.clone());
        row.push_site(&site);

        let mut output = Vec::new();
        {
            let mut writer = TsvWriter::new(&mut output);
            writer.write_region(&region).unwrap();
            writer.write_merged(row).unwrap();
            assert_eq!(writer.rows_written(), 2);
            writer.flush().unwrap();
        }
        assert_eq!(output, b"1\t100\t200\tA\n1\t100\t200\tA\t0.9\n");
    }
}
