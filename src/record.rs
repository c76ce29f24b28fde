//! Region, site and merged record types.
//!
//! Regions and sites share one layout: `chrom`, `start`, `end`, then any
//! number of opaque trailing fields that are copied to the output verbatim.

use crate::chrom::ChromKey;
use crate::error::{MergeError, Result};
use memchr::memchr_iter;

/// Number of fixed leading columns (chrom, start, end).
pub const FIXED_COLUMNS: usize = 3;

/// One parsed tab-delimited record from either input stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<String>,
    key: ChromKey,
    start: u64,
    end: u64,
}

/// A record from the region ("big") stream.
pub type Region = Record;

/// A record from the site ("small") stream.
pub type Site = Record;

impl Record {
    /// Parse a record from a single line (without the line terminator).
    ///
    /// `stream` and `line` are only used for error context.
    pub fn parse(text: &str, stream: &str, line: usize) -> Result<Self> {
        Self::from_fields(split_fields(text), stream, line)
    }

    /// Build a record from already split fields.
    pub fn from_fields(fields: Vec<String>, stream: &str, line: usize) -> Result<Self> {
        let malformed = |message: String| MergeError::MalformedRecord {
            stream: stream.to_string(),
            line,
            message,
        };

        if fields.len() < FIXED_COLUMNS {
            return Err(malformed(format!(
                "expected at least {} fields, got {}",
                FIXED_COLUMNS,
                fields.len()
            )));
        }

        let key =
            ChromKey::parse(&fields[0]).ok_or_else(|| MergeError::UnrecognizedChromosome {
                stream: stream.to_string(),
                line,
                label: fields[0].clone(),
            })?;
        let start = parse_coordinate(&fields[1])
            .ok_or_else(|| malformed(format!("invalid start coordinate '{}'", fields[1])))?;
        let end = parse_coordinate(&fields[2])
            .ok_or_else(|| malformed(format!("invalid end coordinate '{}'", fields[2])))?;

        if start > end {
            return Err(malformed(format!("start ({}) > end ({})", start, end)));
        }

        Ok(Self {
            fields,
            key,
            start,
            end,
        })
    }

    #[inline]
    pub fn key(&self) -> ChromKey {
        self.key
    }

    #[inline]
    pub fn start(&self) -> u64 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> u64 {
        self.end
    }

    /// All fields, including the fixed columns.
    #[inline]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Fields after chrom/start/end.
    #[inline]
    pub fn trailing(&self) -> &[String] {
        &self.fields[FIXED_COLUMNS..]
    }

    /// Whether `other` lies entirely within this record's closed interval
    /// on the same chromosome.
    #[inline]
    pub fn contains(&self, other: &Record) -> bool {
        self.key == other.key
            && self.start <= other.start
            && other.start <= self.end
            && self.start <= other.end
            && other.end <= self.end
    }
}

/// An output row: one region followed by the trailing fields of every site
/// attached to it, in the order the sites were consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRecord {
    region: Region,
    site_fields: Vec<String>,
    sites: usize,
}

impl MergedRecord {
    /// Start a row from a region with no sites attached.
    pub fn new(region: Region) -> Self {
        Self {
            region,
            site_fields: Vec::new(),
            sites: 0,
        }
    }

    /// The region this row is built on.
    #[inline]
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Append a site's trailing fields.
    pub fn push_site(&mut self, site: &Site) {
        self.site_fields.extend_from_slice(site.trailing());
        self.sites += 1;
    }

    /// Number of sites attached.
    #[inline]
    pub fn site_count(&self) -> usize {
        self.sites
    }

    /// Region fields followed by every attached site block.
    pub fn fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.region
            .fields()
            .iter()
            .chain(self.site_fields.iter())
            .map(String::as_str)
    }
}

/// Split a line on tabs.
pub fn split_fields(line: &str) -> Vec<String> {
    let bytes = line.as_bytes();
    let mut fields = Vec::with_capacity(8);
    let mut begin = 0;
    for tab in memchr_iter(b'\t', bytes) {
        fields.push(line[begin..tab].to_string());
        begin = tab + 1;
    }
    fields.push(line[begin..].to_string());
    fields
}

/// Parse a coordinate, truncating decimals toward zero.
///
/// Spreadsheet exports write positions like `1200.0`, so plain integers are
/// tried first and anything else goes through `f64`. Negative, non-finite and
/// out of range values are rejected.
pub fn parse_coordinate(s: &str) -> Option<u64> {
    let s = s.trim();
    if let Ok(n) = s.parse::<u64>() {
        return Some(n);
    }
    let value = s.parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }
    let truncated = value.trunc();
    if truncated < 0.0 || truncated >= u64::MAX as f64 {
        return None;
    }
    Some(truncated as u64)
}
