//! Streaming merge-join of DMR regions with methylation sites.
//!
//! Walks a sorted region stream and a sorted site stream once, side by side,
//! and writes every region with the trailing fields of the sites it contains
//! appended in input order.
//!
//! # Matching rule
//!
//! First fit, no backtracking. A site is compared against the current region
//! only. Once the sweep moves past a region it never returns to it, so a
//! site that would also fit a later region is attached to whichever region
//! is active when the site is visited, or to none.
//!
//! # Memory Complexity
//!
//! O(s) where s = the number of sites attached to a single region.
//!
//! # Requirements
//!
//! Both inputs MUST be sorted by (chromosome key, start, end). This is not
//! checked unless [`MergeJoinCommand::validate_order`] is set; unsorted input
//! silently yields missing matches.

use crate::error::{MergeError, Result};
use crate::record::{MergedRecord, Region, Site, FIXED_COLUMNS};
use crate::streaming::{TsvReader, TsvWriter};
use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Merge-join command configuration.
#[derive(Debug, Clone, Default)]
pub struct MergeJoinCommand {
    /// Fail with `UnorderedInput` if either stream goes backwards
    pub validate_order: bool,
}

/// Statistics from a merge-join run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeJoinStats {
    /// Number of regions read (and written)
    pub regions: usize,
    /// Regions with at least one site attached
    pub regions_matched: usize,
    /// Number of sites read; always `sites_attached + sites_discarded`
    pub sites: usize,
    /// Sites attached to some region
    pub sites_attached: usize,
    /// Sites read but not attached, including the one pending when the
    /// region stream ends. Sites after it are never read.
    pub sites_discarded: usize,
    /// Most sites attached to a single region
    pub max_sites_per_region: usize,
}

impl std::fmt::Display for MergeJoinStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Regions: {} ({} matched), Sites: {} ({} attached, {} discarded), Max sites/region: {}",
            self.regions,
            self.regions_matched,
            self.sites,
            self.sites_attached,
            self.sites_discarded,
            self.max_sites_per_region
        )
    }
}

impl MergeJoinCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge two sorted files, writing the result to `output`.
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>, W: Write>(
        &self,
        regions_path: P,
        sites_path: Q,
        output: W,
    ) -> Result<MergeJoinStats> {
        let regions = TsvReader::from_path(regions_path, "regions")?;
        let sites = TsvReader::from_path(sites_path, "sites")?;
        self.run_readers(regions, sites, output)
    }

    /// Merge two sorted files into a file at `output_path`.
    ///
    /// With `atomic`, the output is written to a temporary file in the same
    /// directory and renamed into place only after the merge succeeds; on
    /// error the destination is left untouched. Without it, a failed run
    /// leaves whatever was written so far.
    pub fn run_to_path<P: AsRef<Path>, Q: AsRef<Path>, O: AsRef<Path>>(
        &self,
        regions_path: P,
        sites_path: Q,
        output_path: O,
        atomic: bool,
    ) -> Result<MergeJoinStats> {
        let (regions_path, sites_path) = (regions_path.as_ref(), sites_path.as_ref());
        let output_path = output_path.as_ref();

        // Inputs are opened and checked before the destination is touched
        let regions = TsvReader::from_path(regions_path, "regions")?;
        let sites = TsvReader::from_path(sites_path, "sites")?;
        ensure_not_input(output_path, &[regions_path, sites_path])?;

        if !atomic {
            let file = File::create(output_path)?;
            return self.run_readers(regions, sites, file);
        }

        let dir = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let tmp = NamedTempFile::new_in(dir)?;
        let stats = self.run_readers(regions, sites, tmp.as_file())?;
        tmp.persist(output_path)?;
        log::debug!("renamed temporary output to {}", output_path.display());
        Ok(stats)
    }

    /// Merge two record streams.
    ///
    /// Reads one header from each stream, writes the combined header, then
    /// performs the sweep.
    pub fn run_readers<R1: Read, R2: Read, W: Write>(
        &self,
        regions: TsvReader<R1>,
        sites: TsvReader<R2>,
        output: W,
    ) -> Result<MergeJoinStats> {
        let (mut regions, mut sites) = if self.validate_order {
            (regions.with_order_validation(), sites.with_order_validation())
        } else {
            (regions, sites)
        };
        let mut writer = TsvWriter::new(output);

        let region_header = regions.read_header()?;
        let site_header = sites.read_header()?;
        if site_header.len() < FIXED_COLUMNS {
            log::warn!(
                "site header has {} columns, expected at least {}",
                site_header.len(),
                FIXED_COLUMNS
            );
        }
        writer.write_header(&region_header, &site_header)?;

        let mut stats = MergeJoinStats::default();
        let mut region = next_region(&mut regions, &mut stats)?;
        let mut site = next_site(&mut sites, &mut stats)?;

        while let Some(current) = region.take() {
            let Some(candidate) = site.take() else {
                drain(current, &mut regions, &mut writer, &mut stats)?;
                break;
            };

            match candidate.key().cmp(&current.key()) {
                Ordering::Less => {
                    stats.sites_discarded += 1;
                    site = next_site(&mut sites, &mut stats)?;
                    region = Some(current);
                }
                Ordering::Greater => {
                    writer.write_region(&current)?;
                    region = next_region(&mut regions, &mut stats)?;
                    site = Some(candidate);
                }
                Ordering::Equal if candidate.start() < current.start() => {
                    stats.sites_discarded += 1;
                    site = next_site(&mut sites, &mut stats)?;
                    region = Some(current);
                }
                Ordering::Equal if current.contains(&candidate) => {
                    let (row, next) = collect_matches(current, candidate, &mut sites, &mut stats)?;
                    stats.regions_matched += 1;
                    stats.sites_attached += row.site_count();
                    stats.max_sites_per_region = stats.max_sites_per_region.max(row.site_count());
                    writer.write_merged(row)?;
                    region = next_region(&mut regions, &mut stats)?;
                    site = next;
                }
                Ordering::Equal => {
                    // Starts inside but runs past the end; retry on the next region
                    writer.write_region(&current)?;
                    region = next_region(&mut regions, &mut stats)?;
                    site = Some(candidate);
                }
            }
        }

        if site.is_some() {
            stats.sites_discarded += 1;
            log::debug!(
                "{} stream ended at line {} with sites remaining; dropping them",
                regions.stream(),
                regions.line_number()
            );
        }

        writer.flush()?;
        log::debug!("wrote {} rows", writer.rows_written());
        log::info!("{}", stats);
        Ok(stats)
    }
}

/// Fail if `output` names the same file as any of `inputs`.
///
/// Paths are compared after canonicalization, so `./regions.tsv`,
/// `regions.tsv` and symlinks to it all match. A path that cannot be
/// canonicalized (an output that does not exist yet, a `/dev/fd` pipe) cannot
/// be an existing input file.
pub fn ensure_not_input(output: &Path, inputs: &[&Path]) -> Result<()> {
    let Ok(output_real) = fs::canonicalize(output) else {
        return Ok(());
    };
    for input in inputs {
        if fs::canonicalize(input).is_ok_and(|input_real| input_real == output_real) {
            return Err(MergeError::Config(format!(
                "output '{}' would overwrite input '{}'",
                output.display(),
                input.display()
            )));
        }
    }
    Ok(())
}

/// Attach `first` and every directly following site contained in `region`.
///
/// Returns the finished row and the first site that did not fit (or `None`
/// if the site stream ended), which the caller re-tests against the next
/// region.
fn collect_matches<R: Read>(
    region: Region,
    first: Site,
    sites: &mut TsvReader<R>,
    stats: &mut MergeJoinStats,
) -> Result<(MergedRecord, Option<Site>)> {
    let mut row = MergedRecord::new(region);
    row.push_site(&first);

    loop {
        match next_site(sites, stats)? {
            Some(next) if row.region().contains(&next) => row.push_site(&next),
            other => return Ok((row, other)),
        }
    }
}

/// Write `current` and every remaining region unmatched.
fn drain<R: Read, W: Write>(
    current: Region,
    regions: &mut TsvReader<R>,
    writer: &mut TsvWriter<W>,
    stats: &mut MergeJoinStats,
) -> Result<()> {
    log::debug!(
        "site stream exhausted; draining {} from line {}",
        regions.stream(),
        regions.line_number()
    );
    writer.write_region(&current)?;
    while let Some(region) = next_region(regions, stats)? {
        writer.write_region(&region)?;
    }
    Ok(())
}

#[inline]
fn next_region<R: Read>(
    regions: &mut TsvReader<R>,
    stats: &mut MergeJoinStats,
) -> Result<Option<Region>> {
    let region = regions.next_record()?;
    if region.is_some() {
        stats.regions += 1;
    }
    Ok(region)
}

#[inline]
fn next_site<R: Read>(sites: &mut TsvReader<R>, stats: &mut MergeJoinStats) -> Result<Option<Site>> {
    let site = sites.next_record()?;
    if site.is_some() {
        stats.sites += 1;
    }
    Ok(site)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const REGION_HEADER: &str = "chr\tstart\tend\tdmr";
    const SITE_HEADER: &str = "chr\tstart\tend\tliver\tlung";

    fn merge_with(
        cmd: &MergeJoinCommand,
        regions: &str,
        sites: &str,
    ) -> Result<(String, MergeJoinStats)> {
        let regions = TsvReader::new(Cursor::new(regions.as_bytes().to_vec()), "regions");
        let sites = TsvReader::new(Cursor::new(sites.as_bytes().to_vec()), "sites");
        let mut output = Vec::new();
        let stats = cmd.run_readers(regions, sites, &mut output)?;
        Ok((String::from_utf8(output).unwrap(), stats))
    }

    fn merge(region_rows: &[&str], site_rows: &[&str]) -> (Vec<String>, MergeJoinStats) {
        let regions = std::iter::once(REGION_HEADER)
            .chain(region_rows.iter().copied())
            .collect::<Vec<_>>()
            .join("\n");
        let sites = std::iter::once(SITE_HEADER)
            .chain(site_rows.iter().copied())
            .collect::<Vec<_>>()
            .join("\n");
        let (out, stats) = merge_with(&MergeJoinCommand::new(), &regions, &sites).unwrap();
        let mut lines: Vec<String> = out.lines().map(str::to_string).collect();
        assert_eq!(lines.remove(0), "chr\tstart\tend\tdmr\tliver\tlung");
        (lines, stats)
    }

    #[test]
    fn test_single_site_attached() {
        let (rows, stats) = merge(
            &["chr1\t100\t200\tA"],
            &["chr1\t50\t51\tx\tx", "chr1\t120\t121\ty\ty", "chr1\t300\t301\tz\tz"],
        );
        assert_eq!(rows, vec!["chr1\t100\t200\tA\ty\ty"]);
        assert_eq!(stats.regions, 1);
        assert_eq!(stats.regions_matched, 1);
        assert_eq!(stats.sites, 3);
        assert_eq!(stats.sites_attached, 1);
        // x skipped before the region, z pending when the regions ran out
        assert_eq!(stats.sites_discarded, 2);
    }

    #[test]
    fn test_trailing_site_attaches_to_later_region() {
        let (rows, _) = merge(
            &["1\t100\t200\tA", "1\t250\t400\tB"],
            &["1\t50\t51\tx\tx", "1\t120\t121\ty\ty", "1\t300\t301\tz\tz"],
        );
        assert_eq!(rows, vec!["1\t100\t200\tA\ty\ty", "1\t250\t400\tB\tz\tz"]);
    }

    #[test]
    fn test_multiple_sites_in_site_order() {
        let (rows, stats) = merge(
            &["1\t100\t200\tA"],
            &["1\t110\t111\ta1\ta2", "1\t150\t151\tb1\tb2"],
        );
        assert_eq!(rows, vec!["1\t100\t200\tA\ta1\ta2\tb1\tb2"]);
        assert_eq!(stats.max_sites_per_region, 2);
    }

    #[test]
    fn test_unmatched_regions_pass_through() {
        let (rows, stats) = merge(
            &["1\t100\t200\tA", "1\t300\t400\tB", "2\t10\t20\tC"],
            &["1\t350\t351\tv\tv"],
        );
        assert_eq!(
            rows,
            vec!["1\t100\t200\tA", "1\t300\t400\tB\tv\tv", "2\t10\t20\tC"]
        );
        assert_eq!(stats.regions, 3);
        assert_eq!(stats.regions_matched, 1);
    }

    #[test]
    fn test_site_on_earlier_chromosome_discarded() {
        let (rows, stats) = merge(
            &["2\t100\t200\tA"],
            &["1\t150\t151\tp\tp", "2\t150\t151\tq\tq"],
        );
        assert_eq!(rows, vec!["2\t100\t200\tA\tq\tq"]);
        assert_eq!(stats.sites_discarded, 1);
    }

    #[test]
    fn test_region_on_earlier_chromosome_emitted() {
        let (rows, _) = merge(
            &["1\t100\t200\tA", "X\t100\t200\tB"],
            &["X\t150\t151\tq\tq"],
        );
        assert_eq!(rows, vec!["1\t100\t200\tA", "X\t100\t200\tB\tq\tq"]);
    }

    #[test]
    fn test_site_overhanging_region_end_retried_on_next_region() {
        let (rows, stats) = merge(
            &["1\t100\t200\tA", "1\t150\t300\tB"],
            &["1\t190\t210\to\to"],
        );
        assert_eq!(rows, vec!["1\t100\t200\tA", "1\t150\t300\tB\to\to"]);
        assert_eq!(stats.sites_discarded, 0);
    }

    #[test]
    fn test_matching_stops_at_first_misfit() {
        // The third site fits A but follows a misfit, so it is re-tested
        // against B only.
        let (rows, _) = merge(
            &["1\t100\t200\tA", "1\t300\t400\tB"],
            &["1\t110\t111\ta\ta", "1\t150\t260\tm\tm", "1\t160\t161\tc\tc"],
        );
        assert_eq!(rows, vec!["1\t100\t200\tA\ta\ta", "1\t300\t400\tB"]);
    }

    #[test]
    fn test_first_fit_for_overlapping_regions() {
        let (rows, _) = merge(
            &["1\t100\t200\tA", "1\t150\t250\tB"],
            &["1\t160\t161\ts\ts"],
        );
        assert_eq!(rows, vec!["1\t100\t200\tA\ts\ts", "1\t150\t250\tB"]);
    }

    #[test]
    fn test_matching_stops_at_chromosome_change() {
        let (rows, _) = merge(
            &["1\t100\t200\tA", "2\t100\t200\tB"],
            &["1\t150\t151\ta\ta", "2\t150\t151\tb\tb"],
        );
        assert_eq!(rows, vec!["1\t100\t200\tA\ta\ta", "2\t100\t200\tB\tb\tb"]);
    }

    #[test]
    fn test_region_stream_ends_first_drops_sites() {
        let (rows, stats) = merge(
            &["1\t100\t200\tA"],
            &["1\t150\t151\ta\ta", "1\t500\t501\tb\tb", "3\t1\t2\tc\tc"],
        );
        assert_eq!(rows, vec!["1\t100\t200\tA\ta\ta"]);
        assert_eq!(stats.regions, 1);
        // Only the site that ended the match is read; the rest stay unread
        assert_eq!(stats.sites, 2);
        assert_eq!(stats.sites_discarded, 1);
        assert_eq!(stats.sites, stats.sites_attached + stats.sites_discarded);
    }

    #[test]
    fn test_site_stream_ends_first_drains_regions() {
        let (rows, _) = merge(
            &["1\t100\t200\tA", "1\t300\t400\tB", "2\t1\t5\tC", "Y\t1\t5\tD"],
            &["1\t10\t11\tx\tx"],
        );
        assert_eq!(
            rows,
            vec!["1\t100\t200\tA", "1\t300\t400\tB", "2\t1\t5\tC", "Y\t1\t5\tD"]
        );
    }

    #[test]
    fn test_site_stream_ends_while_matching_keeps_row() {
        let (rows, stats) = merge(
            &["1\t100\t200\tA", "1\t300\t400\tB"],
            &["1\t150\t151\ta\ta", "1\t160\t161\tb\tb"],
        );
        assert_eq!(rows, vec!["1\t100\t200\tA\ta\ta\tb\tb", "1\t300\t400\tB"]);
        assert_eq!(stats.sites_attached, 2);
    }

    #[test]
    fn test_last_region_written_once() {
        let (rows, _) = merge(&["1\t100\t200\tA"], &["1\t150\t151\ta\ta"]);
        assert_eq!(rows, vec!["1\t100\t200\tA\ta\ta"]);
    }

    #[test]
    fn test_no_sites() {
        let (rows, stats) = merge(&["1\t100\t200\tA", "2\t1\t2\tB"], &[]);
        assert_eq!(rows, vec!["1\t100\t200\tA", "2\t1\t2\tB"]);
        assert_eq!(stats.sites, 0);
    }

    #[test]
    fn test_no_regions() {
        let (rows, stats) = merge(&[], &["1\t150\t151\ta\ta"]);
        assert!(rows.is_empty());
        assert_eq!(stats.regions, 0);
        assert_eq!(stats.sites, 1);
        assert_eq!(stats.sites_discarded, 1);
    }

    #[test]
    fn test_decimal_coordinates_and_blank_lines() {
        let (rows, _) = merge(
            &["", "1\t100.0\t200.0\tA", ""],
            &["", "1\t120.7\t121.2\tv\tw", ""],
        );
        assert_eq!(rows, vec!["1\t100.0\t200.0\tA\tv\tw"]);
    }

    #[test]
    fn test_unrecognized_chromosome_is_fatal() {
        let regions = format!("{}\nchrM\t1\t2\tA\n", REGION_HEADER);
        let sites = format!("{}\n1\t1\t2\tv\tv\n", SITE_HEADER);
        let err = merge_with(&MergeJoinCommand::new(), &regions, &sites).unwrap_err();
        assert!(matches!(err, MergeError::UnrecognizedChromosome { line: 2, .. }));
    }

    #[test]
    fn test_malformed_site_is_fatal() {
        let regions = format!("{}\n1\t100\t200\tA\n", REGION_HEADER);
        let sites = format!("{}\n1\t150\t151\tv\tv\n1\t160\n", SITE_HEADER);
        let err = merge_with(&MergeJoinCommand::new(), &regions, &sites).unwrap_err();
        assert!(matches!(err, MergeError::MalformedRecord { line: 3, .. }));
    }

    #[test]
    fn test_missing_site_header_is_fatal() {
        let regions = format!("{}\n1\t100\t200\tA\n", REGION_HEADER);
        let err = merge_with(&MergeJoinCommand::new(), &regions, "").unwrap_err();
        assert!(matches!(err, MergeError::MissingHeader { .. }));
    }

    #[test]
    fn test_validate_order() {
        let regions = format!("{}\n2\t100\t200\tA\n1\t100\t200\tB\n", REGION_HEADER);
        let sites = format!("{}\n3\t1\t2\tv\tv\n", SITE_HEADER);

        let lenient = merge_with(&MergeJoinCommand::new(), &regions, &sites);
        assert!(lenient.is_ok());

        let cmd = MergeJoinCommand {
            validate_order: true,
        };
        let err = merge_with(&cmd, &regions, &sites).unwrap_err();
        assert!(matches!(err, MergeError::UnorderedInput { line: 3, .. }));
    }

    #[test]
    fn test_rerun_is_identical() {
        let regions = format!("{}\n1\t100\t200\tA\n1\t300\t400\tB\n", REGION_HEADER);
        let sites = format!("{}\n1\t150\t151\tv\tv\n1\t350\t351\tw\tw\n", SITE_HEADER);
        let cmd = MergeJoinCommand::new();
        let (first, _) = merge_with(&cmd, &regions, &sites).unwrap();
        let (second, _) = merge_with(&cmd, &regions, &sites).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_ensure_not_input_matches_aliases() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("regions.tsv");
        fs::write(&input, "chr\tstart\tend\n").unwrap();

        let alias = dir.path().join(".").join("regions.tsv");
        let err = ensure_not_input(&alias, &[input.as_path()]).unwrap_err();
        assert!(err.to_string().contains("would overwrite input"));

        let fresh = dir.path().join("merged.tsv");
        assert!(ensure_not_input(&fresh, &[input.as_path()]).is_ok());
    }

    #[test]
    fn test_stats_display() {
        let stats = MergeJoinStats {
            regions: 3,
            regions_matched: 1,
            sites: 4,
            sites_attached: 2,
            sites_discarded: 1,
            max_sites_per_region: 2,
        };
        assert_eq!(
            stats.to_string(),
            "Regions: 3 (1 matched), Sites: 4 (2 attached, 1 discarded), Max sites/region: 2"
        );
    }
}
