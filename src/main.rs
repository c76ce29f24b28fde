//! dmrmerge: attach methylation sites to the DMR regions containing them
//!
//! Usage: dmrmerge <COMMAND> [OPTIONS]

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;
use std::process;

use dmr_merge::commands::verify_sorted;
use dmr_merge::config::RunConfig;
use dmr_merge::error::MergeError;

#[derive(Parser)]
#[command(name = "dmrmerge")]
#[command(version)]
#[command(about = "Merge sorted methylation sites into the DMR regions that contain them", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Attach each site to the region containing it
    Merge {
        /// Sorted region (DMR) file
        #[arg(short = 'a', long)]
        regions: PathBuf,

        /// Sorted site file
        #[arg(short = 'b', long)]
        sites: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail if either input is not sorted by chromosome, start, end
        #[arg(long)]
        check_order: bool,

        /// Write to a temporary file and rename it into place on success
        #[arg(long, requires = "output")]
        atomic: bool,

        /// Print merge statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Check that a region or site file is sorted
    CheckOrder {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,

        /// Name used for the file in error messages
        #[arg(long, default_value = "input")]
        name: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Merge {
            regions,
            sites,
            output,
            check_order,
            atomic,
            stats,
        } => run_merge(regions, sites, output, check_order, atomic, stats),
        Commands::CheckOrder { input, name } => run_check_order(input, name),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, 2) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };
    pretty_env_logger::formatted_builder()
        .filter_level(level)
        .init();
}

fn run_merge(
    regions: PathBuf,
    sites: PathBuf,
    output: Option<PathBuf>,
    check_order: bool,
    atomic: bool,
    stats: bool,
) -> Result<(), MergeError> {
    let mut config = RunConfig::new(regions, sites);
    config.output = output;
    config.validate_order = check_order;
    config.atomic = atomic;

    let result = config.execute()?;

    if stats {
        eprintln!("Merge stats: {}", result);
    }

    Ok(())
}

fn run_check_order(input: PathBuf, name: String) -> Result<(), MergeError> {
    let records = verify_sorted(&input, &name)?;
    eprintln!("{}: {} records in order", input.display(), records);
    Ok(())
}
