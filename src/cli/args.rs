//! CLI argument definitions.

use crate::cli::validators::{parse_confidence, parse_date, parse_precision};
use crate::constants::report::SEASONAL_WINDOW_DAYS;
use crate::output::ReportFormat;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Per-species precision calibration and biodiversity statistics for bird classifier output.
#[derive(Debug, Parser)]
#[command(name = "birdstats")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every command.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sweep confidence thresholds and pick one per species.
    Calibrate {
        /// Dataset short name from configuration.
        dataset: String,
        /// Also report the lowest threshold reaching this precision.
        #[arg(long, value_parser = parse_precision)]
        target_precision: Option<f64>,
        /// Count corpus detections under each calibrated threshold.
        #[arg(long)]
        with_corpus: bool,
    },
    /// Break down annotation verdicts per species.
    Precisions {
        /// Dataset short name from configuration.
        dataset: String,
    },
    /// Summarise datasets and fold cross-dataset totals.
    Summary {
        /// Datasets to include (default: all configured).
        datasets: Vec<String>,
    },
    /// Export detections that pass a confidence gate.
    Filter {
        /// Dataset short name from configuration.
        dataset: String,
        /// Single confidence gate for every species (default: report.global_confidence).
        #[arg(short = 'c', long, value_parser = parse_confidence, conflicts_with = "calibrated")]
        min_confidence: Option<f64>,
        /// Gate each species at its calibrated threshold.
        #[arg(long)]
        calibrated: bool,
        /// With --calibrated, drop species calibrated below this precision.
        #[arg(long, value_parser = parse_precision, requires = "calibrated")]
        min_precision: Option<f64>,
    },
    /// Hour-of-day activity profiles of high-precision species.
    Diurnal {
        /// Dataset short name from configuration.
        dataset: String,
        /// Species selection options.
        #[command(flatten)]
        species: SpeciesArgs,
    },
    /// Species richness per habitat.
    Habitat {
        /// Dataset short name from configuration.
        dataset: String,
        /// Species selection options.
        #[command(flatten)]
        species: SpeciesArgs,
    },
    /// Detection rate of one species per habitat.
    HabitatActivity {
        /// Dataset short name from configuration.
        dataset: String,
        /// Species common name.
        #[arg(long)]
        species: String,
    },
    /// Daily detections of one species per region, north to south.
    Latitudinal {
        /// Dataset short name from configuration.
        dataset: String,
        /// Species common name.
        #[arg(long)]
        species: String,
        /// First day of the window (YYYY-MM-DD).
        #[arg(long, value_parser = parse_date)]
        start: NaiveDate,
        /// Last day of the window, inclusive (YYYY-MM-DD).
        #[arg(long, value_parser = parse_date)]
        end: NaiveDate,
    },
    /// Smoothed day-by-day occurrence of high-precision species.
    Seasonal {
        /// Dataset short name from configuration.
        dataset: String,
        /// Smoothing window in days.
        #[arg(long, default_value_t = SEASONAL_WINDOW_DAYS)]
        window: usize,
        /// Species selection options.
        #[command(flatten)]
        species: SpeciesArgs,
    },
    /// Convert a corpus archive between JSON and Parquet.
    Convert {
        /// Input archive (.json or .parquet).
        input: PathBuf,
        /// Output archive (.json or .parquet).
        output: PathBuf,
    },
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Which calibrated species an activity report covers.
#[derive(Debug, Clone, Copy, Args)]
pub struct SpeciesArgs {
    /// Minimum calibrated precision (default: report.species_precision).
    #[arg(long, value_parser = parse_precision)]
    pub species_precision: Option<f64>,
}

/// Options shared by every command.
#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct GlobalArgs {
    /// Configuration file (default: platform config directory).
    #[arg(long, global = true, env = "BIRDSTATS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Report directory (overrides config).
    #[arg(short, long, global = true, env = "BIRDSTATS_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Report format (overrides config).
    #[arg(short, long, value_enum, global = true, env = "BIRDSTATS_FORMAT")]
    pub format: Option<ReportFormat>,

    /// Do not show progress bars.
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Stop at the first dataset that fails to load.
    #[arg(long, global = true)]
    pub fail_fast: bool,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}
