//! Birdstats - per-species precision calibration and biodiversity statistics
//! for bird classifier output.
//!
//! This crate turns raw classifier detections and a human-reviewed sample of
//! them into per-species confidence thresholds, filtered detection sets and
//! the activity reports built on top of them.

#![warn(missing_docs)]

pub mod annotations;
pub mod calibration;
pub mod cli;
pub mod config;
pub mod constants;
pub mod corpus;
pub mod detections;
pub mod error;
pub mod output;
pub mod sites;
pub mod stats;

use std::path::{Path, PathBuf};

use annotations::{AnnotatedInstance, parse_annotation_file};
use calibration::{Calibration, calibrate, verdict_breakdown};
use chrono::{FixedOffset, NaiveDate};
use clap::Parser;
use cli::{Cli, Command, ConfigAction, GlobalArgs};
use config::{Config, DatasetConfig, build_grid, get_dataset, load_config, validate_config};
use constants::report_names;
use corpus::{load_corpus, save_corpus};
use detections::{FileDetectionRecord, Gate, filter};
use output::{ReportFormat, write_report};
use serde::Serialize;
use tracing::{error, info, warn};

pub use error::{Error, Result};

/// Main entry point for birdstats CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.global.verbose, cli.global.quiet);

    // Load configuration
    let config = load_config(cli.global.config.as_deref())?;
    validate_config(&config)?;

    handle_command(cli.command, &cli.global, &config)
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // Build filter string based on verbosity level.
    // Arrow and Parquet internals stay quiet unless -vv is given.
    let filter_str = if quiet {
        "warn".to_string()
    } else {
        match verbose {
            0 => "info,parquet=warn,arrow=warn".to_string(),
            1 => "debug,parquet=info,arrow=info".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Where and how reports are written for one invocation.
struct ReportSink {
    dir: PathBuf,
    format: ReportFormat,
    csv_bom: bool,
}

impl ReportSink {
    fn new(global: &GlobalArgs, config: &Config) -> Self {
        Self {
            dir: global
                .output_dir
                .clone()
                .unwrap_or_else(|| config.report.output_dir.clone()),
            format: global.format.unwrap_or(config.report.format),
            csv_bom: config.report.csv_bom,
        }
    }

    /// Write a report into the top-level report directory.
    fn write<T: Serialize>(&self, name: &str, rows: &[T]) -> Result<PathBuf> {
        write_report(&self.dir, name, self.format, self.csv_bom, rows)
    }

    /// Write a report into the dataset's own subdirectory.
    fn write_for<T: Serialize>(
        &self,
        dataset: &DatasetConfig,
        name: &str,
        rows: &[T],
    ) -> Result<PathBuf> {
        write_report(
            &self.dir.join(&dataset.short_name),
            name,
            self.format,
            self.csv_bom,
            rows,
        )
    }
}

fn handle_command(command: Command, global: &GlobalArgs, config: &Config) -> Result<()> {
    let sink = ReportSink::new(global, config);

    match command {
        Command::Config { action } => handle_config_command(action, global.config.as_deref()),
        Command::Calibrate {
            dataset,
            target_precision,
            with_corpus,
        } => handle_calibrate(
            get_dataset(config, &dataset)?,
            config,
            &sink,
            target_precision,
            with_corpus,
        ),
        Command::Precisions { dataset } => {
            handle_precisions(get_dataset(config, &dataset)?, config, &sink)
        }
        Command::Summary { datasets } => handle_summary(&datasets, global, config, &sink),
        Command::Filter {
            dataset,
            min_confidence,
            calibrated,
            min_precision,
        } => {
            let dataset = get_dataset(config, &dataset)?;
            let corpus = load_corpus(&dataset.corpus)?;
            let gate = if calibrated {
                load_calibration(dataset, config, None)?.gate(min_precision)
            } else {
                Gate::Global(min_confidence.unwrap_or(config.report.global_confidence))
            };
            let valid = filter(&corpus, &gate);
            info!(
                "{}: {} valid detections from {} files",
                dataset.name,
                valid.len(),
                corpus.len()
            );
            sink.write_for(dataset, report_names::DETECTIONS, &valid)?;
            Ok(())
        }
        Command::Diurnal { dataset, species } => handle_diurnal(
            get_dataset(config, &dataset)?,
            config,
            &sink,
            species
                .species_precision
                .unwrap_or(config.report.species_precision),
        ),
        Command::Habitat { dataset, species } => handle_habitat(
            get_dataset(config, &dataset)?,
            config,
            &sink,
            species
                .species_precision
                .unwrap_or(config.report.species_precision),
        ),
        Command::HabitatActivity { dataset, species } => {
            handle_habitat_activity(get_dataset(config, &dataset)?, config, &sink, &species)
        }
        Command::Latitudinal {
            dataset,
            species,
            start,
            end,
        } => handle_latitudinal(
            get_dataset(config, &dataset)?,
            config,
            &sink,
            &species,
            (start, end),
        ),
        Command::Seasonal {
            dataset,
            window,
            species,
        } => handle_seasonal(
            get_dataset(config, &dataset)?,
            config,
            &sink,
            window,
            species
                .species_precision
                .unwrap_or(config.report.species_precision),
        ),
        Command::Convert { input, output } => {
            let corpus = load_corpus(&input)?;
            save_corpus(&corpus, &output)?;
            info!(
                "Converted {} files from {} to {}",
                corpus.len(),
                input.display(),
                output.display()
            );
            Ok(())
        }
    }
}

fn load_annotations(dataset: &DatasetConfig) -> Result<Vec<AnnotatedInstance>> {
    let annotations = parse_annotation_file(&dataset.annotations)?;
    info!(
        "{}: {} annotated detections",
        dataset.name,
        annotations.len()
    );
    Ok(annotations)
}

/// Parse a dataset's annotations and run the threshold sweep.
fn load_calibration(
    dataset: &DatasetConfig,
    config: &Config,
    target_precision: Option<f64>,
) -> Result<Calibration> {
    let annotations = load_annotations(dataset)?;
    let grid = build_grid(config)?;
    Ok(calibrate(&annotations, &grid, target_precision))
}

/// Species list and gate for activity reports at `species_precision`.
fn allowed_species(calibration: &Calibration, species_precision: f64) -> (Vec<String>, Gate) {
    let species: Vec<String> = calibration
        .allowed_species(species_precision)
        .into_iter()
        .map(str::to_string)
        .collect();
    info!(
        "{} species calibrated at precision >= {species_precision}",
        species.len()
    );
    (species, calibration.gate(Some(species_precision)))
}

fn dataset_offset(dataset: &DatasetConfig) -> Result<FixedOffset> {
    #[allow(clippy::cast_possible_truncation)]
    let seconds = (dataset.utc_offset_hours * 3600.0).round() as i32;
    FixedOffset::east_opt(seconds).ok_or_else(|| Error::ConfigValidation {
        message: format!(
            "dataset '{}': utc_offset_hours {} is out of range",
            dataset.short_name, dataset.utc_offset_hours
        ),
    })
}

fn handle_calibrate(
    dataset: &DatasetConfig,
    config: &Config,
    sink: &ReportSink,
    target_precision: Option<f64>,
    with_corpus: bool,
) -> Result<()> {
    let target = target_precision.or(config.calibration.target_precision);
    let mut calibration = load_calibration(dataset, config, target)?;

    if with_corpus {
        let corpus = load_corpus(&dataset.corpus)?;
        calibration = calibration.with_corpus(&corpus, config.report.min_detections);
    }

    if !calibration.uncalibrated().is_empty() {
        warn!(
            "{}: no precision estimate on the grid for {}",
            dataset.name,
            calibration.uncalibrated().join(", ")
        );
    }

    let counts = stats::precision_counts(
        calibration.calibrated().values().map(|c| c.precision),
        config.report.medium_precision,
    );
    info!(
        "{}: {} species calibrated; {} at precision 1, {} at >= {}, {} at 0",
        dataset.name,
        counts.total,
        counts.perfect,
        counts.medium,
        config.report.medium_precision,
        counts.zero
    );

    sink.write_for(
        dataset,
        report_names::CALIBRATION,
        &stats::calibrated_rows(&calibration),
    )?;
    sink.write_for(
        dataset,
        report_names::PRECISION_GRID,
        &stats::precision_grid_rows(&calibration),
    )?;
    Ok(())
}

fn handle_precisions(dataset: &DatasetConfig, config: &Config, sink: &ReportSink) -> Result<()> {
    let annotations = load_annotations(dataset)?;
    let rows = stats::verdict_rows(&verdict_breakdown(&annotations));

    let counts = stats::precision_counts(
        rows.iter().map(|r| r.correct),
        config.report.medium_precision,
    );
    info!(
        "{}: {} total; 100% {} species; >= {} {} species; 0% {}",
        dataset.name,
        counts.total,
        counts.perfect,
        config.report.medium_precision,
        counts.medium,
        counts.zero
    );

    sink.write_for(dataset, report_names::PRECISIONS, &rows)?;
    Ok(())
}

fn summarize_one(dataset: &DatasetConfig, config: &Config) -> Result<stats::DatasetSummary> {
    let corpus = load_corpus(&dataset.corpus)?;
    let calibration = load_calibration(dataset, config, None)?;
    let options = stats::SummaryOptions {
        global_confidence: config.report.global_confidence,
        min_detections: config.report.min_detections,
        medium_precision: config.report.medium_precision,
        high_precision: config.report.high_precision,
        minutes_per_file: dataset.minutes_per_file,
        duration: dataset.duration,
    };
    Ok(stats::summarize_dataset(
        &dataset.short_name,
        &corpus,
        &calibration,
        &options,
    ))
}

fn handle_summary(
    names: &[String],
    global: &GlobalArgs,
    config: &Config,
    sink: &ReportSink,
) -> Result<()> {
    use crate::output::{
        create_dataset_progress, finish_progress, inc_progress, set_progress_message,
    };

    let datasets: Vec<&DatasetConfig> = if names.is_empty() {
        if config.datasets.is_empty() {
            return Err(Error::NoDatasets);
        }
        config.datasets.iter().collect()
    } else {
        names
            .iter()
            .map(|name| get_dataset(config, name))
            .collect::<Result<_>>()?
    };

    let progress_enabled = !global.quiet && !global.no_progress;
    let progress = create_dataset_progress(datasets.len(), progress_enabled);

    let mut summaries = Vec::with_capacity(datasets.len());
    let mut errors = 0;

    for dataset in &datasets {
        set_progress_message(progress.as_ref(), &dataset.name);
        match summarize_one(dataset, config) {
            Ok(summary) => {
                info!(
                    "{}: {} sites, {} hours ({} files), {} species, {} detections, \
                     {} species with >= {} detections, {} high-precision detections ({}%)",
                    dataset.name,
                    summary.sites,
                    summary.hours,
                    summary.files,
                    summary.species,
                    summary.detections,
                    summary.well_sampled_species,
                    config.report.min_detections,
                    summary.high_precision_detections,
                    summary.high_precision_percent
                );
                summaries.push(summary);
            }
            Err(e) => {
                if global.fail_fast {
                    finish_progress(progress, "failed");
                    return Err(e);
                }
                error!("{}: {e}", dataset.name);
                errors += 1;
            }
        }
        inc_progress(progress.as_ref());
    }
    finish_progress(progress, "done");

    let totals: stats::SummaryTotals = summaries.iter().collect();
    let totals_row = totals.row();
    info!(
        "Totals: {} hours, {} sites, {} species, {} detections, {} high-precision species",
        totals_row.hours,
        totals_row.sites,
        totals_row.species,
        totals_row.detections,
        totals_row.high_precision_species
    );

    sink.write(report_names::SUMMARY, &summaries)?;
    sink.write(report_names::SUMMARY_TOTALS, &[totals_row])?;
    sink.write(report_names::SHARED_SPECIES, &totals.shared_species())?;

    if errors > 0 {
        warn!("{} dataset(s) had errors", errors);
    }
    Ok(())
}

/// Corpus filtered to the allowed species at their calibrated thresholds.
fn load_allowed(
    dataset: &DatasetConfig,
    config: &Config,
    species_precision: f64,
) -> Result<(Vec<FileDetectionRecord>, Vec<String>, Gate)> {
    let calibration = load_calibration(dataset, config, None)?;
    let (species, gate) = allowed_species(&calibration, species_precision);
    let corpus = load_corpus(&dataset.corpus)?;
    Ok((corpus, species, gate))
}

fn as_strs(species: &[String]) -> Vec<&str> {
    species.iter().map(String::as_str).collect()
}

fn handle_diurnal(
    dataset: &DatasetConfig,
    config: &Config,
    sink: &ReportSink,
    species_precision: f64,
) -> Result<()> {
    let offset = dataset_offset(dataset)?;
    let (corpus, species, gate) = load_allowed(dataset, config, species_precision)?;
    let valid = filter(&corpus, &gate);

    let profiles = stats::diurnal_profiles(&valid, &as_strs(&species), offset);
    let rows: Vec<stats::DiurnalRow> = profiles
        .iter()
        .flat_map(stats::DiurnalProfile::rows)
        .collect();
    sink.write_for(dataset, report_names::DIURNAL, &rows)?;
    Ok(())
}

fn load_site_join(
    dataset: &DatasetConfig,
    corpus: &[FileDetectionRecord],
) -> Result<sites::SiteJoin> {
    let path = dataset
        .site_info
        .as_deref()
        .ok_or_else(|| Error::SiteInfoMissing {
            name: dataset.short_name.clone(),
        })?;
    let metadata = sites::read_site_info(path)?;
    Ok(sites::join_sites(corpus, &metadata))
}

fn handle_habitat(
    dataset: &DatasetConfig,
    config: &Config,
    sink: &ReportSink,
    species_precision: f64,
) -> Result<()> {
    let (corpus, _, gate) = load_allowed(dataset, config, species_precision)?;
    let join = load_site_join(dataset, &corpus)?;

    let habitats = stats::habitat_richness(&corpus, &join, &gate);
    for habitat in &habitats {
        info!(
            "{}: {} sites, {} files",
            habitat.habitat,
            habitat.sites,
            habitat.file_detections.len()
        );
    }

    let rows: Vec<stats::HabitatRow> = habitats.iter().map(stats::HabitatRichness::row).collect();
    let days: Vec<&stats::HabitatDay> = habitats.iter().flat_map(|h| &h.days).collect();
    sink.write_for(dataset, report_names::HABITAT, &rows)?;
    sink.write_for(dataset, report_names::HABITAT_DAILY, &days)?;
    Ok(())
}

fn handle_habitat_activity(
    dataset: &DatasetConfig,
    config: &Config,
    sink: &ReportSink,
    species: &str,
) -> Result<()> {
    let calibration = load_calibration(dataset, config, None)?;
    if calibration.get(species).is_none() {
        warn!(
            "{}: '{species}' has no calibrated threshold; no detections will pass",
            dataset.name
        );
    }
    let corpus = load_corpus(&dataset.corpus)?;
    let join = load_site_join(dataset, &corpus)?;

    let habitats = stats::habitat_activity(
        &corpus,
        &join,
        species,
        &calibration.gate(None),
        dataset.minutes_per_file,
    );
    let rows: Vec<stats::HabitatActivityRow> =
        habitats.iter().map(stats::HabitatActivity::row).collect();
    sink.write_for(dataset, report_names::HABITAT_ACTIVITY, &rows)?;
    Ok(())
}

fn handle_latitudinal(
    dataset: &DatasetConfig,
    config: &Config,
    sink: &ReportSink,
    species: &str,
    (start, end): (NaiveDate, NaiveDate),
) -> Result<()> {
    if end < start {
        return Err(Error::InvalidDateWindow { start, end });
    }

    let corpus = load_corpus(&dataset.corpus)?;
    let valid = filter(&corpus, &Gate::Global(config.report.global_confidence));

    let matrix = stats::latitudinal_arrival(&valid, species, start, end);
    info!(
        "{}: {} regions with '{species}' between {start} and {end}",
        dataset.name,
        matrix.regions.len()
    );
    sink.write_for(dataset, report_names::LATITUDINAL, &matrix.rows())?;
    Ok(())
}

fn handle_seasonal(
    dataset: &DatasetConfig,
    config: &Config,
    sink: &ReportSink,
    window: usize,
    species_precision: f64,
) -> Result<()> {
    let (corpus, species, gate) = load_allowed(dataset, config, species_precision)?;
    let valid = filter(&corpus, &gate);

    let matrix = stats::seasonal_occurrence(&valid, &as_strs(&species), window);
    info!(
        "{}: {} species over {} observed days",
        dataset.name,
        matrix.species.len(),
        matrix.days.len()
    );
    sink.write_for(dataset, report_names::SEASONAL, &matrix.rows())?;
    Ok(())
}

fn handle_config_command(action: ConfigAction, explicit: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = config::resolve_config_path(explicit)?;
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                config::save_config(&Config::default(), &path)?;
                println!("Created configuration file: {}", path.display());
                println!("\nNext steps:");
                println!("  Add a [[datasets]] entry with short_name, name, minutes_per_file,");
                println!("  corpus and annotations, then run: birdstats calibrate <short_name>");
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_config(explicit)?;
            println!("{config:#?}");
            Ok(())
        }
        ConfigAction::Path => {
            let path = config::resolve_config_path(explicit)?;
            println!("{}", path.display());
            Ok(())
        }
    }
}
