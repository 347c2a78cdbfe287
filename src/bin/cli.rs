//! trailsync CLI - photo track extraction and clock calibration
//!
//! Usage:
//!   trailsync-cli extract <local|drive|gpx> <input> <output.gpx> [--utc-offset <hours>]
//!   trailsync-cli calibrate <source.gpx> <reference.gpx> [--output <gpx>] [--residuals <json>]
//!
//! `extract` builds a GPX track from geotagged photos (a local directory or a
//! Google Drive folder) or from an existing GPX file. `calibrate` finds the
//! clock offset between a photo track and a reference GPS recording.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use serde::Serialize;
use trailsync::extract::photos::LocalPhotos;
use trailsync::extract::track_file::TrackFile;
use trailsync::{
    Calibration, CalibrationConfig, ErrorSample, PointSource, TrailError, UtcOffsetHours,
    calibrate, error_samples, load_gpx_file, resample, save_gpx_file,
};

#[derive(Parser)]
#[command(name = "trailsync-cli")]
#[command(about = "Geotagged photo tracks and GPS clock calibration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceKind {
    /// Directory of photos with EXIF GPS tags
    Local,
    /// Google Drive folder, by unique name
    Drive,
    /// Existing GPX file
    Gpx,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a GPX track from photos or a GPX file
    Extract {
        #[arg(value_enum)]
        kind: SourceKind,

        /// Directory, folder name or GPX file
        input: String,

        /// GPX file to write
        output: PathBuf,

        /// Whole-hour UTC offset of the camera clock (e.g. -4)
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        utc_offset: i8,

        /// OAuth access token for Google Drive
        #[arg(long, env = "DRIVE_ACCESS_TOKEN", hide_env_values = true)]
        access_token: Option<String>,
    },

    /// Find the clock offset between a source track and a reference track
    Calibrate {
        /// Track to correct (e.g. extracted from photos)
        source: PathBuf,

        /// Trusted GPS recording
        reference: PathBuf,

        /// Write the corrected source track here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write per-second residuals at the best offset as JSON
        #[arg(short, long)]
        residuals: Option<PathBuf>,

        /// Calibration config (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            kind,
            input,
            output,
            utc_offset,
            access_token,
        } => run_extract(kind, &input, &output, utc_offset, access_token),
        Commands::Calibrate {
            source,
            reference,
            output,
            residuals,
            config,
        } => run_calibrate(
            &source,
            &reference,
            output.as_deref(),
            residuals.as_deref(),
            config.as_deref(),
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_extract(
    kind: SourceKind,
    input: &str,
    output: &Path,
    utc_offset: i8,
    access_token: Option<String>,
) -> Result<(), TrailError> {
    let utc_offset = UtcOffsetHours::new(utc_offset)?;

    let source: Box<dyn PointSource> = match kind {
        SourceKind::Local => Box::new(LocalPhotos::new(input, utc_offset)),
        SourceKind::Gpx => Box::new(TrackFile::new(input)),
        SourceKind::Drive => drive_source(input, utc_offset, access_token)?,
    };

    let extraction = source.extract()?;
    println!("{}", extraction.report);

    save_gpx_file(output, &extraction.series)?;
    println!(
        "Wrote {} points to {}",
        extraction.series.len(),
        output.display()
    );
    Ok(())
}

#[cfg(feature = "drive")]
fn drive_source(
    folder: &str,
    utc_offset: UtcOffsetHours,
    access_token: Option<String>,
) -> Result<Box<dyn PointSource>, TrailError> {
    use trailsync::extract::drive::{DriveCatalog, DrivePhotos};

    let token = access_token.ok_or_else(|| {
        TrailError::InvalidConfig(
            "a Drive access token is required (--access-token or DRIVE_ACCESS_TOKEN)".to_string(),
        )
    })?;
    Ok(Box::new(DrivePhotos::new(
        DriveCatalog::new(token),
        folder,
        utc_offset,
    )))
}

#[cfg(not(feature = "drive"))]
fn drive_source(
    _folder: &str,
    _utc_offset: UtcOffsetHours,
    _access_token: Option<String>,
) -> Result<Box<dyn PointSource>, TrailError> {
    Err(TrailError::InvalidConfig(
        "built without the `drive` feature".to_string(),
    ))
}

/// Residual dump written by `calibrate --residuals`.
#[derive(Serialize)]
struct ResidualReport<'a> {
    offset_s: i64,
    mean_error_m: f64,
    baseline_mean_error_m: Option<f64>,
    skipped_samples: usize,
    samples: &'a [ErrorSample],
}

fn load_config(path: Option<&Path>) -> Result<CalibrationConfig, TrailError> {
    let Some(path) = path else {
        return Ok(CalibrationConfig::default());
    };
    let file = File::open(path)?;
    let config: CalibrationConfig = serde_json::from_reader(BufReader::new(file))?;
    info!("Loaded calibration config from {}", path.display());
    Ok(config)
}

fn run_calibrate(
    source_path: &Path,
    reference_path: &Path,
    output: Option<&Path>,
    residuals: Option<&Path>,
    config: Option<&Path>,
) -> Result<(), TrailError> {
    let config = load_config(config)?;
    let source = load_gpx_file(source_path)?;
    let reference = load_gpx_file(reference_path)?;

    println!("\n{}", "=".repeat(60));
    println!("Source:    {} ({} points)", source_path.display(), source.len());
    println!(
        "Reference: {} ({} points)",
        reference_path.display(),
        reference.len()
    );
    println!("{}", "=".repeat(60));

    let calibration = calibrate(&source, &reference, &config)?;
    print_summary(&calibration);

    if let Some(path) = output {
        save_gpx_file(path, &calibration.apply(&source))?;
        println!("Corrected track: {}", path.display());
    }

    if let Some(path) = residuals {
        let (samples, skipped) = error_samples(
            &resample(&source),
            &resample(&reference),
            &calibration.metric,
            calibration.best_offset_s,
        );
        let report = ResidualReport {
            offset_s: calibration.best_offset_s,
            mean_error_m: calibration.best_mean_error_m,
            baseline_mean_error_m: calibration.baseline_mean_error_m,
            skipped_samples: skipped,
            samples: &samples,
        };
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &report)?;
        writer.flush()?;
        println!("Residuals: {} ({} samples)", path.display(), samples.len());
    }

    Ok(())
}

fn print_summary(calibration: &Calibration) {
    let (min, max) = calibration.search_range;
    println!("Offsets searched: [{}, {}]", min, max);
    match calibration.baseline_mean_error_m {
        Some(baseline) => println!("Baseline error:   {:.2} m", baseline),
        None => println!("Baseline error:   n/a (no overlap without shift)"),
    }
    println!(
        "Calibrated error: {:.2} m @ offset {} s",
        calibration.best_mean_error_m, calibration.best_offset_s
    );
    if let Some(pct) = calibration.improvement_percent() {
        println!("Reduction:        {:.2}%", pct);
    }
    println!(
        "Matched samples:  {} of {}",
        calibration.best_stats.matched_count(),
        calibration.best_stats.sample_count
    );
}
