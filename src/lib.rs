//! xodr-transform: move an OpenDRIVE road network onto a new origin.
//!
//! An OpenDRIVE map mixes absolute WGS84 positions (`lat`/`lon`) with local
//! planar geometry (`x`/`y`/`hdg`) relative to the projection origin in
//! `header/geoReference`. This crate re-centres such a map on a different
//! origin and optionally rotates it, keeping both kinds of geometry
//! consistent.
//!
//! # Modules
//!
//! - [`geo`]: Origin descriptor codec, projection and rotation primitives
//! - [`transform`]: The per-document transform and its report
//! - [`xodr`]: Reading, splicing and atomically writing documents
//! - [`error`]: Error types for xodr-transform operations

pub mod error;
pub mod geo;
pub mod transform;
pub mod xodr;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

pub use error::{Stage, XodrError};
pub use transform::{transform_document, transform_file, TransformOptions, TransformRequest};

/// The xodr-transform CLI application.
#[derive(Parser)]
#[command(name = "xodr-transform")]
#[command(version, author, about)]
struct Cli {
    /// Input OpenDRIVE (.xodr) file.
    input: PathBuf,

    /// Output file to write the transformed map to.
    output: PathBuf,

    /// New origin latitude in degrees (requires --lon).
    #[arg(long, env = "XODR_NEW_LAT", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// New origin longitude in degrees (requires --lat).
    #[arg(long, env = "XODR_NEW_LON", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Rotation angle in degrees, counter-clockwise.
    #[arg(
        long,
        env = "XODR_ROTATION_DEG",
        default_value_t = 0.0,
        allow_negative_numbers = true
    )]
    rotate: f64,

    /// Wrap rotated headings into [0, 2pi).
    #[arg(long)]
    normalize_heading: bool,

    /// Overwrite the output file if it exists.
    #[arg(long)]
    force: bool,

    /// Summary format printed after a successful run.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Output format for the run summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
    /// Print nothing on success.
    Quiet,
}

/// Run the xodr-transform CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), XodrError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let request = TransformRequest::from_parts(cli.lat, cli.lon, cli.rotate, cli.normalize_heading)
        .map_err(|err| err.in_stage(Stage::Initialized))?;
    let options = TransformOptions {
        overwrite: cli.force,
    };

    let report = transform_file(&cli.input, &cli.output, &request, &options)?;

    match cli.report {
        ReportFormat::Text => print!("{}", report),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        ReportFormat::Quiet => {}
    }

    Ok(())
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks warn, info or debug.
pub fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("xodr_transform={default_level}")));

    // A subscriber may already be installed (e.g. in tests); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
