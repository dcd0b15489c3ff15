use crate::config::{CliOverrides, Config};
use crate::error::Result;
use crate::export::ExportFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "slidesurvey")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Turn landslide field-survey XML into spreadsheets and map markers")]
#[command(
    long_about = "slidesurvey reads field-survey XML files, extracts every observation \
                  with its GPS fix, survey parameters and photos, and writes them to \
                  Excel workbooks or single-point KML/KMZ markers."
)]
#[command(after_help = "EXAMPLES:\n  \
    slidesurvey inspect surveys/\n  \
    slidesurvey export day1.xml day2.xml -o out/observations.xlsx\n  \
    slidesurvey export surveys/ --format flat --columns seqno,lat,lon,type_landslide\n  \
    slidesurvey export surveys/ --rows 0,2,5 --force\n  \
    slidesurvey marker --lat 12.9 --lon 77.5 --name \"Site 4\" --kmz\n  \
    slidesurvey marker --from day1.xml --seqno 3")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Write a sample configuration file and exit")]
    pub generate_config: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the observations found in the inputs, with any parse diagnostics
    Inspect(InspectArgs),
    /// Write the observations to an Excel workbook
    Export(ExportArgs),
    /// Write a single-point KML or KMZ marker
    Marker(MarkerArgs),
}

/// Input selection shared by `inspect` and `export`.
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Survey XML files or directories to scan
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// File extensions picked up when scanning directories (comma-separated)
    #[arg(long)]
    pub extensions: Option<String>,

    /// Directories to skip while scanning
    #[arg(short, long, value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    /// Maximum input file size (e.g. 512KB, 20MB)
    #[arg(long, value_parser = parse_size_string)]
    pub max_size: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Workbook to write (defaults to the configured output directory and name)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Workbook layout
    #[arg(short, long, value_enum)]
    pub format: Option<ExportFormat>,

    /// Observations to export, by 0-based position (e.g. 0,2,5; empty for none)
    #[arg(long, value_parser = parse_row_selection)]
    pub rows: Option<RowSelection>,

    /// Columns kept by the flat layout (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub columns: Option<Vec<String>>,

    /// Also write a JSON report next to the workbook
    #[arg(long)]
    pub report: bool,

    /// Overwrite an existing workbook
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct MarkerArgs {
    /// Latitude in decimal degrees, written as given
    #[arg(long, requires = "lon", allow_negative_numbers = true, value_parser = parse_coordinate)]
    pub lat: Option<String>,

    /// Longitude in decimal degrees, written as given
    #[arg(long, requires = "lat", allow_negative_numbers = true, value_parser = parse_coordinate)]
    pub lon: Option<String>,

    /// Take the position from an observation in this survey file
    #[arg(long, conflicts_with_all = ["lat", "lon"], required_unless_present = "lat")]
    pub from: Option<PathBuf>,

    /// Observation to use with --from (defaults to the first one with coordinates)
    #[arg(long, requires = "from", conflicts_with_all = ["lat", "lon"])]
    pub seqno: Option<String>,

    /// Placemark name
    #[arg(long)]
    pub name: Option<String>,

    /// Placemark description
    #[arg(long)]
    pub description: Option<String>,

    /// Marker file to write
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write a zipped KMZ instead of plain KML
    #[arg(long)]
    pub kmz: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

/// Explicit list of observation positions from `--rows`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowSelection(pub Vec<usize>);

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        let (input, export) = match &self.command {
            Some(Command::Inspect(args)) => (Some(&args.input), None),
            Some(Command::Export(args)) => (Some(&args.input), Some(args)),
            Some(Command::Marker(_)) | None => (None, None),
        };

        let mut overrides = CliOverrides::new();
        if let Some(input) = input {
            overrides = overrides
                .with_extensions(input.extensions.clone())
                .with_exclude(input.exclude.clone())
                .with_max_file_size(input.max_size);
        }
        if let Some(export) = export {
            overrides = overrides
                .with_format(export.format)
                .with_columns(export.columns.clone())
                .with_write_report(export.report.then_some(true));
        }
        overrides
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose > 0 && !self.quiet
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Default `tracing` filter directive for the chosen verbosity.
    pub fn log_directive(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

pub fn parse_row_selection(s: &str) -> std::result::Result<RowSelection, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(RowSelection::default());
    }

    trimmed
        .split(',')
        .map(|part| {
            let part = part.trim();
            part.parse::<usize>()
                .map_err(|_| format!("Invalid row index: '{}'", part))
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(RowSelection)
}

/// Accepts a decimal number and keeps its original spelling.
pub fn parse_coordinate(s: &str) -> std::result::Result<String, String> {
    let trimmed = s.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(|_| trimmed.to_string())
        .ok_or_else(|| format!("Invalid coordinate: '{}'", s))
}

pub fn parse_size_string(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim().to_lowercase();

    let (number_str, multiplier) = if s.ends_with("kb") || s.ends_with('k') {
        (s.trim_end_matches("kb").trim_end_matches('k'), 1024)
    } else if s.ends_with("mb") || s.ends_with('m') {
        (s.trim_end_matches("mb").trim_end_matches('m'), 1024 * 1024)
    } else if s.ends_with("gb") || s.ends_with('g') {
        (
            s.trim_end_matches("gb").trim_end_matches('g'),
            1024 * 1024 * 1024,
        )
    } else if s.ends_with('b') {
        (s.trim_end_matches('b'), 1)
    } else {
        (s.as_str(), 1)
    };

    let number: f64 = number_str
        .parse()
        .map_err(|_| format!("Invalid number format: {}", number_str))?;

    if number < 0.0 {
        return Err("Size cannot be negative".to_string());
    }

    Ok((number * multiplier as f64) as u64)
}
