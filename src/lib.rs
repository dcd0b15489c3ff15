pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod extractor;
pub mod scanner;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, Command, OutputFormat, RowSelection};
pub use config::{CliOverrides, Config, ExportConfig, InputConfig, MarkerConfig};
pub use error::{Result, SurveyError, UserFriendlyError};

pub use export::{ExportFormat, ExportReport, PointMarker};
pub use extractor::{
    extract_files, ExtractionBatch, FieldExtractor, ObservationRecord, ParamField, PhotoRecord,
};
pub use scanner::{FileFilter, InputScanner};
pub use ui::{OutputFormatter, OutputMode, ProgressManager};

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Options of one `export` run that do not live in [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    /// Workbook path; the configured default when `None`.
    pub output: Option<PathBuf>,
    /// Observation positions to export; all of them when `None`.
    pub rows: Option<Vec<usize>>,
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerSource {
    /// Coordinate text as typed; written unchanged once validated.
    Point { lat: String, lon: String },
    /// An observation of a survey file, by seqno or the first one with
    /// usable coordinates.
    Observation { file: PathBuf, seqno: Option<String> },
}

#[derive(Debug, Clone)]
pub struct MarkerRequest {
    pub source: MarkerSource,
    pub name: Option<String>,
    pub description: Option<String>,
    pub output: Option<PathBuf>,
    pub kmz: bool,
}

/// Main library interface: ties configuration, extraction, export and
/// terminal output together.
pub struct SurveyTool {
    config: Config,
    extractor: FieldExtractor,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
}

impl SurveyTool {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);

        Self {
            config,
            extractor: FieldExtractor::new(),
            output_formatter,
            progress_manager,
        }
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Ok(Self::new(config, output_mode, cli_args.verbose, cli_args.quiet))
    }

    /// Scans `inputs` and extracts every survey file found, in order.
    pub fn load_observations<P: AsRef<Path>>(&self, inputs: &[P]) -> Result<ExtractionBatch> {
        self.output_formatter.start_operation("Scanning for survey files");

        let scanner = InputScanner::new(&self.config.input);
        let files = scanner.collect_inputs(inputs)?;
        self.output_formatter
            .info(&format!("Found {} survey files", files.len()));

        let file_progress = self.progress_manager.create_file_progress(files.len() as u64);
        let progress_callback = {
            let pb = file_progress.clone();
            move |batch: &ExtractionBatch| {
                ui::progress::update_file_progress(&pb, batch);
            }
        };

        let batch = extract_files(&self.extractor, &files, Some(&progress_callback));

        ui::progress::finish_progress_with_summary(
            &file_progress,
            &format!("Read {} observations", batch.records.len()),
            batch.elapsed(),
        );

        Ok(batch)
    }

    /// Extracts `inputs` and lists the observations and diagnostics.
    pub fn inspect<P: AsRef<Path>>(&self, inputs: &[P]) -> Result<ExtractionBatch> {
        let batch = self.load_observations(inputs)?;

        self.output_formatter.print_observations(&batch.records);
        self.output_formatter.print_diagnostics(&batch.errors);
        self.output_formatter.print_extraction_summary(&batch);

        Ok(batch)
    }

    /// Extracts `inputs` and writes them in the configured workbook layout.
    pub fn export<P: AsRef<Path>>(
        &self,
        inputs: &[P],
        request: &ExportRequest,
    ) -> Result<ExportReport> {
        let output = request
            .output
            .clone()
            .unwrap_or_else(|| self.config.default_workbook_path());

        if output.exists() && !request.force {
            return Err(SurveyError::OutputExists {
                path: output.display().to_string(),
            });
        }

        let batch = self.load_observations(inputs)?;
        self.progress_manager
            .suspend(|| self.output_formatter.print_diagnostics(&batch.errors));

        let exported = self.write_workbook(&batch.records, request.rows.as_deref(), &output)?;
        let report = ExportReport::new(output, self.config.export.format, &batch, exported);

        if self.config.export.write_report {
            let report_path = report.save_json(&report.sidecar_path())?;
            self.output_formatter
                .info(&format!("Report written to {}", report_path.display()));
        }

        self.output_formatter.success(&format!(
            "Exported {} observations to {}",
            exported,
            report.output.display()
        ));

        Ok(report)
    }

    /// Writes `records` to `path` and returns how many rows were exported.
    pub fn write_workbook(
        &self,
        records: &[ObservationRecord],
        rows: Option<&[usize]>,
        path: &Path,
    ) -> Result<usize> {
        let format = self.config.export.format;
        let spinner = self
            .progress_manager
            .create_spinner(&format!("Writing {} workbook", format));
        debug!(%format, path = %path.display(), "writing workbook");
        self.output_formatter
            .debug(&format!("Layout '{}' -> {}", format, path.display()));
        if self.config.export.ignores_columns() {
            warn!(%format, "column selection applies only to the flat layout");
            self.output_formatter.warning(&format!(
                "Column selection is ignored by the {} layout; all columns are written",
                format
            ));
        }

        let exported = match format {
            ExportFormat::Flat => {
                let selected = self.selected(records, rows)?;
                let table =
                    export::observation_table(&selected, self.config.export.columns.as_slice())?;
                export::export_flat(&table, path)?;
                selected.len()
            }
            ExportFormat::Multisheet => {
                let selected = self.selected(records, rows)?;
                export::export_multisheet(&selected, path)?;
                selected.len()
            }
            ExportFormat::Dropdown => {
                export::export_with_photo_dropdown(records, rows, path)?;
                rows.map_or(records.len(), <[usize]>::len)
            }
        };

        spinner.finish_and_clear();
        Ok(exported)
    }

    fn selected(
        &self,
        records: &[ObservationRecord],
        rows: Option<&[usize]>,
    ) -> Result<Vec<ObservationRecord>> {
        Ok(export::select_records(records, rows)?
            .into_iter()
            .cloned()
            .collect())
    }

    /// Builds the marker described by `request` and writes it as KML or KMZ.
    pub fn write_marker(&self, request: &MarkerRequest) -> Result<(PointMarker, PathBuf)> {
        let mut marker = match &request.source {
            MarkerSource::Point { lat, lon } => {
                PointMarker::checked(lat, lon, self.config.marker.default_name.clone(), "")
                    .ok_or_else(|| SurveyError::MissingCoordinates {
                        message: format!(
                            "lat '{}' / lon '{}' is not a position within [-90, 90] / [-180, 180]",
                            lat, lon
                        ),
                    })?
            }
            MarkerSource::Observation { file, seqno } => {
                self.marker_from_survey(file, seqno.as_deref())?
            }
        };

        if let Some(ref name) = request.name {
            marker.name = name.clone();
        } else if marker.name.is_empty() {
            marker.name = self.config.marker.default_name.clone();
        }
        if let Some(ref description) = request.description {
            marker.description = description.clone();
        }

        let kmz = request.kmz || self.config.marker.kmz;
        let path = request.output.clone().unwrap_or_else(|| {
            self.config
                .export
                .output_directory
                .join(marker.default_file_name(kmz))
        });

        let path = if kmz {
            marker.save_kmz(&path)?
        } else {
            marker.save_kml(&path)?
        };

        self.output_formatter.print_marker(&marker, &path);
        Ok((marker, path))
    }

    fn marker_from_survey(&self, file: &Path, seqno: Option<&str>) -> Result<PointMarker> {
        let extraction = self.extractor.extract(file);
        self.output_formatter.print_diagnostics(&extraction.errors);

        match seqno {
            Some(seqno) => {
                let record = extraction
                    .records
                    .iter()
                    .find(|r| r.seqno == seqno)
                    .ok_or_else(|| SurveyError::MissingCoordinates {
                        message: format!(
                            "no observation with seqno {} in {}",
                            seqno,
                            file.display()
                        ),
                    })?;
                PointMarker::from_record(record).ok_or_else(|| SurveyError::MissingCoordinates {
                    message: format!(
                        "observation {} has no usable coordinates (featurecoords '{}')",
                        seqno, record.featurecoords_raw
                    ),
                })
            }
            None => extraction
                .records
                .iter()
                .find_map(PointMarker::from_record)
                .ok_or_else(|| SurveyError::MissingCoordinates {
                    message: format!(
                        "no observation in {} has usable coordinates",
                        file.display()
                    ),
                }),
        }
    }

    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        info!(path = %output_path.as_ref().display(), "wrote sample configuration");
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn handle_error(&self, error: &SurveyError) {
        self.progress_manager.clear();
        self.output_formatter.print_user_friendly_error(error);
    }
}

pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
