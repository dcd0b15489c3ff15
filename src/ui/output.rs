use crate::error::{SurveyError, UserFriendlyError};
use crate::export::{ExportReport, PointMarker};
use crate::extractor::{ExtractionBatch, ObservationRecord};
use console::{style, Emoji, Term};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

impl OutputMode {
    pub fn from_string(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputMode::Json,
            "plain" => OutputMode::Plain,
            _ => OutputMode::Human,
        }
    }
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");
static PIN: Emoji = Emoji("📍 ", "@ ");

pub struct OutputFormatter {
    #[allow(dead_code)]
    term: Term,
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let term = Term::stdout();
        let use_colors = match mode {
            OutputMode::Human => term.features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            term,
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Success, message),
            OutputMode::Json => self.print_json_message("success", message),
            OutputMode::Plain => println!("SUCCESS: {}", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => eprintln!("WARNING: {}", message),
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn debug(&self, message: &str) {
        if self.should_show_message(2) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("  {}", style(message).dim());
                    } else {
                        println!("  DEBUG: {}", message);
                    }
                }
                OutputMode::Json => self.print_json_message("debug", message),
                OutputMode::Plain => println!("DEBUG: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", ROCKET, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &SurveyError) {
        let user_message = error.user_message();
        self.error(&user_message);

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    eprintln!();
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(&format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => {
                    eprintln!("SUGGESTION: {}", suggestion);
                }
            }
        }
    }

    /// Per-file extraction problems. Shown unless quiet.
    pub fn print_diagnostics(&self, errors: &[String]) {
        if errors.is_empty() || self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "diagnostics",
                    "errors": errors
                }));
            }
            _ => {
                for error in errors {
                    self.warning(error);
                }
            }
        }
    }

    pub fn print_extraction_summary(&self, batch: &ExtractionBatch) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => self.print_human_summary(batch),
            OutputMode::Json => self.print_json_summary(batch),
            OutputMode::Plain => self.print_plain_summary(batch),
        }
    }

    /// The `inspect` listing: one line per observation, or the full records
    /// in JSON mode.
    pub fn print_observations(&self, records: &[ObservationRecord]) {
        match self.mode {
            OutputMode::Json => {
                let json_output = serde_json::to_string_pretty(&serde_json::json!({
                    "type": "observations",
                    "records": records
                }))
                .unwrap_or_else(|_| "{}".to_string());
                println!("{}", json_output);
            }
            OutputMode::Plain => {
                for (index, record) in records.iter().enumerate() {
                    println!(
                        "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                        index,
                        record.source_file,
                        record.seqno,
                        record.featuretype,
                        record.lat,
                        record.lon,
                        record.photos.len()
                    );
                }
            }
            OutputMode::Human => {
                if records.is_empty() {
                    println!("No observations found.");
                    return;
                }
                for (index, record) in records.iter().enumerate() {
                    let position = if record.lat.is_empty() || record.lon.is_empty() {
                        "no coordinates".to_string()
                    } else {
                        format!("{}, {}", record.lat, record.lon)
                    };
                    let label = format!("[{}] #{}", index, display_or_dash(&record.seqno));
                    println!(
                        "{}  {}  {}  {} photo(s)  {}",
                        if self.use_colors {
                            style(label).bold().to_string()
                        } else {
                            label
                        },
                        display_or_dash(&record.featuretype),
                        position,
                        record.photos.len(),
                        if self.use_colors {
                            style(&record.source_file).dim().to_string()
                        } else {
                            record.source_file.clone()
                        }
                    );
                }
            }
        }
    }

    pub fn print_export_report(&self, report: &ExportReport) {
        match self.mode {
            OutputMode::Human => self.print_human_report(report),
            OutputMode::Json => {
                let json_output =
                    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string());
                println!("{}", json_output);
            }
            OutputMode::Plain => self.print_plain_report(report),
        }
    }

    pub fn print_marker(&self, marker: &PointMarker, path: &Path) {
        match self.mode {
            OutputMode::Human => {
                let message = format!(
                    "Marker '{}' at {}, {} written to {}",
                    marker.name,
                    marker.lat,
                    marker.lon,
                    path.display()
                );
                if self.use_colors {
                    println!("{}{}", PIN, style(message).green().bold());
                } else {
                    println!("@ {}", message);
                }
            }
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "marker",
                    "marker": marker,
                    "path": path,
                }));
            }
            OutputMode::Plain => {
                println!("MARKER: {}\t{}\t{}", marker.lat, marker.lon, path.display());
            }
        }
    }

    pub fn print_header(&self, title: &str) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                println!();
                if self.use_colors {
                    println!("{}", style(title).bold().cyan());
                } else {
                    println!("=== {} ===", title);
                }
                println!();
            }
            OutputMode::Json => {}
            OutputMode::Plain => {
                println!("=== {} ===", title);
            }
        }
    }

    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}", style("─".repeat(60)).dim());
                } else {
                    println!("{}", "-".repeat(60));
                }
            }
            OutputMode::Plain => {
                println!("{}", "-".repeat(60));
            }
            OutputMode::Json => {}
        }
    }

    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        #[allow(clippy::type_complexity)]
        let (emoji, color_fn): (Emoji, Box<dyn Fn(&str) -> console::StyledObject<&str>>) =
            match msg_type {
                MessageType::Success => (CHECKMARK, Box::new(|msg| style(msg).green().bold())),
                MessageType::Error => (CROSS, Box::new(|msg| style(msg).red().bold())),
                MessageType::Warning => (WARNING, Box::new(|msg| style(msg).yellow().bold())),
                MessageType::Info => (INFO, Box::new(|msg| style(msg).cyan())),
            };

        if self.use_colors {
            match msg_type {
                MessageType::Error | MessageType::Warning => {
                    eprintln!("{}{}", emoji, color_fn(message))
                }
                _ => println!("{}{}", emoji, color_fn(message)),
            }
        } else {
            let prefix = match msg_type {
                MessageType::Success => "✓",
                MessageType::Error => "✗",
                MessageType::Warning => "!",
                MessageType::Info => "i",
            };

            match msg_type {
                MessageType::Error | MessageType::Warning => eprintln!("{} {}", prefix, message),
                _ => println!("{} {}", prefix, message),
            }
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn highlight(&self, value: String) -> String {
        if self.use_colors {
            style(value).cyan().bold().to_string()
        } else {
            value
        }
    }

    fn print_human_summary(&self, batch: &ExtractionBatch) {
        println!();
        self.print_separator();

        if self.use_colors {
            println!("{} {}", style("Extraction completed!").green().bold(), CHECKMARK);
        } else {
            println!("✓ Extraction completed!");
        }

        println!();
        println!(
            "  Files processed: {}",
            self.highlight(batch.files_processed.to_string())
        );
        println!(
            "  Observations:    {}",
            self.highlight(batch.records.len().to_string())
        );
        println!(
            "  Photos:          {}",
            self.highlight(batch.photo_count().to_string())
        );
        println!(
            "  Coordinates:     {}",
            self.highlight(coordinate_check(
                batch.valid_coordinate_count(),
                batch.records.len()
            ))
        );
        println!(
            "  Time taken:      {}",
            self.highlight(format_duration(batch.elapsed()))
        );

        if !batch.errors.is_empty() {
            println!("  Diagnostics:     {}", batch.errors.len());
        }

        self.print_separator();
    }

    fn print_json_summary(&self, batch: &ExtractionBatch) {
        let summary = serde_json::json!({
            "type": "summary",
            "files_processed": batch.files_processed,
            "observations": batch.records.len(),
            "photos": batch.photo_count(),
            "valid_coordinates": batch.valid_coordinate_count(),
            "duration_ms": batch.elapsed().as_millis(),
            "errors": batch.errors.len(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        println!(
            "{}",
            serde_json::to_string(&summary).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn print_plain_summary(&self, batch: &ExtractionBatch) {
        println!("COMPLETED: Extraction");
        println!("Files processed: {}", batch.files_processed);
        println!("Observations: {}", batch.records.len());
        println!("Photos: {}", batch.photo_count());
        println!(
            "Coordinates: {}",
            coordinate_check(batch.valid_coordinate_count(), batch.records.len())
        );
        println!("Duration: {:?}", batch.elapsed());
        if !batch.errors.is_empty() {
            println!("Errors: {}", batch.errors.len());
        }
    }

    fn print_human_report(&self, report: &ExportReport) {
        self.print_header("Export Report");

        println!("Workbook: {}", report.output.display());
        println!("Layout: {}", report.format);
        println!(
            "Exported at: {}",
            report.exported_at.format("%Y-%m-%d %H:%M UTC")
        );
        println!(
            "Observations: {} of {} exported",
            report.summary.observations_exported, report.summary.observations_loaded
        );
        println!(
            "Coordinates: {}",
            coordinate_check(
                report.summary.valid_coordinates,
                report.summary.observations_loaded
            )
        );
        println!();

        if !report.source_files.is_empty() {
            println!("Source files:");
            for file in &report.source_files {
                println!("  {}", file);
            }
            println!();
        }

        if !report.errors.is_empty() {
            println!("Issues encountered:");
            for error in &report.errors {
                println!("  - {}", error);
            }
        }
    }

    fn print_plain_report(&self, report: &ExportReport) {
        println!("REPORT: Export completed");
        println!("Workbook: {}", report.output.display());
        println!("Layout: {}", report.format);
        println!("Observations: {}", report.summary.observations_exported);
        println!("Photos: {}", report.summary.photos);
        println!(
            "Coordinates: {}",
            coordinate_check(
                report.summary.valid_coordinates,
                report.summary.observations_loaded
            )
        );

        if !report.errors.is_empty() {
            println!("Errors: {}", report.errors.len());
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}

/// `"3/4 rows have numeric lat/lon"`
pub(crate) fn coordinate_check(valid: usize, total: usize) -> String {
    format!("{}/{} rows have numeric lat/lon", valid, total)
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

pub(crate) fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}
