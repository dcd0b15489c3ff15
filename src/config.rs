use crate::error::{Result, SurveyError};
use crate::export::ExportFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub input: InputConfig,
    pub export: ExportConfig,
    pub marker: MarkerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    pub extensions: Vec<String>,
    pub max_file_size: u64,
    pub exclude_dirs: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub max_depth: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    pub format: ExportFormat,
    pub output_directory: PathBuf,
    pub workbook_name: String,
    /// Columns kept by the flat export; empty keeps all of them.
    pub columns: Vec<String>,
    pub write_report: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarkerConfig {
    pub default_name: String,
    pub kmz: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["xml".to_string()],
            max_file_size: 50 * 1024 * 1024, // 50MB
            exclude_dirs: vec![
                ".git".to_string(),
                "target".to_string(),
                "node_modules".to_string(),
                "__pycache__".to_string(),
            ],
            exclude_patterns: vec![r".*~$".to_string(), r".*\.bak\.xml$".to_string()],
            max_depth: 10,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Dropdown,
            output_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            workbook_name: "observations.xlsx".to_string(),
            columns: Vec::new(),
            write_report: false,
        }
    }
}

impl ExportConfig {
    /// A column selection is set but the layout does not use one.
    pub fn ignores_columns(&self) -> bool {
        !self.columns.is_empty() && self.format != ExportFormat::Flat
    }
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            default_name: "Landslide".to_string(),
            kmz: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SurveyError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| SurveyError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| SurveyError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["slidesurvey.toml", ".slidesurvey.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref extensions) = cli_args.extensions {
            self.input.extensions = extensions
                .split(',')
                .map(|s| s.trim().trim_start_matches('.').to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(ref exclude) = cli_args.exclude {
            self.input.exclude_dirs.extend(exclude.clone());
        }

        if let Some(max_size) = cli_args.max_file_size {
            self.input.max_file_size = max_size;
        }

        if let Some(ref output_dir) = cli_args.output_directory {
            self.export.output_directory = output_dir.clone();
        }

        if let Some(format) = cli_args.format {
            self.export.format = format;
        }

        if let Some(ref columns) = cli_args.columns {
            self.export.columns = columns.clone();
        }

        if let Some(write_report) = cli_args.write_report {
            self.export.write_report = write_report;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.input.extensions.is_empty() {
            return Err(SurveyError::Config {
                message: "At least one input file extension must be specified".to_string(),
            });
        }

        if self.input.max_file_size == 0 {
            return Err(SurveyError::Config {
                message: "Maximum file size must be greater than 0".to_string(),
            });
        }

        if self.input.max_depth == 0 {
            return Err(SurveyError::Config {
                message: "Maximum directory depth must be greater than 0".to_string(),
            });
        }

        if self.export.workbook_name.trim().is_empty() {
            return Err(SurveyError::Config {
                message: "Workbook name must not be empty".to_string(),
            });
        }

        for pattern in &self.input.exclude_patterns {
            if let Err(e) = regex::Regex::new(pattern) {
                return Err(SurveyError::Config {
                    message: format!("Invalid exclude pattern '{}': {}", pattern, e),
                });
            }
        }

        Ok(())
    }

    /// Default workbook location when no explicit output path is given.
    pub fn default_workbook_path(&self) -> PathBuf {
        self.export.output_directory.join(&self.export.workbook_name)
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub extensions: Option<String>,
    pub exclude: Option<Vec<String>>,
    pub max_file_size: Option<u64>,
    pub output_directory: Option<PathBuf>,
    pub format: Option<ExportFormat>,
    pub columns: Option<Vec<String>>,
    pub write_report: Option<bool>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extensions(mut self, extensions: Option<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_exclude(mut self, exclude: Option<Vec<String>>) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn with_max_file_size(mut self, max_size: Option<u64>) -> Self {
        self.max_file_size = max_size;
        self
    }

    pub fn with_output_directory(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_directory = output_dir;
        self
    }

    pub fn with_format(mut self, format: Option<ExportFormat>) -> Self {
        self.format = format;
        self
    }

    pub fn with_columns(mut self, columns: Option<Vec<String>>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_write_report(mut self, write_report: Option<bool>) -> Self {
        self.write_report = write_report;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.input.extensions, vec!["xml"]);
        assert_eq!(config.export.format, ExportFormat::Dropdown);
        assert_eq!(config.export.workbook_name, "observations.xlsx");
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.input.extensions.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.input.exclude_patterns.push("(unclosed".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_operations() {
        let mut config = Config::default();
        config.export.format = ExportFormat::Multisheet;
        config.export.write_report = true;
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded_config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(loaded_config.export.format, ExportFormat::Multisheet);
        assert!(loaded_config.export.write_report);
        assert_eq!(loaded_config.input.max_depth, config.input.max_depth);
    }

    #[test]
    fn test_column_selection_only_used_by_flat() {
        let mut export = ExportConfig::default();
        assert!(!export.ignores_columns());

        export.columns = vec!["seqno".to_string()];
        export.format = ExportFormat::Flat;
        assert!(!export.ignores_columns());

        export.format = ExportFormat::Multisheet;
        assert!(export.ignores_columns());
        export.format = ExportFormat::Dropdown;
        assert!(export.ignores_columns());
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = Config::default();

        let overrides = CliOverrides::new()
            .with_extensions(Some(".XML, svy".to_string()))
            .with_format(Some(ExportFormat::Flat))
            .with_columns(Some(vec!["seqno".to_string(), "lat".to_string()]));

        config.merge_with_cli_args(&overrides);

        assert_eq!(config.input.extensions, vec!["xml", "svy"]);
        assert_eq!(config.export.format, ExportFormat::Flat);
        assert_eq!(config.export.columns, vec!["seqno", "lat"]);
    }

    #[test]
    fn test_sample_config_generation() {
        let sample = Config::create_sample_config();
        assert!(sample.contains("[input]"));
        assert!(sample.contains("[export]"));
        assert!(sample.contains("[marker]"));
        assert!(sample.contains("format = \"dropdown\""));
    }
}
