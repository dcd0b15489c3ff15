use thiserror::Error;

#[derive(Error, Debug)]
pub enum SurveyError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spreadsheet write failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Archive write failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("No survey XML files found")]
    NoInputFiles { searched_extensions: Vec<String> },

    #[error("Row index {index} is out of range ({len} observations loaded)")]
    RowOutOfRange { index: usize, len: usize },

    #[error("Unknown column: {name}")]
    UnknownColumn { name: String },

    #[error("No usable coordinates: {message}")]
    MissingCoordinates { message: String },

    #[error("Output file already exists: {path}")]
    OutputExists { path: String },

    #[error("Serialization failed: {message}")]
    Serialization { message: String },
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for SurveyError {
    fn user_message(&self) -> String {
        match self {
            SurveyError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            SurveyError::InvalidPath { path } => {
                format!("Invalid file path: {}", path)
            }
            SurveyError::NoInputFiles {
                searched_extensions,
            } => {
                format!(
                    "No survey files found with extensions: {}",
                    searched_extensions.join(", ")
                )
            }
            SurveyError::RowOutOfRange { index, len } => {
                format!(
                    "Row {} was selected but only {} observations were loaded",
                    index, len
                )
            }
            SurveyError::UnknownColumn { name } => {
                format!("Column '{}' is not part of the observation table", name)
            }
            SurveyError::MissingCoordinates { message } => {
                format!("Cannot place a marker: {}", message)
            }
            SurveyError::OutputExists { path } => {
                format!("Output file already exists: {}", path)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            SurveyError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present.".to_string()
            ),
            SurveyError::NoInputFiles { .. } => Some(
                "Pass one or more .xml files, or a directory containing them. Use the [input] section of the configuration to change accepted extensions.".to_string()
            ),
            SurveyError::RowOutOfRange { .. } => Some(
                "Row indices start at 0. Run the inspect command to list loaded observations.".to_string()
            ),
            SurveyError::UnknownColumn { .. } => Some(
                "Run the inspect command with --output-format json to see the available column names.".to_string()
            ),
            SurveyError::MissingCoordinates { .. } => Some(
                "Pass --lat and --lon explicitly, or pick an observation whose featurecoords holds two values.".to_string()
            ),
            SurveyError::OutputExists { .. } => Some(
                "Choose a different output path with --output, or use --force to overwrite.".to_string()
            ),
            SurveyError::Io(_) | SurveyError::Xlsx(_) | SurveyError::Zip(_) => Some(
                "Ensure the destination directory is writable and the file is not open in another program.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for SurveyError {
    fn from(error: toml::de::Error) -> Self {
        SurveyError::Config {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for SurveyError {
    fn from(error: serde_json::Error) -> Self {
        SurveyError::Serialization {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SurveyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_friendly_messages() {
        let error = SurveyError::RowOutOfRange { index: 7, len: 3 };
        assert!(error.user_message().contains("Row 7"));
        assert!(error.suggestion().is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let survey_error = SurveyError::from(io_error);
        assert!(matches!(survey_error, SurveyError::Io(_)));
        assert!(survey_error.suggestion().is_some());
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_error = toml::from_str::<toml::Value>("not = [valid").unwrap_err();
        let survey_error = SurveyError::from(toml_error);
        assert!(matches!(survey_error, SurveyError::Config { .. }));
    }
}
