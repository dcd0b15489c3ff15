use crate::config::InputConfig;
use crate::error::{Result, SurveyError};
use crate::scanner::file_filter::FileFilter;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Expands command-line inputs into the survey files to extract.
pub struct InputScanner {
    filter: FileFilter,
    max_depth: usize,
}

impl InputScanner {
    pub fn new(config: &InputConfig) -> Self {
        Self {
            filter: FileFilter::new(config),
            max_depth: config.max_depth,
        }
    }

    /// Files are taken as given; directories are scanned. Order follows
    /// `inputs`, with each directory's files sorted by path.
    pub fn collect_inputs<P: AsRef<Path>>(&self, inputs: &[P]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for input in inputs {
            let path = input.as_ref();
            if path.is_file() {
                files.push(path.to_path_buf());
            } else if path.is_dir() {
                files.extend(self.scan_directory(path)?);
            } else {
                return Err(SurveyError::InvalidPath {
                    path: format!("{} does not exist", path.display()),
                });
            }
        }

        if files.is_empty() {
            return Err(SurveyError::NoInputFiles {
                searched_extensions: self.filter.get_extensions().clone(),
            });
        }

        Ok(files)
    }

    pub fn scan_directory<P: AsRef<Path>>(&self, root: P) -> Result<Vec<PathBuf>> {
        let root_path = root.as_ref();

        if !root_path.is_dir() {
            return Err(SurveyError::InvalidPath {
                path: format!("{} is not a directory", root_path.display()),
            });
        }

        let mut files = Vec::new();

        let walker = WalkDir::new(root_path)
            .max_depth(self.max_depth)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| self.should_traverse(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("scan error under {}: {}", root_path.display(), err);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.filter.is_survey_file(entry.path()) {
                continue;
            }

            match entry.metadata() {
                Ok(metadata) if self.filter.is_size_allowed(metadata.len()) => {
                    files.push(entry.path().to_path_buf());
                }
                Ok(metadata) => {
                    debug!(
                        file = %entry.path().display(),
                        size = metadata.len(),
                        "skipping oversized file"
                    );
                }
                Err(err) => warn!("cannot stat {}: {}", entry.path().display(), err),
            }
        }

        files.sort();
        debug!(root = %root_path.display(), files = files.len(), "scanned directory");
        Ok(files)
    }

    fn should_traverse(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || entry.file_type().is_file() {
            return true;
        }

        if entry.file_type().is_dir() {
            return self.filter.should_traverse_directory(entry.path());
        }

        true
    }
}
