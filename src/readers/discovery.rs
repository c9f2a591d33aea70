use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::utils::constants::RASTER_EXTENSIONS;
use crate::utils::filename::year_from_filename;

/// A raster file whose name carries a year prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetFile {
    pub year: i32,
    pub path: PathBuf,
}

/// Finds year-prefixed rasters (`YYYYsuffix.tif`) in one dataset directory
pub struct DatasetScanner {
    name_filter: Option<String>,
}

impl DatasetScanner {
    pub fn new() -> Self {
        Self { name_filter: None }
    }

    /// Only keep files whose name contains `pattern` (e.g. `LCT`)
    pub fn with_name_filter(mut self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        self.name_filter = if pattern.is_empty() {
            None
        } else {
            Some(pattern)
        };
        self
    }

    /// Scan `dir`, returning files sorted lexically by path
    pub fn scan(&self, dir: &Path) -> Result<Vec<DatasetFile>> {
        if !dir.is_dir() {
            return Err(ProcessingError::MissingData(format!(
                "Dataset directory not found: {}",
                dir.display()
            )));
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || !is_raster(&path) {
                continue;
            }

            let file_name = path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default();

            if let Some(ref pattern) = self.name_filter {
                if !file_name.contains(pattern.as_str()) {
                    continue;
                }
            }

            match year_from_filename(&file_name) {
                Some(year) => files.push(DatasetFile { year, path }),
                None => debug!(file = %file_name, "skipping raster without year prefix"),
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    /// All rasters in `dir`, sorted, year prefix not required
    pub fn scan_any(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && is_raster(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

impl Default for DatasetScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn is_raster(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            RASTER_EXTENSIONS
                .iter()
                .any(|known| e.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}
