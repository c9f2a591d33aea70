use std::path::{Path, PathBuf};

/// Extract the 4-digit year prefix from a raster file name (e.g. `2010LCT.tif` -> 2010)
pub fn year_from_filename(file_name: &str) -> Option<i32> {
    let prefix = file_name.get(..4)?;
    if !prefix.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    prefix.parse::<i32>().ok()
}

/// Base name of a path, used as the label of time series and stats rows
pub fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Default CSV path inside the output directory: `{output_dir}/{stem}.csv`
pub fn default_csv_path(output_dir: &Path, stem: &str) -> PathBuf {
    output_dir.join(format!("{}.csv", stem))
}

/// CSV path for one group of a grouped report: `{output_dir}/{title} (Group N)_stats.csv`
pub fn group_stats_path(output_dir: &Path, title: &str, group_index: usize) -> PathBuf {
    output_dir.join(format!("{} (Group {})_stats.csv", title, group_index + 1))
}

/// Histogram CSV path for a raster: `{dir}/{file name}_hist.csv`
pub fn histogram_path(dir: &Path, raster: &Path) -> PathBuf {
    dir.join(format!("{}_hist.csv", file_label(raster)))
}
