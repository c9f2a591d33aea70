use csv::Writer;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{
    land_cover_columns, DifferenceCell, LandCoverRecord, RasterStats, RegionalRecord,
    TimeSeriesPoint,
};
use crate::power::PowerSeries;
use crate::processors::ValueHistogram;
use crate::utils::constants::DEFAULT_PRECISION;

pub const REGIONAL_HEADER: [&str; 5] = ["Year", "Overall", "South", "Center", "North"];
pub const STATS_HEADER: [&str; 5] = ["filename", "min", "max", "mean", "median"];
pub const TIME_SERIES_HEADER: [&str; 3] = ["Filename", "Year", "Mean"];
pub const DIFFERENCE_HEADER: [&str; 3] = ["Row", "Col", "Difference"];
pub const HISTOGRAM_HEADER: [&str; 3] = ["bin_start", "bin_end", "count"];

/// Writes analysis tables as CSV. Floats use a fixed number of decimals,
/// NaN is written as `NaN` and absent values as an empty field.
pub struct CsvReportWriter {
    precision: usize,
}

impl CsvReportWriter {
    pub fn new() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
        }
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn write_regional(&self, records: &[RegionalRecord], path: &Path) -> Result<()> {
        let mut writer = open(path)?;
        writer.write_record(REGIONAL_HEADER)?;
        for record in records {
            writer.write_record([
                record.year.to_string(),
                self.float(record.overall),
                self.float(record.south),
                self.float(record.center),
                self.float(record.north),
            ])?;
        }
        writer.flush()?;
        debug!(path = %path.display(), rows = records.len(), "wrote regional table");
        Ok(())
    }

    /// Land cover schema v1: `Year, Value_0 .. Value_16` followed by any other
    /// class id present in the records, ascending. Returns the class ids written.
    pub fn write_land_cover(&self, records: &[LandCoverRecord], path: &Path) -> Result<Vec<i64>> {
        let classes = land_cover_columns(records);

        let mut writer = open(path)?;
        let mut header = Vec::with_capacity(classes.len() + 1);
        header.push("Year".to_string());
        header.extend(classes.iter().map(|c| format!("Value_{}", c)));
        writer.write_record(&header)?;

        for record in records {
            let mut row = Vec::with_capacity(header.len());
            row.push(record.year.to_string());
            row.extend(classes.iter().map(|&c| record.count(c).to_string()));
            writer.write_record(&row)?;
        }
        writer.flush()?;
        debug!(path = %path.display(), classes = classes.len(), "wrote land cover table");
        Ok(classes)
    }

    pub fn write_raster_stats(&self, stats: &[RasterStats], path: &Path) -> Result<()> {
        let mut writer = open(path)?;
        writer.write_record(STATS_HEADER)?;
        for s in stats {
            writer.write_record([
                s.filename.clone(),
                self.optional(s.min),
                self.optional(s.max),
                self.optional(s.mean),
                self.optional(s.median),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_time_series(&self, points: &[TimeSeriesPoint], path: &Path) -> Result<()> {
        let mut writer = open(path)?;
        writer.write_record(TIME_SERIES_HEADER)?;
        for point in points {
            writer.write_record([
                point.label.clone(),
                point.year.map(|y| y.to_string()).unwrap_or_default(),
                self.float(point.mean),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Stream difference cells; stops after `max_rows` when given.
    /// Returns the number of rows written.
    pub fn write_difference_cells<I>(
        &self,
        cells: I,
        path: &Path,
        max_rows: Option<usize>,
    ) -> Result<usize>
    where
        I: IntoIterator<Item = DifferenceCell>,
    {
        let mut writer = open(path)?;
        writer.write_record(DIFFERENCE_HEADER)?;

        let mut written = 0usize;
        for cell in cells {
            if max_rows.is_some_and(|limit| written >= limit) {
                warn!(
                    path = %path.display(),
                    limit = written,
                    "difference table truncated at row limit"
                );
                break;
            }
            writer.write_record([
                cell.row.to_string(),
                cell.col.to_string(),
                self.float(cell.value),
            ])?;
            written += 1;
        }
        writer.flush()?;
        Ok(written)
    }

    pub fn write_histogram(&self, histogram: &ValueHistogram, path: &Path) -> Result<()> {
        let mut writer = open(path)?;
        writer.write_record(HISTOGRAM_HEADER)?;
        for bin in &histogram.bins {
            writer.write_record([
                self.float(bin.start),
                self.float(bin.end),
                bin.count.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// `Date, <parameters…>` with ISO dates
    pub fn write_power_series(&self, series: &PowerSeries, path: &Path) -> Result<()> {
        let mut writer = open(path)?;
        let mut header = vec!["Date".to_string()];
        header.extend(series.parameters.iter().cloned());
        writer.write_record(&header)?;

        for row in &series.rows {
            let mut record = Vec::with_capacity(header.len());
            record.push(row.date.format("%Y-%m-%d").to_string());
            record.extend(row.values.iter().map(|v| self.optional(*v)));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn float(&self, value: f64) -> String {
        if value.is_nan() {
            "NaN".to_string()
        } else {
            format!("{:.*}", self.precision, value)
        }
    }

    fn optional(&self, value: Option<f64>) -> String {
        value.map(|v| self.float(v)).unwrap_or_default()
    }
}

impl Default for CsvReportWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn open(path: &Path) -> Result<Writer<File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(Writer::from_path(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect()
    }

    #[test]
    fn test_regional_round_trip_preserves_order_and_precision() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("precipitation_averages.csv");

        let records: Vec<RegionalRecord> = (0..12)
            .map(|i| RegionalRecord {
                year: 2023 - i,
                overall: 1.0 / (i as f64 + 3.0),
                south: 100.123456 + i as f64,
                center: -0.00004,
                north: 42.0,
            })
            .collect();
        CsvReportWriter::new().write_regional(&records, &path)?;

        let rows = read_rows(&path);
        assert_eq!(rows[0], REGIONAL_HEADER);
        assert_eq!(rows.len(), 13);
        for (record, row) in records.iter().zip(rows.iter().skip(1)) {
            assert_eq!(row[0].parse::<i32>().unwrap(), record.year);
            let overall: f64 = row[1].parse().unwrap();
            assert!((overall - record.overall).abs() <= 0.00005);
            assert_eq!(row[1], format!("{:.4}", record.overall));
        }
        assert_eq!(rows[1][2], "100.1235");
        assert_eq!(rows[1][3], "-0.0000");
        Ok(())
    }

    #[test]
    fn test_nan_and_missing_values() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("stats").join("stats.csv");
        let stats = vec![
            RasterStats {
                filename: "2010R.tif".to_string(),
                min: Some(1.0),
                max: Some(2.5),
                mean: Some(1.75),
                median: Some(1.75),
            },
            RasterStats {
                filename: "2011R.tif".to_string(),
                min: None,
                max: None,
                mean: None,
                median: None,
            },
        ];
        CsvReportWriter::new()
            .with_precision(2)
            .write_raster_stats(&stats, &path)?;

        let rows = read_rows(&path);
        assert_eq!(rows[1], vec!["2010R.tif", "1.00", "2.50", "1.75", "1.75"]);
        assert_eq!(rows[2], vec!["2011R.tif", "", "", "", ""]);

        let ts_path = dir.path().join("trend.csv");
        let points = vec![TimeSeriesPoint {
            label: "precip.tif".to_string(),
            year: None,
            mean: f64::NAN,
        }];
        CsvReportWriter::new().write_time_series(&points, &ts_path)?;
        assert_eq!(read_rows(&ts_path)[1], vec!["precip.tif", "", "NaN"]);
        Ok(())
    }

    #[test]
    fn test_land_cover_schema_columns() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("land_cover_values.csv");
        let records = vec![
            LandCoverRecord {
                year: 2010,
                counts: BTreeMap::from([(7, 12), (16, 1)]),
            },
            LandCoverRecord {
                year: 2011,
                counts: BTreeMap::from([(7, 10), (255, 3)]),
            },
        ];
        let classes = CsvReportWriter::new().write_land_cover(&records, &path)?;
        assert_eq!(classes.len(), 18);

        let rows = read_rows(&path);
        assert_eq!(rows[0].len(), 19);
        assert_eq!(rows[0][0], "Year");
        assert_eq!(rows[0][1], "Value_0");
        assert_eq!(rows[0][17], "Value_16");
        assert_eq!(rows[0][18], "Value_255");
        assert_eq!(rows[1][8], "12");
        assert_eq!(rows[1][18], "0");
        assert_eq!(rows[2][18], "3");
        Ok(())
    }

    #[test]
    fn test_difference_cells_row_limit() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("difference.csv");
        let cells = (0..10).map(|i| DifferenceCell {
            row: i / 5,
            col: i % 5,
            value: i as f64 * 0.5,
        });

        let written = CsvReportWriter::new().write_difference_cells(cells, &path, Some(4))?;
        assert_eq!(written, 4);

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], DIFFERENCE_HEADER);
        assert_eq!(rows[4], vec!["0", "3", "1.5000"]);
        Ok(())
    }

    #[test]
    fn test_empty_tables_have_header_only() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("empty.csv");
        CsvReportWriter::new().write_regional(&[], &path)?;
        assert_eq!(read_rows(&path), vec![REGIONAL_HEADER.to_vec()]);
        Ok(())
    }
}
