use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ProcessingError, Result};
use crate::models::{
    GeoReference, Grid, LandCoverRecord, RasterStats, RegionalRecord, TimeSeriesPoint,
};
use crate::processors::{MaskPolicy, RegionalAggregator, Statistic, ValueHistogram};
use crate::readers::{DatasetFile, GeoTiffReader};
use crate::utils::filename::{file_label, year_from_filename};
use crate::utils::progress::ProgressReporter;

/// A masked raster plus the metadata needed to write derived rasters
#[derive(Debug, Clone)]
pub struct LoadedRaster {
    pub path: PathBuf,
    pub grid: Grid,
    pub georeference: Option<GeoReference>,
}

/// Reads, masks and aggregates batches of rasters on a rayon pool.
///
/// Each file is opened, reduced to its statistic and dropped before the
/// result is collected; results keep input order.
pub struct BatchProcessor {
    max_workers: usize,
    reader: GeoTiffReader,
    mask: MaskPolicy,
    aggregator: RegionalAggregator,
}

impl BatchProcessor {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            reader: GeoTiffReader::new(),
            mask: MaskPolicy::default(),
            aggregator: RegionalAggregator::default(),
        }
    }

    pub fn with_mask(mut self, mask: MaskPolicy) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_aggregator(mut self, aggregator: RegionalAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.reader = GeoTiffReader::with_mmap(use_mmap);
        self
    }

    /// Read band 1 of `path` and apply the mask policy
    pub fn load(&self, path: &Path) -> Result<LoadedRaster> {
        let band = self.reader.read_band(path)?;
        let grid = self.mask.apply(&band)?;
        debug!(
            path = %path.display(),
            valid = grid.valid_cells(),
            total = grid.total_cells(),
            "masked raster"
        );
        Ok(LoadedRaster {
            path: band.path,
            grid,
            georeference: band.georeference,
        })
    }

    /// Overall and regional statistic per year; values are divided by `scale`
    pub fn regional_records(
        &self,
        files: &[DatasetFile],
        statistic: Statistic,
        scale: f64,
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<RegionalRecord>> {
        if scale == 0.0 || !scale.is_finite() {
            return Err(ProcessingError::Config(format!(
                "Scale divisor must be a finite non-zero number, got {}",
                scale
            )));
        }

        info!(files = files.len(), ?statistic, "computing regional statistics");
        self.map_files(files, progress, |file| {
            let raster = self.load(&file.path)?;
            let summary = self
                .aggregator
                .regional(&raster.grid, statistic)
                .map_err(|e| with_path(e, &file.path))?;
            Ok(RegionalRecord {
                year: file.year,
                overall: summary.overall / scale,
                south: summary.south / scale,
                center: summary.center / scale,
                north: summary.north / scale,
            })
        })
    }

    /// Class id -> valid pixel count per year
    pub fn land_cover_records(
        &self,
        files: &[DatasetFile],
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<LandCoverRecord>> {
        info!(files = files.len(), "counting land cover classes");
        self.map_files(files, progress, |file| {
            let raster = self.load(&file.path)?;
            let record = LandCoverRecord {
                year: file.year,
                counts: self.aggregator.category_histogram(&raster.grid),
            };
            debug!(
                year = record.year,
                classes = record.counts.len(),
                pixels = record.total(),
                "counted land cover classes"
            );
            Ok(record)
        })
    }

    /// Masked mean per file, labelled with the file's base name
    pub fn time_series(
        &self,
        paths: &[PathBuf],
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<TimeSeriesPoint>> {
        info!(files = paths.len(), "extracting time series");
        self.map_files(paths, progress, |path| {
            let raster = self.load(path)?;
            let label = file_label(path);
            Ok(TimeSeriesPoint {
                year: year_from_filename(&label),
                label,
                mean: self.aggregator.mean(&raster.grid),
            })
        })
    }

    /// Min/max/mean/median per file plus, when `histogram_bins` is set, a value
    /// histogram built from the same decoded raster. The histogram is `None`
    /// for a raster without finite values.
    pub fn describe_rasters(
        &self,
        paths: &[PathBuf],
        histogram_bins: Option<usize>,
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<(RasterStats, Option<ValueHistogram>)>> {
        info!(files = paths.len(), ?histogram_bins, "describing rasters");
        self.map_files(paths, progress, |path| {
            let raster = self.load(path)?;
            let description = self.aggregator.describe(&raster.grid);
            let stats = RasterStats {
                filename: file_label(path),
                min: description.map(|d| d.min),
                max: description.map(|d| d.max),
                mean: description.map(|d| d.mean),
                median: description.map(|d| d.median),
            };
            let histogram =
                histogram_bins.and_then(|bins| ValueHistogram::from_grid(&raster.grid, bins));
            Ok((stats, histogram))
        })
    }

    /// Run `f` over `items` on a pool of `max_workers` threads, keeping order.
    /// The first error aborts the batch.
    pub fn map_files<I, T, F>(
        &self,
        items: &[I],
        progress: Option<&ProgressReporter>,
        f: F,
    ) -> Result<Vec<T>>
    where
        I: Sync,
        T: Send,
        F: Fn(&I) -> Result<T> + Sync,
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        pool.install(|| {
            items
                .par_iter()
                .map(|item| {
                    let result = f(item);
                    if let Some(p) = progress {
                        p.increment(1);
                    }
                    result
                })
                .collect()
        })
    }
}

impl Default for BatchProcessor {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

fn with_path(error: ProcessingError, path: &Path) -> ProcessingError {
    match error {
        ProcessingError::InsufficientRows { rows, required } => ProcessingError::InvalidFormat(
            format!(
                "{}: raster has {} rows, region partition needs at least {}",
                path.display(),
                rows,
                required
            ),
        ),
        other => other,
    }
}
