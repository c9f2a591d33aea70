//! Statistics over masked grids.
//!
//! Every function here ignores missing (NaN) cells. Means and sums over a
//! region with no valid cell are NaN, never zero, so empty data is visible
//! in the output tables.

use ndarray::{ArrayView2, Zip};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ProcessingError, Result};
use crate::models::{DifferenceCell, Grid, Region, RegionPartition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statistic {
    Mean,
    Sum,
}

/// Overall and per-region value of one statistic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionalSummary {
    pub overall: f64,
    pub south: f64,
    pub center: f64,
    pub north: f64,
}

impl RegionalSummary {
    pub fn get(&self, region: Region) -> f64 {
        match region {
            Region::South => self.south,
            Region::Center => self.center,
            Region::North => self.north,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Description {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub valid_cells: usize,
}

pub struct RegionalAggregator {
    partition: RegionPartition,
}

impl RegionalAggregator {
    pub fn new(partition: RegionPartition) -> Self {
        Self { partition }
    }

    pub fn partition(&self) -> &RegionPartition {
        &self.partition
    }

    pub fn mean(&self, grid: &Grid) -> f64 {
        masked_mean(grid.view())
    }

    pub fn sum(&self, grid: &Grid) -> f64 {
        masked_sum(grid.view())
    }

    /// Overall plus South/Center/North values of `statistic`.
    ///
    /// Fails with `InsufficientRows` when the grid is shorter than the partition.
    pub fn regional(&self, grid: &Grid, statistic: Statistic) -> Result<RegionalSummary> {
        let ranges = self.partition.ranges(grid.rows())?;
        let reduce = |view: ArrayView2<'_, f64>| match statistic {
            Statistic::Mean => masked_mean(view),
            Statistic::Sum => masked_sum(view),
        };

        let [(_, south), (_, center), (_, north)] = ranges;
        Ok(RegionalSummary {
            overall: reduce(grid.view()),
            south: reduce(grid.row_band(south.start, south.end)),
            center: reduce(grid.row_band(center.start, center.end)),
            north: reduce(grid.row_band(north.start, north.end)),
        })
    }

    /// Pixel count per class id over valid cells. Values are rounded to the
    /// nearest integer class id.
    pub fn category_histogram(&self, grid: &Grid) -> BTreeMap<i64, u64> {
        let mut counts = BTreeMap::new();
        for value in grid.valid_values() {
            *counts.entry(value.round() as i64).or_insert(0) += 1;
        }
        counts
    }

    /// Min, max, mean and median of valid cells; `None` when there are none
    pub fn describe(&self, grid: &Grid) -> Option<Description> {
        let mut values: Vec<f64> = grid.valid_values().collect();
        if values.is_empty() {
            return None;
        }
        values.sort_by(|a, b| a.total_cmp(b));

        let n = values.len();
        let median = if n % 2 == 1 {
            values[n / 2]
        } else {
            (values[n / 2 - 1] + values[n / 2]) / 2.0
        };
        let mean = values.iter().sum::<f64>() / n as f64;

        Some(Description {
            min: values[0],
            max: values[n - 1],
            mean,
            median,
            valid_cells: n,
        })
    }

    /// `second - first` cell by cell; missing in either input gives missing
    pub fn difference(&self, first: &Grid, second: &Grid) -> Result<Grid> {
        if first.shape() != second.shape() {
            return Err(ProcessingError::ShapeMismatch {
                first_rows: first.rows(),
                first_cols: first.cols(),
                second_rows: second.rows(),
                second_cols: second.cols(),
            });
        }
        let data = Zip::from(first.view())
            .and(second.view())
            .map_collect(|&a, &b| b - a);
        Ok(Grid::new(data))
    }

    /// Non-missing cells of a grid in row-major order
    pub fn difference_cells<'a>(
        &self,
        difference: &'a Grid,
    ) -> impl Iterator<Item = DifferenceCell> + 'a {
        difference
            .valid_cells_indexed()
            .map(|(row, col, value)| DifferenceCell { row, col, value })
    }
}

impl Default for RegionalAggregator {
    fn default() -> Self {
        Self::new(RegionPartition::default())
    }
}

fn masked_sum(view: ArrayView2<'_, f64>) -> f64 {
    let (sum, count) = sum_and_count(view);
    if count == 0 {
        f64::NAN
    } else {
        sum
    }
}

fn masked_mean(view: ArrayView2<'_, f64>) -> f64 {
    let (sum, count) = sum_and_count(view);
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

fn sum_and_count(view: ArrayView2<'_, f64>) -> (f64, usize) {
    view.iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0), |(sum, count), &v| (sum + v, count + 1))
}
