use serde::{Deserialize, Serialize};

use crate::models::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: u64,
}

/// Equal-width histogram of the valid values of a grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueHistogram {
    pub bins: Vec<HistogramBin>,
}

impl ValueHistogram {
    /// `None` when the grid has no finite value or `bin_count` is zero.
    /// Infinite samples are left out of every bin. The last bin is closed on
    /// the right so the maximum is counted.
    pub fn from_grid(grid: &Grid, bin_count: usize) -> Option<Self> {
        if bin_count == 0 {
            return None;
        }

        let (min, max) = finite_values(grid)
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })?;

        let width = if max > min {
            (max - min) / bin_count as f64
        } else {
            1.0
        };

        let mut counts = vec![0u64; bin_count];
        for value in finite_values(grid) {
            let index = (((value - min) / width) as usize).min(bin_count - 1);
            counts[index] += 1;
        }

        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                start: min + width * i as f64,
                end: min + width * (i + 1) as f64,
                count,
            })
            .collect();

        Some(Self { bins })
    }

    pub fn total(&self) -> u64 {
        self.bins.iter().map(|b| b.count).sum()
    }
}

fn finite_values(grid: &Grid) -> impl Iterator<Item = f64> + '_ {
    grid.valid_values().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_counts_every_valid_value() {
        let values: Vec<f64> = (0..100).map(|v| v as f64).collect();
        let mut grid = Grid::from_vec(10, 10, values).unwrap();
        grid.set(0, 0, f64::NAN);

        let histogram = ValueHistogram::from_grid(&grid, 10).unwrap();
        assert_eq!(histogram.bins.len(), 10);
        assert_eq!(histogram.total(), 99);
        assert_eq!(histogram.bins[0].start, 1.0);
        assert_eq!(histogram.bins[9].count, 10);
    }

    #[test]
    fn test_constant_grid_single_bin() {
        let histogram = ValueHistogram::from_grid(&Grid::filled(3, 3, 4.0), 5).unwrap();
        assert_eq!(histogram.bins[0].count, 9);
        assert_eq!(histogram.total(), 9);
    }

    #[test]
    fn test_infinite_values_are_not_binned() {
        let grid =
            Grid::from_vec(1, 5, vec![0.0, f64::INFINITY, 5.0, f64::NEG_INFINITY, 10.0]).unwrap();
        let histogram = ValueHistogram::from_grid(&grid, 2).unwrap();

        assert_eq!(histogram.total(), 3);
        assert_eq!(histogram.bins[0].start, 0.0);
        assert_eq!(histogram.bins[1].end, 10.0);
        assert!(histogram.bins.iter().all(|b| b.start.is_finite() && b.end.is_finite()));

        let only_infinite = Grid::from_vec(1, 2, vec![f64::INFINITY, f64::NEG_INFINITY]).unwrap();
        assert!(ValueHistogram::from_grid(&only_infinite, 4).is_none());
    }

    #[test]
    fn test_all_missing_has_no_histogram() {
        assert!(ValueHistogram::from_grid(&Grid::filled(2, 2, f64::NAN), 50).is_none());
        assert!(ValueHistogram::from_grid(&Grid::filled(2, 2, 1.0), 0).is_none());
    }
}
