use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::utils::constants::LAND_COVER_FIXED_CLASSES;

/// One row of the regional table: overall statistic plus the three regions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalRecord {
    pub year: i32,
    pub overall: f64,
    pub south: f64,
    pub center: f64,
    pub north: f64,
}

/// Per-year pixel count for each land cover class id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandCoverRecord {
    pub year: i32,
    pub counts: BTreeMap<i64, u64>,
}

impl LandCoverRecord {
    pub fn count(&self, class_id: i64) -> u64 {
        self.counts.get(&class_id).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

/// Ordered class ids of land cover schema v1: the fixed IGBP classes 0-16
/// followed by any other class seen in `records`, ascending.
pub fn land_cover_columns(records: &[LandCoverRecord]) -> Vec<i64> {
    let mut classes: BTreeSet<i64> = LAND_COVER_FIXED_CLASSES.collect();
    for record in records {
        classes.extend(record.counts.keys().copied());
    }
    classes.into_iter().collect()
}

/// Descriptive statistics of one raster; `None` when no cell is valid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterStats {
    pub filename: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    /// File base name
    pub label: String,
    pub year: Option<i32>,
    pub mean: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifferenceCell {
    pub row: usize,
    pub col: usize,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_land_cover_columns_union_fixed_and_discovered() {
        let records = vec![
            LandCoverRecord {
                year: 2010,
                counts: BTreeMap::from([(7, 10), (255, 3)]),
            },
            LandCoverRecord {
                year: 2011,
                counts: BTreeMap::from([(-1, 1), (16, 4)]),
            },
        ];
        let columns = land_cover_columns(&records);

        assert_eq!(columns.len(), 19);
        assert_eq!(columns.first(), Some(&-1));
        assert_eq!(columns.last(), Some(&255));
        assert!(columns.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_land_cover_counts() {
        let record = LandCoverRecord {
            year: 2012,
            counts: BTreeMap::from([(0, 5), (10, 7)]),
        };
        assert_eq!(record.count(10), 7);
        assert_eq!(record.count(3), 0);
        assert_eq!(record.total(), 12);
    }
}
