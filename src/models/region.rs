use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::error::{ProcessingError, Result};
use crate::utils::constants::{DEFAULT_CENTER_END, DEFAULT_SOUTH_END};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    South,
    Center,
    North,
}

impl Region {
    pub fn display_name(&self) -> &'static str {
        match self {
            Region::South => "South",
            Region::Center => "Center",
            Region::North => "North",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Fixed three-band split of a raster's rows.
///
/// South covers `[0, south_end)`, Center `[south_end, center_end)` and North
/// `[center_end, rows)`. A grid must have at least `center_end` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionPartition {
    pub south_end: usize,
    pub center_end: usize,
}

impl Default for RegionPartition {
    fn default() -> Self {
        Self {
            south_end: DEFAULT_SOUTH_END,
            center_end: DEFAULT_CENTER_END,
        }
    }
}

impl RegionPartition {
    pub fn new(south_end: usize, center_end: usize) -> Result<Self> {
        if south_end == 0 || south_end >= center_end {
            return Err(ProcessingError::Config(format!(
                "Region boundaries must satisfy 0 < south_end < center_end, got {} and {}",
                south_end, center_end
            )));
        }
        Ok(Self {
            south_end,
            center_end,
        })
    }

    /// Minimum number of rows a grid needs for this partition
    pub fn required_rows(&self) -> usize {
        self.center_end
    }

    /// Row ranges of the three regions for a grid of `rows` rows
    pub fn ranges(&self, rows: usize) -> Result<[(Region, Range<usize>); 3]> {
        if rows < self.required_rows() {
            return Err(ProcessingError::InsufficientRows {
                rows,
                required: self.required_rows(),
            });
        }
        Ok([
            (Region::South, 0..self.south_end),
            (Region::Center, self.south_end..self.center_end),
            (Region::North, self.center_end..rows),
        ])
    }
}
