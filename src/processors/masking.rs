use crate::error::Result;
use crate::models::{Grid, RasterBand};
use crate::utils::constants::{FILL_VALUE_NODATA, PRECIPITATION_NODATA};

/// Decides which raw samples are NoData.
///
/// A sample is missing when it is NaN, equals the file's declared sentinel
/// (if honoured), or equals any configured sentinel. A sample matches a
/// sentinel exactly or the sentinel rounded to f32, so `-3.4028235e38`
/// matches a Float32 `f32::MIN` read back from disk. The sample itself is
/// never rounded.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskPolicy {
    sentinels: Vec<f64>,
    honor_file_nodata: bool,
}

impl MaskPolicy {
    pub fn new(sentinels: Vec<f64>, honor_file_nodata: bool) -> Self {
        Self {
            sentinels,
            honor_file_nodata,
        }
    }

    pub fn sentinels(&self) -> &[f64] {
        &self.sentinels
    }

    pub fn is_missing(&self, value: f64, file_nodata: Option<f64>) -> bool {
        if value.is_nan() {
            return true;
        }
        if self.honor_file_nodata {
            if let Some(nodata) = file_nodata {
                if sentinel_matches(value, nodata) {
                    return true;
                }
            }
        }
        self.sentinels.iter().any(|&s| sentinel_matches(value, s))
    }

    /// Masked grid of a band: missing samples become NaN
    pub fn apply(&self, band: &RasterBand) -> Result<Grid> {
        let values = band
            .values
            .iter()
            .map(|&v| {
                if self.is_missing(v, band.nodata) {
                    f64::NAN
                } else {
                    v
                }
            })
            .collect();
        Grid::from_vec(band.rows, band.cols, values)
    }

    /// Mask an already-built grid against the configured sentinels only
    pub fn apply_to_grid(&self, grid: &Grid) -> Grid {
        grid.map(|v| if self.is_missing(v, None) { f64::NAN } else { v })
    }
}

impl Default for MaskPolicy {
    fn default() -> Self {
        Self::new(vec![PRECIPITATION_NODATA, FILL_VALUE_NODATA], true)
    }
}

fn sentinel_matches(value: f64, sentinel: f64) -> bool {
    if sentinel.is_nan() {
        return false;
    }
    value == sentinel || value == (sentinel as f32) as f64
}
