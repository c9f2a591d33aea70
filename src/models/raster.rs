use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Georeferencing tags carried over from a source GeoTIFF
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoReference {
    /// ModelPixelScaleTag: `[scale_x, scale_y, scale_z]`
    pub pixel_scale: Vec<f64>,
    /// ModelTiepointTag: `[i, j, k, x, y, z]`
    pub tiepoint: Vec<f64>,
}

impl GeoReference {
    pub fn origin(&self) -> Option<(f64, f64)> {
        if self.pixel_scale.len() < 2 || self.tiepoint.len() < 6 {
            return None;
        }
        let x = self.tiepoint[3] - self.tiepoint[0] * self.pixel_scale[0];
        let y = self.tiepoint[4] + self.tiepoint[1] * self.pixel_scale[1];
        Some((x, y))
    }
}

/// Band 1 of a GeoTIFF, before masking
#[derive(Debug, Clone)]
pub struct RasterBand {
    pub path: PathBuf,
    pub rows: usize,
    pub cols: usize,
    /// Row-major samples converted to f64
    pub values: Vec<f64>,
    /// Sentinel declared by the file (GDAL_NODATA), if any
    pub nodata: Option<f64>,
    /// Sample type name as decoded (e.g. "f32", "u16")
    pub sample_type: &'static str,
    pub georeference: Option<GeoReference>,
}

impl RasterBand {
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
}
