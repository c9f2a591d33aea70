use ndarray::{s, Array2, ArrayView2};

use crate::error::{ProcessingError, Result};

/// A masked 2-D raster grid. Missing cells are stored as NaN, every other
/// value is a valid measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    data: Array2<f64>,
}

impl Grid {
    pub fn new(data: Array2<f64>) -> Self {
        Self { data }
    }

    /// Build a grid from row-major samples
    pub fn from_vec(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self> {
        if values.len() != rows * cols {
            return Err(ProcessingError::InvalidFormat(format!(
                "Expected {} samples for a {}x{} grid, got {}",
                rows * cols,
                rows,
                cols,
                values.len()
            )));
        }
        let data = Array2::from_shape_vec((rows, cols), values)
            .map_err(|e| ProcessingError::InvalidFormat(e.to_string()))?;
        Ok(Self { data })
    }

    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            data: Array2::from_elem((rows, cols), value),
        }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn total_cells(&self) -> usize {
        self.data.len()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get((row, col)).copied()
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        if let Some(cell) = self.data.get_mut((row, col)) {
            *cell = value;
        }
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Rows `[start, end)`; `end` is clamped to the grid height
    pub fn row_band(&self, start: usize, end: usize) -> ArrayView2<'_, f64> {
        let end = end.min(self.rows());
        let start = start.min(end);
        self.data.slice(s![start..end, ..])
    }

    pub fn valid_cells(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }

    pub fn is_all_missing(&self) -> bool {
        self.data.iter().all(|v| v.is_nan())
    }

    /// Valid values in row-major order
    pub fn valid_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().copied().filter(|v| !v.is_nan())
    }

    /// `(row, col, value)` for every valid cell, row-major
    pub fn valid_cells_indexed(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.data
            .indexed_iter()
            .filter(|(_, v)| !v.is_nan())
            .map(|((r, c), v)| (r, c, *v))
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Grid {
        Grid {
            data: self.data.mapv(f),
        }
    }
}
