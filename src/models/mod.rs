pub mod grid;
pub mod raster;
pub mod records;
pub mod region;

pub use grid::Grid;
pub use raster::{GeoReference, RasterBand};
pub use records::{
    land_cover_columns, DifferenceCell, LandCoverRecord, RasterStats, RegionalRecord,
    TimeSeriesPoint,
};
pub use region::{Region, RegionPartition};
