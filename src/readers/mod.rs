pub mod discovery;
pub mod geotiff_reader;

pub use discovery::{DatasetFile, DatasetScanner};
pub use geotiff_reader::GeoTiffReader;
