pub mod csv_writer;
pub mod geotiff_writer;

pub use csv_writer::CsvReportWriter;
pub use geotiff_writer::GeoTiffWriter;
