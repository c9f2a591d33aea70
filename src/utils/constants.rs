/// Float32 NoData sentinel used by the CHIRPS precipitation rasters (`f32::MIN`)
pub const PRECIPITATION_NODATA: f64 = -3.4028235e38;

/// Integer fill value found in the MODIS land cover and population rasters
pub const FILL_VALUE_NODATA: f64 = 65533.0;

/// Fill value the POWER API uses for missing daily values
pub const POWER_FILL_VALUE: f64 = -999.0;

/// Default row-band boundaries: South `[0, 33)`, Center `[33, 66)`, North `[66, end)`
pub const DEFAULT_SOUTH_END: usize = 33;
pub const DEFAULT_CENTER_END: usize = 66;

/// IGBP land cover classes always present in the land cover CSV
pub const LAND_COVER_FIXED_CLASSES: std::ops::RangeInclusive<i64> = 0..=16;
pub const LAND_COVER_SCHEMA_VERSION: u32 = 1;

/// GeoTIFF / GDAL tag numbers
pub const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
pub const TAG_MODEL_TIEPOINT: u16 = 33922;
pub const TAG_GEO_KEY_DIRECTORY: u16 = 34735;
pub const TAG_GDAL_NODATA: u16 = 42113;

/// Output defaults
pub const DEFAULT_PRECISION: usize = 4;
pub const DEFAULT_HISTOGRAM_BINS: usize = 50;
pub const DEFAULT_CONFIG_FILE: &str = "sahel.toml";
pub const ENV_PREFIX: &str = "SAHEL";

/// Raster file extensions recognised by the scanner
pub const RASTER_EXTENSIONS: [&str; 2] = ["tif", "tiff"];

/// POWER API defaults (representative Sahel point, 2010-2023)
pub const POWER_BASE_URL: &str = "https://power.larc.nasa.gov/api/temporal/daily/point";
pub const POWER_COMMUNITY: &str = "RE";
pub const POWER_DEFAULT_LATITUDE: f64 = 15.0;
pub const POWER_DEFAULT_LONGITUDE: f64 = 10.0;
pub const POWER_DEFAULT_START: &str = "20100101";
pub const POWER_DEFAULT_END: &str = "20231231";
pub const POWER_DEFAULT_PARAMETERS: &str = "T2M,PRECTOTCORR";
pub const POWER_DEFAULT_TIMEOUT_SECS: u64 = 60;
