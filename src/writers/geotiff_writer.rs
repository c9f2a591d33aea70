use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use tiff::encoder::colortype::{Gray32Float, Gray8};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind};
use tiff::tags::Tag;
use tracing::debug;

use crate::error::Result;
use crate::models::{GeoReference, Grid};
use crate::utils::constants::{
    TAG_GDAL_NODATA, TAG_GEO_KEY_DIRECTORY, TAG_MODEL_PIXEL_SCALE, TAG_MODEL_TIEPOINT,
};

/// Version 1.1.0, one key: GTRasterTypeGeoKey = RasterPixelIsArea
const GEO_KEYS: [u16; 8] = [1, 1, 0, 1, 1025, 0, 1, 1];

pub struct GeoTiffWriter;

impl GeoTiffWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write a float32 raster; missing cells stay NaN and GDAL_NODATA is `nan`
    pub fn write_float(
        &self,
        grid: &Grid,
        georeference: Option<&GeoReference>,
        path: &Path,
    ) -> Result<()> {
        let data: Vec<f32> = grid.view().iter().map(|&v| v as f32).collect();
        let mut encoder = TiffEncoder::new(BufWriter::new(File::create(path)?))?;
        let mut image =
            encoder.new_image::<Gray32Float>(grid.cols() as u32, grid.rows() as u32)?;

        write_geotags(image.encoder(), georeference, "nan")?;
        image.write_data(&data)?;

        debug!(
            path = %path.display(),
            rows = grid.rows(),
            cols = grid.cols(),
            "wrote float raster"
        );
        Ok(())
    }

    /// Write a validity mask: 1 where the grid has a value, 0 (declared NoData) elsewhere
    pub fn write_mask(
        &self,
        grid: &Grid,
        georeference: Option<&GeoReference>,
        path: &Path,
    ) -> Result<()> {
        let data: Vec<u8> = grid
            .view()
            .iter()
            .map(|v| if v.is_nan() { 0 } else { 1 })
            .collect();
        let mut encoder = TiffEncoder::new(BufWriter::new(File::create(path)?))?;
        let mut image = encoder.new_image::<Gray8>(grid.cols() as u32, grid.rows() as u32)?;

        write_geotags(image.encoder(), georeference, "0")?;
        image.write_data(&data)?;

        debug!(path = %path.display(), "wrote validity mask");
        Ok(())
    }
}

impl Default for GeoTiffWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_geotags<W, K>(
    encoder: &mut DirectoryEncoder<'_, W, K>,
    georeference: Option<&GeoReference>,
    nodata: &str,
) -> Result<()>
where
    W: Write + Seek,
    K: TiffKind,
{
    if let Some(geo) = georeference {
        encoder.write_tag(
            Tag::from_u16_exhaustive(TAG_MODEL_PIXEL_SCALE),
            geo.pixel_scale.as_slice(),
        )?;
        encoder.write_tag(
            Tag::from_u16_exhaustive(TAG_MODEL_TIEPOINT),
            geo.tiepoint.as_slice(),
        )?;
        encoder.write_tag(
            Tag::from_u16_exhaustive(TAG_GEO_KEY_DIRECTORY),
            &GEO_KEYS[..],
        )?;
    }
    encoder.write_tag(Tag::from_u16_exhaustive(TAG_GDAL_NODATA), nodata)?;
    Ok(())
}
