//! Band-1 GeoTIFF reader built on the pure-Rust `tiff` decoder.

use memmap2::Mmap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::models::{GeoReference, RasterBand};
use crate::utils::constants::{TAG_GDAL_NODATA, TAG_MODEL_PIXEL_SCALE, TAG_MODEL_TIEPOINT};

pub struct GeoTiffReader {
    use_mmap: bool,
}

impl GeoTiffReader {
    pub fn new() -> Self {
        Self { use_mmap: false }
    }

    pub fn with_mmap(use_mmap: bool) -> Self {
        Self { use_mmap }
    }

    /// Read band 1 of a GeoTIFF. The file is closed before this returns.
    pub fn read_band(&self, path: &Path) -> Result<RasterBand> {
        let file = File::open(path)?;
        let mut band = if self.use_mmap {
            let mmap = unsafe { Mmap::map(&file)? };
            Self::decode(Cursor::new(&mmap[..]))?
        } else {
            Self::decode(BufReader::new(file))?
        };
        band.path = path.to_path_buf();

        debug!(
            path = %path.display(),
            rows = band.rows,
            cols = band.cols,
            nodata = ?band.nodata,
            sample_type = band.sample_type,
            "read raster band"
        );
        Ok(band)
    }

    fn decode<R: Read + Seek>(reader: R) -> Result<RasterBand> {
        let mut decoder = Decoder::new(reader)?.with_limits(Limits::unlimited());
        let (width, height) = decoder.dimensions()?;
        let rows = height as usize;
        let cols = width as usize;

        let nodata = read_nodata(&mut decoder)?;
        let georeference = read_georeference(&mut decoder);

        let (samples, sample_type) = samples_to_f64(decoder.read_image()?)?;
        let values = first_band(samples, rows * cols)?;

        Ok(RasterBand {
            path: Default::default(),
            rows,
            cols,
            values,
            nodata,
            sample_type,
            georeference,
        })
    }
}

impl Default for GeoTiffReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the GDAL_NODATA ASCII tag, e.g. `"-3.4028234663852886e+38"` or `"65533"`
fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<f64>> {
    let raw = match decoder.get_tag_ascii_string(Tag::from_u16_exhaustive(TAG_GDAL_NODATA)) {
        Ok(raw) => raw,
        Err(_) => return Ok(None),
    };
    parse_nodata(&raw).map(Some)
}

pub(crate) fn parse_nodata(raw: &str) -> Result<f64> {
    let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    trimmed.parse::<f64>().map_err(|_| {
        ProcessingError::InvalidFormat(format!("Invalid GDAL_NODATA value: '{}'", trimmed))
    })
}

fn read_georeference<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoReference> {
    let pixel_scale = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(TAG_MODEL_PIXEL_SCALE))
        .ok()?;
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(TAG_MODEL_TIEPOINT))
        .ok()?;
    Some(GeoReference {
        pixel_scale,
        tiepoint,
    })
}

fn samples_to_f64(result: DecodingResult) -> Result<(Vec<f64>, &'static str)> {
    let converted = match result {
        DecodingResult::U8(buf) => (buf.into_iter().map(f64::from).collect(), "u8"),
        DecodingResult::U16(buf) => (buf.into_iter().map(f64::from).collect(), "u16"),
        DecodingResult::U32(buf) => (buf.into_iter().map(f64::from).collect(), "u32"),
        DecodingResult::U64(buf) => (buf.into_iter().map(|v| v as f64).collect(), "u64"),
        DecodingResult::I8(buf) => (buf.into_iter().map(f64::from).collect(), "i8"),
        DecodingResult::I16(buf) => (buf.into_iter().map(f64::from).collect(), "i16"),
        DecodingResult::I32(buf) => (buf.into_iter().map(f64::from).collect(), "i32"),
        DecodingResult::I64(buf) => (buf.into_iter().map(|v| v as f64).collect(), "i64"),
        DecodingResult::F32(buf) => (buf.into_iter().map(f64::from).collect(), "f32"),
        DecodingResult::F64(buf) => (buf, "f64"),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(ProcessingError::UnsupportedSampleFormat(
                "unsupported TIFF sample type".to_string(),
            ))
        }
    };
    Ok(converted)
}

/// Keep only the first sample of each pixel for chunky multi-band images
fn first_band(samples: Vec<f64>, pixels: usize) -> Result<Vec<f64>> {
    if pixels == 0 || samples.len() == pixels {
        return Ok(samples);
    }
    if samples.len() % pixels != 0 {
        return Err(ProcessingError::InvalidFormat(format!(
            "Decoded {} samples, not a multiple of {} pixels",
            samples.len(),
            pixels
        )));
    }
    let samples_per_pixel = samples.len() / pixels;
    Ok(samples.into_iter().step_by(samples_per_pixel).collect())
}
