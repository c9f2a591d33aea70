use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::Validate;

use crate::error::{ProcessingError, Result};
use crate::models::RegionPartition;
use crate::processors::{MaskPolicy, RegionalAggregator};
use crate::utils::constants::{
    DEFAULT_CENTER_END, DEFAULT_CONFIG_FILE, DEFAULT_HISTOGRAM_BINS, DEFAULT_PRECISION,
    DEFAULT_SOUTH_END, ENV_PREFIX, FILL_VALUE_NODATA, POWER_BASE_URL,
    POWER_DEFAULT_TIMEOUT_SECS, PRECIPITATION_NODATA,
};

/// Settings for all commands, layered from an optional TOML file and
/// `SAHEL__SECTION__KEY` environment variables.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AnalysisConfig {
    pub data: DataConfig,
    #[validate(nested)]
    pub masking: MaskingConfig,
    #[validate(nested)]
    pub regions: RegionConfig,
    #[validate(nested)]
    pub output: OutputConfig,
    #[validate(nested)]
    pub power: PowerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub precipitation_dir: PathBuf,
    pub land_cover_dir: PathBuf,
    pub population_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Memory-map rasters instead of buffered reads
    pub use_mmap: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            precipitation_dir: PathBuf::from("data/precipitation"),
            land_cover_dir: PathBuf::from("data/land_cover"),
            population_dir: PathBuf::from("data/population"),
            output_dir: PathBuf::from("output"),
            use_mmap: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MaskingConfig {
    #[validate(length(max = 64))]
    pub sentinels: Vec<f64>,
    pub honor_file_nodata: bool,
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            sentinels: vec![PRECIPITATION_NODATA, FILL_VALUE_NODATA],
            honor_file_nodata: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RegionConfig {
    #[validate(range(min = 1))]
    pub south_end: usize,
    #[validate(range(min = 2))]
    pub center_end: usize,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            south_end: DEFAULT_SOUTH_END,
            center_end: DEFAULT_CENTER_END,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct OutputConfig {
    #[validate(range(max = 12))]
    pub precision: usize,
    #[validate(range(min = 1, max = 10000))]
    pub histogram_bins: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PowerConfig {
    #[validate(length(min = 1))]
    pub base_url: String,
    #[validate(range(min = 1, max = 3600))]
    pub timeout_secs: u64,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            base_url: POWER_BASE_URL.to_string(),
            timeout_secs: POWER_DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AnalysisConfig {
    /// Load from `path`, or from `sahel.toml` in the working directory when
    /// no path is given. An explicit path must exist; the default file is
    /// optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, environment())
    }

    pub fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: AnalysisConfig = Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()?;

        config.check()?;
        debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Field ranges plus the region ordering
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        if self.regions.south_end >= self.regions.center_end {
            return Err(ProcessingError::Config(format!(
                "regions.south_end ({}) must be less than regions.center_end ({})",
                self.regions.south_end, self.regions.center_end
            )));
        }
        Ok(())
    }

    pub fn mask_policy(&self) -> MaskPolicy {
        MaskPolicy::new(
            self.masking.sentinels.clone(),
            self.masking.honor_file_nodata,
        )
    }

    pub fn partition(&self) -> Result<RegionPartition> {
        RegionPartition::new(self.regions.south_end, self.regions.center_end)
    }

    pub fn aggregator(&self) -> Result<RegionalAggregator> {
        Ok(RegionalAggregator::new(self.partition()?))
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}
