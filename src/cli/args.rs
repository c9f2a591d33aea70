use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::processors::Statistic;
use crate::utils::constants::{
    POWER_DEFAULT_END, POWER_DEFAULT_LATITUDE, POWER_DEFAULT_LONGITUDE,
    POWER_DEFAULT_PARAMETERS, POWER_DEFAULT_START,
};

#[derive(Parser)]
#[command(name = "sahel-raster")]
#[command(about = "Regional statistics for Sahel land cover, precipitation and population rasters")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Only log warnings and errors"
    )]
    pub quiet: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Configuration file [default: sahel.toml if present]")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatisticArg {
    Mean,
    Sum,
}

impl From<StatisticArg> for Statistic {
    fn from(arg: StatisticArg) -> Self {
        match arg {
            StatisticArg::Mean => Statistic::Mean,
            StatisticArg::Sum => Statistic::Sum,
        }
    }
}

/// Which configured data directory a yearly command reads by default
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dataset {
    Precipitation,
    Population,
    LandCover,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Overall and South/Center/North statistic per year
    Regional {
        #[arg(short, long, value_enum, default_value = "precipitation")]
        dataset: Dataset,

        #[arg(short, long, help = "Directory of YYYY*.tif rasters [default: from config]")]
        input_dir: Option<PathBuf>,

        #[arg(
            short,
            long,
            help = "Output CSV path [default: {output_dir}/{dataset}_regional_{statistic}.csv]"
        )]
        output_file: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "mean")]
        statistic: StatisticArg,

        #[arg(long, default_value_t = 1.0, help = "Divide every value by this factor")]
        scale: f64,

        #[arg(long, help = "Only files whose name contains this text")]
        file_pattern: Option<String>,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,
    },

    /// Pixel count per land cover class per year
    LandCover {
        #[arg(short, long, help = "Directory of YYYY*.tif rasters [default: from config]")]
        input_dir: Option<PathBuf>,

        #[arg(
            short,
            long,
            help = "Output CSV path [default: {output_dir}/land_cover_values.csv]"
        )]
        output_file: Option<PathBuf>,

        #[arg(long, help = "Only files whose name contains this text")]
        file_pattern: Option<String>,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,
    },

    /// Min, max, mean and median per raster
    Stats {
        #[arg(required = true, help = "Raster files or directories")]
        inputs: Vec<PathBuf>,

        #[arg(
            short,
            long,
            conflicts_with = "group_size",
            help = "Output CSV path [default: {output_dir}/{title}_stats.csv]"
        )]
        output_file: Option<PathBuf>,

        #[arg(short, long, default_value = "Rasters")]
        title: String,

        #[arg(
            long,
            num_args = 0..=1,
            default_missing_value = "3",
            help = "Write one CSV per group of this many rasters [flag alone: 3]"
        )]
        group_size: Option<usize>,

        #[arg(long, help = "Directory for per-raster value histograms")]
        histograms: Option<PathBuf>,

        #[arg(long, help = "Histogram bin count [default: from config]")]
        bins: Option<usize>,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,
    },

    /// Cell-by-cell difference of two rasters (second - first)
    Difference {
        first: PathBuf,

        second: PathBuf,

        #[arg(short, long, help = "Output GeoTIFF path")]
        output_file: PathBuf,

        #[arg(long, help = "Also write non-missing cells as Row,Col,Difference CSV")]
        cells_csv: Option<PathBuf>,

        #[arg(long, help = "Stop the cell CSV after this many rows")]
        max_rows: Option<usize>,

        #[arg(long, help = "Also write a value histogram CSV of the difference")]
        histogram: Option<PathBuf>,
    },

    /// Masked mean per raster, in input order
    TimeSeries {
        #[arg(required = true, help = "Raster files or directories")]
        inputs: Vec<PathBuf>,

        #[arg(short, long, help = "Output CSV path [default: {output_dir}/time_series.csv]")]
        output_file: Option<PathBuf>,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,
    },

    /// 1/0 validity mask of a raster as GeoTIFF
    Mask {
        input: PathBuf,

        #[arg(short, long)]
        output_file: PathBuf,
    },

    /// Display information about a raster
    Info {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Download daily point weather from the NASA POWER API
    FetchPower {
        #[arg(long, default_value_t = POWER_DEFAULT_LATITUDE, allow_negative_numbers = true)]
        latitude: f64,

        #[arg(long, default_value_t = POWER_DEFAULT_LONGITUDE, allow_negative_numbers = true)]
        longitude: f64,

        #[arg(long, default_value = POWER_DEFAULT_START, help = "Start date YYYYMMDD")]
        start: String,

        #[arg(long, default_value = POWER_DEFAULT_END, help = "End date YYYYMMDD")]
        end: String,

        #[arg(short, long, default_value = POWER_DEFAULT_PARAMETERS)]
        parameters: String,

        #[arg(
            short,
            long,
            help = "Output CSV path [default: {output_dir}/nasa_power_data.csv]"
        )]
        output_file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_regional_sum() {
        let cli = Cli::try_parse_from([
            "sahel-raster",
            "--quiet",
            "regional",
            "--dataset",
            "population",
            "--statistic",
            "sum",
            "--scale",
            "1000",
        ])
        .unwrap();
        assert!(cli.quiet);
        match cli.command {
            Commands::Regional {
                dataset,
                statistic,
                scale,
                ..
            } => {
                assert_eq!(dataset, Dataset::Population);
                assert_eq!(Statistic::from(statistic), Statistic::Sum);
                assert_eq!(scale, 1000.0);
            }
            _ => panic!("expected regional command"),
        }
    }

    #[test]
    fn test_parse_fetch_power_defaults() {
        let cli = Cli::try_parse_from(["sahel-raster", "fetch-power", "--longitude", "-5.5"])
            .unwrap();
        match cli.command {
            Commands::FetchPower {
                latitude,
                longitude,
                start,
                parameters,
                ..
            } => {
                assert_eq!(latitude, 15.0);
                assert_eq!(longitude, -5.5);
                assert_eq!(start, "20100101");
                assert_eq!(parameters, "T2M,PRECTOTCORR");
            }
            _ => panic!("expected fetch-power command"),
        }
    }

    #[test]
    fn test_stats_output_file_conflicts_with_groups() {
        let grouped = Cli::try_parse_from([
            "sahel-raster",
            "stats",
            "rasters",
            "--group-size",
            "2",
            "-o",
            "stats.csv",
        ]);
        assert!(grouped.is_err());

        let cli = Cli::try_parse_from(["sahel-raster", "stats", "rasters", "--group-size"])
            .unwrap();
        match cli.command {
            Commands::Stats { group_size, .. } => assert_eq!(group_size, Some(3)),
            _ => panic!("expected stats command"),
        }
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["sahel-raster", "-v", "-q", "info", "-f", "a.tif"]).is_err());
    }
}
