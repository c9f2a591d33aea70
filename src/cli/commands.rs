use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn, Level};

use crate::cli::args::{Cli, Commands, Dataset, StatisticArg};
use crate::config::AnalysisConfig;
use crate::error::{ProcessingError, Result};
use crate::power::{PowerClient, PowerQuery};
use crate::processors::{BatchProcessor, Statistic, ValueHistogram};
use crate::readers::{DatasetScanner, GeoTiffReader};
use crate::utils::constants::LAND_COVER_SCHEMA_VERSION;
use crate::utils::filename::{default_csv_path, file_label, group_stats_path, histogram_path};
use crate::utils::progress::ProgressReporter;
use crate::writers::{CsvReportWriter, GeoTiffWriter};

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    let config = AnalysisConfig::load(cli.config.as_deref())?;
    let quiet = cli.quiet;

    match cli.command {
        Commands::Regional {
            dataset,
            input_dir,
            output_file,
            statistic,
            scale,
            file_pattern,
            max_workers,
        } => {
            let input_dir =
                input_dir.unwrap_or_else(|| dataset_dir(&config, dataset).to_path_buf());
            let output_file = output_file.unwrap_or_else(|| {
                default_csv_path(
                    &config.data.output_dir,
                    &format!("{}_regional_{}", dataset_stem(dataset), statistic_name(statistic)),
                )
            });

            println!("Computing regional {} values...", statistic_name(statistic));
            println!("Input directory: {}", input_dir.display());
            println!("Output file: {}", output_file.display());

            let files = scanner(file_pattern).scan(&input_dir)?;
            if files.is_empty() {
                warn!(dir = %input_dir.display(), "no year-prefixed rasters found");
            }
            info!(files = files.len(), workers = max_workers, "starting regional aggregation");

            let processor = batch_processor(&config, max_workers)?;
            let statistic = Statistic::from(statistic);
            let records = blocking(move || {
                let progress =
                    ProgressReporter::new(files.len() as u64, "Aggregating rasters...", quiet);
                let records =
                    processor.regional_records(&files, statistic, scale, Some(&progress))?;
                progress.finish_with_message(&format!("Aggregated {} rasters", records.len()));
                Ok(records)
            })
            .await?;

            csv_writer(&config).write_regional(&records, &output_file)?;
            println!("Wrote {} yearly records to {}", records.len(), output_file.display());
        }

        Commands::LandCover {
            input_dir,
            output_file,
            file_pattern,
            max_workers,
        } => {
            let input_dir = input_dir.unwrap_or_else(|| config.data.land_cover_dir.clone());
            let output_file = output_file
                .unwrap_or_else(|| default_csv_path(&config.data.output_dir, "land_cover_values"));

            println!("Counting land cover classes...");
            println!("Input directory: {}", input_dir.display());

            let files = scanner(file_pattern).scan(&input_dir)?;
            if files.is_empty() {
                warn!(dir = %input_dir.display(), "no year-prefixed rasters found");
            }

            let processor = batch_processor(&config, max_workers)?;
            let records = blocking(move || {
                let progress =
                    ProgressReporter::new(files.len() as u64, "Counting classes...", quiet);
                let records = processor.land_cover_records(&files, Some(&progress))?;
                progress.finish_with_message(&format!("Counted {} rasters", records.len()));
                Ok(records)
            })
            .await?;

            let classes = csv_writer(&config).write_land_cover(&records, &output_file)?;
            println!(
                "Wrote {} years x {} classes (schema v{}) to {}",
                records.len(),
                classes.len(),
                LAND_COVER_SCHEMA_VERSION,
                output_file.display()
            );
        }

        Commands::Stats {
            inputs,
            output_file,
            title,
            group_size,
            histograms,
            bins,
            max_workers,
        } => {
            let paths = collect_rasters(&inputs)?;
            let bins = bins.unwrap_or(config.output.histogram_bins);
            if bins == 0 {
                return Err(ProcessingError::Config(
                    "Histogram bin count must be positive".to_string(),
                ));
            }
            if group_size == Some(0) {
                return Err(ProcessingError::Config("Group size must be positive".to_string()));
            }

            println!("Describing {} rasters...", paths.len());

            let processor = batch_processor(&config, max_workers)?;
            let task_paths = paths.clone();
            let histogram_bins = histograms.as_ref().map(|_| bins);
            let (stats, value_histograms): (Vec<_>, Vec<_>) = blocking(move || {
                let progress = ProgressReporter::new(
                    task_paths.len() as u64,
                    "Describing rasters...",
                    quiet,
                );
                let described =
                    processor.describe_rasters(&task_paths, histogram_bins, Some(&progress))?;
                progress.finish_with_message(&format!("Described {} rasters", described.len()));
                Ok(described.into_iter().unzip())
            })
            .await?;

            let writer = csv_writer(&config);
            match group_size {
                Some(size) => {
                    for (index, group) in stats.chunks(size).enumerate() {
                        let path = group_stats_path(&config.data.output_dir, &title, index);
                        writer.write_raster_stats(group, &path)?;
                        println!("Wrote {} rows to {}", group.len(), path.display());
                    }
                }
                None => {
                    let path = output_file.unwrap_or_else(|| {
                        default_csv_path(&config.data.output_dir, &format!("{}_stats", title))
                    });
                    writer.write_raster_stats(&stats, &path)?;
                    println!("Wrote {} rows to {}", stats.len(), path.display());
                }
            }

            if let Some(dir) = histograms {
                let mut written = 0;
                for (path, histogram) in paths.iter().zip(&value_histograms) {
                    match histogram {
                        Some(histogram) => {
                            writer.write_histogram(histogram, &histogram_path(&dir, path))?;
                            written += 1;
                        }
                        None => warn!(
                            file = %path.display(),
                            "no finite valid cells, skipping histogram"
                        ),
                    }
                }
                println!("Wrote {} histograms to {}", written, dir.display());
            }
        }

        Commands::Difference {
            first,
            second,
            output_file,
            cells_csv,
            max_rows,
            histogram,
        } => {
            println!("Differencing {} -> {}", first.display(), second.display());

            let processor = batch_processor(&config, 2)?;
            let (first_raster, second_raster) = blocking(move || {
                let mut loaded =
                    processor.map_files(&[first, second], None, |p| processor.load(p))?;
                let second = loaded.pop();
                let first = loaded.pop();
                first
                    .zip(second)
                    .ok_or_else(|| ProcessingError::MissingData("difference operands".to_string()))
            })
            .await?;

            let aggregator = config.aggregator()?;
            let difference = aggregator.difference(&first_raster.grid, &second_raster.grid)?;

            GeoTiffWriter::new().write_float(
                &difference,
                first_raster.georeference.as_ref(),
                &output_file,
            )?;
            println!(
                "Wrote {}x{} difference raster to {} ({} valid cells, mean {:.4})",
                difference.rows(),
                difference.cols(),
                output_file.display(),
                difference.valid_cells(),
                aggregator.mean(&difference)
            );

            let writer = csv_writer(&config);
            if let Some(path) = cells_csv {
                let rows = writer.write_difference_cells(
                    aggregator.difference_cells(&difference),
                    &path,
                    max_rows,
                )?;
                println!("Wrote {} difference cells to {}", rows, path.display());
            }

            if let Some(path) = histogram {
                match ValueHistogram::from_grid(&difference, config.output.histogram_bins) {
                    Some(h) => {
                        writer.write_histogram(&h, &path)?;
                        println!("Wrote difference histogram to {}", path.display());
                    }
                    None => warn!("difference has no valid cells, skipping histogram"),
                }
            }
        }

        Commands::TimeSeries {
            inputs,
            output_file,
            max_workers,
        } => {
            let paths = collect_rasters(&inputs)?;
            let output_file = output_file
                .unwrap_or_else(|| default_csv_path(&config.data.output_dir, "time_series"));

            println!("Extracting mean of {} rasters...", paths.len());

            let processor = batch_processor(&config, max_workers)?;
            let points = blocking(move || {
                let progress =
                    ProgressReporter::new(paths.len() as u64, "Averaging rasters...", quiet);
                let points = processor.time_series(&paths, Some(&progress))?;
                progress.finish_with_message(&format!("Averaged {} rasters", points.len()));
                Ok(points)
            })
            .await?;

            csv_writer(&config).write_time_series(&points, &output_file)?;
            println!("Wrote {} points to {}", points.len(), output_file.display());
        }

        Commands::Mask { input, output_file } => {
            let processor = batch_processor(&config, 1)?;
            let raster = blocking(move || processor.load(&input)).await?;

            if raster.grid.is_all_missing() {
                warn!(file = %raster.path.display(), "all cells are NoData, mask is empty");
            }
            GeoTiffWriter::new().write_mask(
                &raster.grid,
                raster.georeference.as_ref(),
                &output_file,
            )?;
            println!(
                "Wrote validity mask of {} to {} ({} of {} cells valid)",
                file_label(&raster.path),
                output_file.display(),
                raster.grid.valid_cells(),
                raster.grid.total_cells()
            );
        }

        Commands::Info { file } => {
            println!("Analyzing raster: {}", file.display());

            let band = GeoTiffReader::with_mmap(config.data.use_mmap).read_band(&file)?;
            let grid = config.mask_policy().apply(&band)?;
            let aggregator = config.aggregator()?;

            println!("\nRaster Details:");
            println!("  Size: {} rows x {} cols", band.rows, band.cols);
            println!("  Sample type: {}", band.sample_type);
            match band.nodata {
                Some(nodata) => println!("  NoData: {}", nodata),
                None => println!("  NoData: (not declared)"),
            }
            if let Some(geo) = &band.georeference {
                if let Some((x, y)) = geo.origin() {
                    println!("  Origin: ({}, {})", x, y);
                }
                println!("  Pixel scale: {:?}", geo.pixel_scale);
            }
            println!("  Masked sentinels: {:?}", config.mask_policy().sentinels());
            println!("  Valid cells: {} of {}", grid.valid_cells(), grid.total_cells());

            match aggregator.describe(&grid) {
                Some(d) => {
                    println!("\nStatistics:");
                    println!("  Min: {:.4}", d.min);
                    println!("  Max: {:.4}", d.max);
                    println!("  Mean: {:.4}", d.mean);
                    println!("  Median: {:.4}", d.median);
                }
                None => println!("\nAll cells are NoData"),
            }

            let ranges = aggregator.partition().ranges(grid.rows());
            match ranges.and_then(|r| Ok((r, aggregator.regional(&grid, Statistic::Mean)?))) {
                Ok((ranges, summary)) => {
                    println!("\nRegional means:");
                    for (region, rows) in ranges {
                        println!(
                            "  {} (rows {}..{}): {:.4}",
                            region,
                            rows.start,
                            rows.end,
                            summary.get(region)
                        );
                    }
                }
                Err(e) => println!("\nRegional means unavailable: {}", e),
            }
        }

        Commands::FetchPower {
            latitude,
            longitude,
            start,
            end,
            parameters,
            output_file,
        } => {
            let query = PowerQuery::new(latitude, longitude, &start, &end, &parameters)?;
            let output_file = output_file
                .unwrap_or_else(|| default_csv_path(&config.data.output_dir, "nasa_power_data"));

            let client = PowerClient::new(
                &config.power.base_url,
                Duration::from_secs(config.power.timeout_secs),
            )?;

            let progress = ProgressReporter::new_spinner("Fetching POWER data...", quiet);
            let series = client.fetch(&query).await?;
            match series.date_range() {
                Some((first, last)) => progress.finish_with_message(&format!(
                    "Fetched {} days ({} to {})",
                    series.len(),
                    first,
                    last
                )),
                None => progress.finish_with_message("Fetched 0 days"),
            }

            csv_writer(&config).write_power_series(&series, &output_file)?;
            println!("Saved NASA POWER data to {}", output_file.display());
        }
    }

    Ok(())
}

/// Route `tracing` output to stderr, or to `log_file` without colours
fn init_logging(verbose: bool, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::WARN
    } else {
        Level::INFO
    };

    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    // A subscriber may already be installed when `run` is called more than once
    let _ = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    Ok(())
}

async fn blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await?
}

fn batch_processor(config: &AnalysisConfig, max_workers: usize) -> Result<BatchProcessor> {
    Ok(BatchProcessor::new(max_workers)
        .with_mmap(config.data.use_mmap)
        .with_mask(config.mask_policy())
        .with_aggregator(config.aggregator()?))
}

fn csv_writer(config: &AnalysisConfig) -> CsvReportWriter {
    CsvReportWriter::new().with_precision(config.output.precision)
}

fn scanner(file_pattern: Option<String>) -> DatasetScanner {
    match file_pattern {
        Some(pattern) => DatasetScanner::new().with_name_filter(pattern),
        None => DatasetScanner::new(),
    }
}

/// Files as given, directories expanded to their rasters in path order
fn collect_rasters(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let scanner = DatasetScanner::new();
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            paths.extend(scanner.scan_any(input)?);
        } else {
            paths.push(input.clone());
        }
    }
    Ok(paths)
}

fn dataset_dir(config: &AnalysisConfig, dataset: Dataset) -> &Path {
    match dataset {
        Dataset::Precipitation => &config.data.precipitation_dir,
        Dataset::Population => &config.data.population_dir,
        Dataset::LandCover => &config.data.land_cover_dir,
    }
}

fn dataset_stem(dataset: Dataset) -> &'static str {
    match dataset {
        Dataset::Precipitation => "precipitation",
        Dataset::Population => "population",
        Dataset::LandCover => "land_cover",
    }
}

fn statistic_name(statistic: StatisticArg) -> &'static str {
    match statistic {
        StatisticArg::Mean => "mean",
        StatisticArg::Sum => "sum",
    }
}
