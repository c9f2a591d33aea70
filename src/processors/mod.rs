pub mod aggregator;
pub mod batch;
pub mod histogram;
pub mod masking;

pub use aggregator::{Description, RegionalAggregator, RegionalSummary, Statistic};
pub use batch::{BatchProcessor, LoadedRaster};
pub use histogram::{HistogramBin, ValueHistogram};
pub use masking::MaskPolicy;
