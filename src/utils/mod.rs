pub mod constants;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use filename::{default_csv_path, file_label, year_from_filename};
pub use progress::ProgressReporter;
