//! Dataset Loading and Preprocessing
//!
//! - Sensor readings and labeled occupancy records
//! - Headerless CSV dataset loading
//! - Fixed-range feature scaling for network input

mod normalize;
mod record;

use thiserror::Error;

pub use normalize::FeatureScaler;
pub use record::{load_readings_csv, Dataset, OccupancyRecord, SlotReading, NUM_FEATURES};

/// Dataset-related errors
#[derive(Error, Debug)]
pub enum DataError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: expected {expected} fields, found {found}")]
    MalformedRecord {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: could not parse field {field}: {source}")]
    ParseField {
        line: usize,
        field: usize,
        source: std::num::ParseFloatError,
    },
    #[error("line {line}: invalid occupancy state label {value}")]
    InvalidState { line: usize, value: String },
    #[error("dataset is empty")]
    Empty,
}
