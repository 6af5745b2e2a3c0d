//! Pre-layout vs post-layout simulation result comparison.

pub mod compare;
pub mod health;
pub mod measurement;
pub mod runner;

use crate::domain::LpeError;
use std::path::PathBuf;

pub use compare::{ValueComparison, Verdict, compare_measurements, compare_name_and_value};
pub use health::{SimulationFailure, SimulationHealth, check_simulation_output, simulation_health};
pub use measurement::{
    ExtractionView, Measurement, MeasurementRecord, PRELAYOUT_TAG, parse_measurements,
    read_measurements,
};
pub use runner::{
    ComparisonMode, ComparisonModes, ModeResult, POLO_COMPARE_REPORT, PoloCompareConfig,
    PoloOutcome, run_polo_compare,
};

#[derive(Debug, thiserror::Error)]
pub enum PoloError {
    #[error("{role} file '{}' not found", path.display())]
    FileNotFound { role: &'static str, path: PathBuf },
    #[error("cannot open '{}' for read: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unknown extraction view '{0}' (expected polo, oa or smc-oa)")]
    UnknownExtractionView(String),
    #[error("result name '{pattern}' is not a valid pattern: {source}")]
    InvalidNamePattern {
        pattern: String,
        source: regex::Error,
    },
    #[error("value '{value}' of '{name}' is not a number")]
    InvalidValue { name: String, value: String },
    #[error("percent tolerance must be a non-negative number, got {0}")]
    InvalidTolerance(f64),
    #[error("failed to create run directory '{}': {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write '{}': {source}", path.display())]
    WriteReport {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<PoloError> for LpeError {
    fn from(error: PoloError) -> Self {
        let message = error.to_string();
        match error {
            PoloError::FileNotFound { .. } => LpeError::io_system("IO.INPUT_MISSING", message),
            PoloError::Read { .. } => LpeError::io_system("IO.SIMULATION_READ", message),
            PoloError::UnknownExtractionView(_) => {
                LpeError::input_validation("INPUT.EXTRACTION_VIEW", message)
            }
            PoloError::InvalidNamePattern { .. } => {
                LpeError::input_validation("INPUT.RESULT_NAME", message)
            }
            PoloError::InvalidValue { .. } => {
                LpeError::input_validation("INPUT.RESULT_VALUE", message)
            }
            PoloError::InvalidTolerance(_) => {
                LpeError::input_validation("INPUT.TOLERANCE", message)
            }
            PoloError::CreateDirectory { .. } | PoloError::WriteReport { .. } => {
                LpeError::io_system("IO.POLO_REPORT", message)
            }
        }
    }
}
