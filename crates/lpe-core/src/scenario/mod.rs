//! Scenario files bundle the checks of one cell/skew run and aggregate their
//! verdicts into a single report.

pub mod config;
pub mod runner;

use crate::domain::LpeError;
use std::path::PathBuf;

pub use config::{
    DEFAULT_REPORT_NAME, OaVsSpfSection, PoloEntry, ScenarioConfig, SpfVsSpfSection,
    load_scenario,
};
pub use runner::{
    CheckStatus, OA_ISOTOPE_CHECK, SPF_ISOTOPE_CHECK, ScenarioCheck, ScenarioReport,
    render_human_summary, run_scenario,
};

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("failed to read scenario '{}': {source}", path.display())]
    ReadScenario {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse scenario '{}': {source}", path.display())]
    ParseScenario {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(
        "scenario for cell '{cell}' requests no comparison (add spfVsSpf, oaVsSpf or a polo entry)"
    )]
    NoComparison { cell: String },
    #[error("failed to create report directory '{}': {source}", path.display())]
    ReportDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize scenario report '{}': {source}", path.display())]
    SerializeReport {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write scenario report '{}': {source}", path.display())]
    WriteReport {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<ScenarioError> for LpeError {
    fn from(error: ScenarioError) -> Self {
        let message = error.to_string();
        match error {
            ScenarioError::ReadScenario { .. } => LpeError::io_system("IO.SCENARIO_READ", message),
            ScenarioError::ParseScenario { .. } | ScenarioError::NoComparison { .. } => {
                LpeError::input_validation("INPUT.SCENARIO", message)
            }
            ScenarioError::ReportDirectory { .. } | ScenarioError::WriteReport { .. } => {
                LpeError::io_system("IO.SCENARIO_REPORT", message)
            }
            ScenarioError::SerializeReport { .. } => {
                LpeError::internal("INTERNAL.SCENARIO_REPORT", message)
            }
        }
    }
}
