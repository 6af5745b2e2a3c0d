use super::PoloError;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationFailure {
    RunScript,
    ResultSelection,
    FrequencyError,
}

impl SimulationFailure {
    const MARKERS: [(&'static str, SimulationFailure); 3] = [
        ("ERROR from runPath", Self::RunScript),
        ("ERROR from transientResult", Self::ResultSelection),
        ("freq=ERROR", Self::FrequencyError),
    ];

    fn classify(line: &str) -> Option<Self> {
        Self::MARKERS
            .iter()
            .find(|(marker, _)| line.starts_with(*marker))
            .map(|(_, failure)| *failure)
    }

    pub fn describe(self, path: &Path) -> String {
        match self {
            Self::RunScript => format!(
                "ERROR: ocean run() script produced an error in {}",
                path.display()
            ),
            Self::ResultSelection => format!(
                "ERROR: ocean selectResult() script produced an error in {}",
                path.display()
            ),
            Self::FrequencyError => format!("ERROR: an error occurred in {}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationHealth {
    /// Last failure marker seen in the file.
    pub failure: Option<SimulationFailure>,
    pub message: String,
}

impl SimulationHealth {
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

pub fn simulation_health(text: &str, path: &Path) -> SimulationHealth {
    let failure = text.lines().filter_map(SimulationFailure::classify).last();
    let message = match failure {
        Some(failure) => failure.describe(path),
        None => "Pass".to_string(),
    };
    SimulationHealth { failure, message }
}

/// Scans a simulation `.out` file for the error lines the ocean scripts emit.
pub fn check_simulation_output(path: impl AsRef<Path>) -> Result<SimulationHealth, PoloError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PoloError::FileNotFound {
            role: "simulation output",
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path).map_err(|source| PoloError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let health = simulation_health(&text, path);
    if health.passed() {
        info!(path = %path.display(), "simulation output is clean");
    } else {
        warn!(path = %path.display(), "{}", health.message);
    }
    Ok(health)
}
