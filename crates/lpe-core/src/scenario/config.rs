use super::ScenarioError;
use crate::domain::LvsTool;
use crate::isotope::MatchStrategy;
use crate::polo::{ComparisonModes, ExtractionView};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_REPORT_NAME: &str = "scenario_report.json";

/// One cell/skew verification run, loaded from a JSON scenario file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScenarioConfig {
    pub cell: String,
    pub skew: String,
    pub lvs_tool: LvsTool,
    /// Free-text isotope directive such as `-ignore ped,pes`.
    pub isotope_extra: Option<String>,
    pub run_directory: PathBuf,
    pub report_path: Option<PathBuf>,
    #[serde(default)]
    pub match_strategy: MatchStrategy,
    pub spf_vs_spf: Option<SpfVsSpfSection>,
    pub oa_vs_spf: Option<OaVsSpfSection>,
    #[serde(default)]
    pub polo: Vec<PoloEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SpfVsSpfSection {
    pub reference_spf: PathBuf,
    pub test_spf: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OaVsSpfSection {
    pub reference_spf: PathBuf,
    pub oa_netlist: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PoloEntry {
    pub name: String,
    pub extraction_view: ExtractionView,
    pub new_file: PathBuf,
    pub old_file: PathBuf,
    pub pct_error: f64,
    pub modes: ComparisonModes,
}

impl ScenarioConfig {
    pub fn report_path(&self) -> PathBuf {
        self.report_path
            .clone()
            .unwrap_or_else(|| self.run_directory.join(DEFAULT_REPORT_NAME))
    }

    /// A scenario must request at least one isotope comparison or polo entry.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.spf_vs_spf.is_none() && self.oa_vs_spf.is_none() && self.polo.is_empty() {
            return Err(ScenarioError::NoComparison {
                cell: self.cell.clone(),
            });
        }
        Ok(())
    }

    /// Anchors every relative path at `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };

        resolve(&mut self.run_directory);
        if let Some(report_path) = self.report_path.as_mut() {
            resolve(report_path);
        }
        if let Some(section) = self.spf_vs_spf.as_mut() {
            resolve(&mut section.reference_spf);
            resolve(&mut section.test_spf);
        }
        if let Some(section) = self.oa_vs_spf.as_mut() {
            resolve(&mut section.reference_spf);
            resolve(&mut section.oa_netlist);
        }
        for entry in &mut self.polo {
            resolve(&mut entry.new_file);
            resolve(&mut entry.old_file);
        }
    }
}

pub fn load_scenario(path: impl AsRef<Path>) -> Result<ScenarioConfig, ScenarioError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ScenarioError::ReadScenario {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: ScenarioConfig =
        serde_json::from_str(&content).map_err(|source| ScenarioError::ParseScenario {
            path: path.to_path_buf(),
            source,
        })?;

    config.validate()?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.resolve_paths(base);
    Ok(config)
}
