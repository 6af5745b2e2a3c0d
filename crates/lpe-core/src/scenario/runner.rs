use super::ScenarioError;
use super::config::{PoloEntry, ScenarioConfig};
use crate::domain::{LpeError, LpeResult};
use crate::isotope::{
    IsotopeDirective, IsotopeOutcome, OaIsotopeConfig, SpfIsotopeConfig, run_oa_isotope,
    run_spf_isotope,
};
use crate::polo::{PoloCompareConfig, check_simulation_output, run_polo_compare};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

pub const SPF_ISOTOPE_CHECK: &str = "lpe_isotope";
pub const OA_ISOTOPE_CHECK: &str = "lpe_oa_isotope";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Passed,
    Failed,
    Skipped,
}

impl CheckStatus {
    const fn from_passed(passed: bool) -> Self {
        if passed { Self::Passed } else { Self::Failed }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Failed => "FAIL",
            Self::Skipped => "SKIP",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioCheck {
    pub name: String,
    pub status: CheckStatus,
    pub reason: Option<String>,
    pub report_path: Option<String>,
}

impl ScenarioCheck {
    fn new(name: impl Into<String>, passed: bool, reason: Option<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::from_passed(passed),
            reason,
            report_path: None,
        }
    }

    fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Skipped,
            reason: Some(reason.into()),
            report_path: None,
        }
    }

    fn from_isotope(name: &str, outcome: &IsotopeOutcome) -> Self {
        Self {
            report_path: outcome.report_path.as_deref().map(normalize_path),
            ..Self::new(name, outcome.passed, outcome.reason.clone())
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub generated_at_unix_seconds: u64,
    pub passed: bool,
    pub cell: String,
    pub skew: String,
    pub lvs_tool: String,
    pub run_directory: String,
    pub check_count: usize,
    pub passed_check_count: usize,
    pub failed_check_count: usize,
    pub skipped_check_count: usize,
    pub checks: Vec<ScenarioCheck>,
}

impl ScenarioReport {
    pub fn failed_checks(&self) -> impl Iterator<Item = &ScenarioCheck> {
        self.checks
            .iter()
            .filter(|check| check.status == CheckStatus::Failed)
    }
}

/// Runs every check a scenario requests and writes the JSON scenario report.
///
/// The scenario passes when no executed check failed; skipped checks do not
/// count against it.
pub fn run_scenario(config: &ScenarioConfig) -> LpeResult<ScenarioReport> {
    config.validate()?;
    let directive = IsotopeDirective::parse(config.isotope_extra.as_deref())?;
    let mut checks = Vec::new();

    match directive.exclusions() {
        Some(exclusions) => {
            if let Some(section) = &config.spf_vs_spf {
                let outcome = run_spf_isotope(&SpfIsotopeConfig {
                    reference_spf: section.reference_spf.clone(),
                    test_spf: section.test_spf.clone(),
                    run_directory: config.run_directory.clone(),
                    skew: config.skew.clone(),
                    lvs_tool: config.lvs_tool,
                    exclusions: exclusions.clone(),
                    strategy: config.match_strategy,
                })?;
                checks.push(ScenarioCheck::from_isotope(SPF_ISOTOPE_CHECK, &outcome));
            }
            if let Some(section) = &config.oa_vs_spf {
                let outcome = run_oa_isotope(&OaIsotopeConfig {
                    reference_spf: section.reference_spf.clone(),
                    oa_netlist: section.oa_netlist.clone(),
                    run_directory: config.run_directory.clone(),
                    exclusions: exclusions.clone(),
                    strategy: config.match_strategy,
                })?;
                checks.push(ScenarioCheck::from_isotope(OA_ISOTOPE_CHECK, &outcome));
            }
        }
        None => {
            info!(cell = %config.cell, "isotope checks disabled by no_run_expected");
            if config.spf_vs_spf.is_some() {
                checks.push(ScenarioCheck::skipped(SPF_ISOTOPE_CHECK, "no_run_expected"));
            }
            if config.oa_vs_spf.is_some() {
                checks.push(ScenarioCheck::skipped(OA_ISOTOPE_CHECK, "no_run_expected"));
            }
        }
    }

    for entry in &config.polo {
        run_polo_entry(config, entry, &mut checks)?;
    }

    let report = build_report(config, checks);
    write_report_file(&config.report_path(), &report).map_err(LpeError::from)?;
    info!(
        cell = %report.cell,
        passed = report.passed,
        checks = report.check_count,
        "scenario finished"
    );
    Ok(report)
}

fn run_polo_entry(
    config: &ScenarioConfig,
    entry: &PoloEntry,
    checks: &mut Vec<ScenarioCheck>,
) -> LpeResult<()> {
    let compare_name = format!("{}_compare", entry.name);
    let health = check_simulation_output(&entry.new_file)?;
    let healthy = health.passed();
    checks.push(ScenarioCheck::new(
        entry.name.clone(),
        healthy,
        (!healthy).then(|| health.message.clone()),
    ));
    if !healthy {
        checks.push(ScenarioCheck::skipped(
            compare_name,
            format!("simulation check '{}' failed", entry.name),
        ));
        return Ok(());
    }

    let outcome = run_polo_compare(&PoloCompareConfig {
        new_file: entry.new_file.clone(),
        old_file: entry.old_file.clone(),
        run_directory: config.run_directory.join(&entry.name),
        pct_error: entry.pct_error,
        extraction_view: entry.extraction_view,
        modes: entry.modes,
    })?;
    let reason = (!outcome.passed).then(|| {
        let failing = outcome
            .results
            .iter()
            .filter(|result| !result.verdict.is_match())
            .count();
        format!(
            "{} of {} comparison(s) outside {}% or mismatched by name",
            failing,
            outcome.results.len(),
            entry.pct_error
        )
    });
    checks.push(ScenarioCheck {
        report_path: Some(normalize_path(&outcome.report_path)),
        ..ScenarioCheck::new(compare_name, outcome.passed, reason)
    });
    Ok(())
}

fn build_report(config: &ScenarioConfig, checks: Vec<ScenarioCheck>) -> ScenarioReport {
    let count = |status: CheckStatus| checks.iter().filter(|check| check.status == status).count();
    let passed_check_count = count(CheckStatus::Passed);
    let failed_check_count = count(CheckStatus::Failed);
    let skipped_check_count = count(CheckStatus::Skipped);

    ScenarioReport {
        generated_at_unix_seconds: current_unix_timestamp_seconds(),
        passed: failed_check_count == 0,
        cell: config.cell.clone(),
        skew: config.skew.clone(),
        lvs_tool: config.lvs_tool.to_string(),
        run_directory: normalize_path(&config.run_directory),
        check_count: checks.len(),
        passed_check_count,
        failed_check_count,
        skipped_check_count,
        checks,
    }
}

pub fn render_human_summary(report: &ScenarioReport) -> String {
    let mut lines = Vec::new();
    let status = if report.passed { "PASS" } else { "FAIL" };
    lines.push(format!("Scenario status: {}", status));
    lines.push(format!(
        "Cell: {} (skew {}, lvs tool {})",
        report.cell, report.skew, report.lvs_tool
    ));
    lines.push(format!(
        "Checks: {} total ({} passed, {} failed, {} skipped)",
        report.check_count,
        report.passed_check_count,
        report.failed_check_count,
        report.skipped_check_count
    ));

    for check in &report.checks {
        match &check.reason {
            Some(reason) => lines.push(format!(
                "Check {}: {} ({})",
                check.name,
                check.status.label(),
                reason
            )),
            None => lines.push(format!("Check {}: {}", check.name, check.status.label())),
        }
    }

    let failed: Vec<&str> = report
        .failed_checks()
        .map(|check| check.name.as_str())
        .collect();
    if !failed.is_empty() {
        lines.push(format!("Failed checks: {}", failed.join(", ")));
    }

    lines.join("\n")
}

fn write_report_file(report_path: &Path, report: &ScenarioReport) -> Result<(), ScenarioError> {
    if let Some(parent_dir) = report_path.parent() {
        fs::create_dir_all(parent_dir).map_err(|source| ScenarioError::ReportDirectory {
            path: parent_dir.to_path_buf(),
            source,
        })?;
    }

    let report_json = serde_json::to_string_pretty(report).map_err(|source| {
        ScenarioError::SerializeReport {
            path: report_path.to_path_buf(),
            source,
        }
    })?;
    fs::write(report_path, report_json).map_err(|source| ScenarioError::WriteReport {
        path: report_path.to_path_buf(),
        source,
    })
}

fn current_unix_timestamp_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
