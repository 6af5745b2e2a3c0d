use super::gate::ped_pes_check;
use super::matcher::{GeometricKey, InstanceComparison, MatchStrategy, compare_instances};
use super::report::{log_comparison, render_oa_report, render_property_match_report};
use super::run_log::capture_to_file;
use crate::domain::{LpeError, LvsTool};
use crate::netlist::{
    ExclusionSet, InstanceRecord, NetlistError, normalize_line_continuations, parse_oa_devices,
    read_spf_instances,
};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub const PROPERTY_MATCH_REPORT: &str = "propertymatch.rpt";
pub const OA_REPORT: &str = "isotope_report.txt";
pub const COMPARISON_LOG: &str = "comparison.log";
pub const PARSER_LOG: &str = "parser.log";
pub const RESULTS_SUMMARY: &str = "Results.summary";
pub const MODIFIED_OA_NETLIST: &str = "input_modified.scs";

const NO_RUN_EXPECTED: &str = "no_run_expected";
const IGNORE_PREFIX: &str = "ignore";

/// Parsed form of the free-text isotope directive, e.g. `-ignore ped,pes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IsotopeDirective {
    Compare(ExclusionSet),
    NoRunExpected,
}

impl IsotopeDirective {
    pub fn parse(directive: Option<&str>) -> Result<Self, IsotopeError> {
        let Some(directive) = directive else {
            return Ok(Self::Compare(ExclusionSet::new()));
        };
        let directive = directive.trim().trim_matches('-');

        if directive == NO_RUN_EXPECTED {
            return Ok(Self::NoRunExpected);
        }
        if !directive.starts_with(IGNORE_PREFIX) {
            return Ok(Self::Compare(ExclusionSet::new()));
        }

        let list = directive
            .split_whitespace()
            .nth(1)
            .ok_or_else(|| IsotopeError::InvalidDirective(directive.to_string()))?;
        Ok(Self::Compare(ExclusionSet::from_list(list)))
    }

    pub fn exclusions(&self) -> Option<&ExclusionSet> {
        match self {
            Self::Compare(exclusions) => Some(exclusions),
            Self::NoRunExpected => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpfIsotopeConfig {
    pub reference_spf: PathBuf,
    pub test_spf: PathBuf,
    pub run_directory: PathBuf,
    pub skew: String,
    pub lvs_tool: LvsTool,
    pub exclusions: ExclusionSet,
    pub strategy: MatchStrategy,
}

#[derive(Debug, Clone)]
pub struct OaIsotopeConfig {
    pub reference_spf: PathBuf,
    /// Spectre netlist written by the OA netlisting step.
    pub oa_netlist: PathBuf,
    pub run_directory: PathBuf,
    pub exclusions: ExclusionSet,
    pub strategy: MatchStrategy,
}

#[derive(Debug, Clone, Serialize)]
pub struct IsotopeOutcome {
    pub passed: bool,
    pub reason: Option<String>,
    /// `None` when the gate does not apply to the LVS tool.
    pub residual_gate: Option<bool>,
    pub report_path: Option<PathBuf>,
    pub comparison: Option<InstanceComparison>,
}

#[derive(Debug, thiserror::Error)]
pub enum IsotopeError {
    #[error("{role} file '{}' is empty or not found", path.display())]
    MissingInput { role: &'static str, path: PathBuf },
    #[error("invalid isotope directive '{0}': expected 'ignore <name>[,<name>...]'")]
    InvalidDirective(String),
    #[error(transparent)]
    Netlist(#[from] NetlistError),
    #[error("failed to read '{}': {source}", path.display())]
    ReadArtifact {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create run directory '{}': {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write '{}': {source}", path.display())]
    WriteArtifact {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<IsotopeError> for LpeError {
    fn from(error: IsotopeError) -> Self {
        let message = error.to_string();
        match error {
            IsotopeError::MissingInput { .. } => LpeError::io_system("IO.INPUT_MISSING", message),
            IsotopeError::InvalidDirective(_) => {
                LpeError::input_validation("INPUT.ISOTOPE_DIRECTIVE", message)
            }
            IsotopeError::Netlist(source) => source.into(),
            IsotopeError::ReadArtifact { .. }
            | IsotopeError::CreateDirectory { .. }
            | IsotopeError::WriteArtifact { .. } => {
                LpeError::io_system("IO.ISOTOPE_FILESYSTEM", message)
            }
        }
    }
}

/// Compares the instance sections of two SPF netlists of the same cell.
///
/// Writes `parser.log`, `comparison.log` and `propertymatch.rpt` under
/// `<run>/<skew>/` and appends the verdict to `<run>/Results.summary`. For ICV
/// runs the residual ped/pes gate is ANDed into the verdict.
pub fn run_spf_isotope(config: &SpfIsotopeConfig) -> Result<IsotopeOutcome, IsotopeError> {
    ensure_non_empty("test SPF", &config.test_spf)?;
    ensure_non_empty("reference SPF", &config.reference_spf)?;

    let skew_dir = config.run_directory.join(&config.skew);
    fs::create_dir_all(&skew_dir).map_err(|source| IsotopeError::CreateDirectory {
        path: skew_dir.clone(),
        source,
    })?;

    let parser_log = skew_dir.join(PARSER_LOG);
    let parsed = capture_to_file(&parser_log, || {
        parse_both(&config.reference_spf, &config.test_spf)
    })
    .map_err(|source| IsotopeError::WriteArtifact {
        path: parser_log.clone(),
        source,
    })?;
    let (reference, test) = parsed?;

    let comparison = compare_instances(
        &reference,
        &test,
        GeometricKey::Placement,
        &config.exclusions,
        config.strategy,
    );
    let comparison_log = skew_dir.join(COMPARISON_LOG);
    capture_to_file(&comparison_log, || log_comparison(&comparison)).map_err(|source| {
        IsotopeError::WriteArtifact {
            path: comparison_log.clone(),
            source,
        }
    })?;
    let report_path = skew_dir.join(PROPERTY_MATCH_REPORT);
    write_artifact(
        &report_path,
        &render_property_match_report(&comparison, &config.exclusions),
    )?;
    append_summary(config, comparison.passed)?;

    let residual_gate = config
        .lvs_tool
        .requires_residual_property_gate()
        .then(|| ped_pes_check(&test, &config.exclusions));
    let passed = comparison.passed && residual_gate.unwrap_or(true);
    let reason = failure_reason(&comparison, residual_gate);

    info!(
        skew = %config.skew,
        lvs_tool = %config.lvs_tool,
        passed,
        mismatches = comparison.mismatch_count(),
        "lpe isotope comparison finished"
    );

    Ok(IsotopeOutcome {
        passed,
        reason,
        residual_gate,
        report_path: Some(report_path),
        comparison: Some(comparison),
    })
}

/// Compares SPF devices against the devices of an OA-derived netlist by
/// lower-left corner.
///
/// A missing OA netlist means netlisting produced nothing; that is a failed
/// verdict rather than an error.
pub fn run_oa_isotope(config: &OaIsotopeConfig) -> Result<IsotopeOutcome, IsotopeError> {
    if !config.reference_spf.is_file() {
        return Err(IsotopeError::MissingInput {
            role: "reference SPF",
            path: config.reference_spf.clone(),
        });
    }
    if !config.oa_netlist.is_file() {
        error!(path = %config.oa_netlist.display(), "OA netlist is not generated");
        return Ok(IsotopeOutcome {
            passed: false,
            reason: Some(format!(
                "OA netlist '{}' is not generated",
                config.oa_netlist.display()
            )),
            residual_gate: None,
            report_path: None,
            comparison: None,
        });
    }

    fs::create_dir_all(&config.run_directory).map_err(|source| {
        IsotopeError::CreateDirectory {
            path: config.run_directory.clone(),
            source,
        }
    })?;

    let raw = fs::read_to_string(&config.oa_netlist).map_err(|source| {
        IsotopeError::ReadArtifact {
            path: config.oa_netlist.clone(),
            source,
        }
    })?;
    let modified = format!("\n{}", normalize_line_continuations(&raw));
    let modified_path = config.run_directory.join(MODIFIED_OA_NETLIST);
    write_artifact(&modified_path, &modified)?;

    let reference = read_spf_instances(&config.reference_spf)?;
    let test = parse_oa_devices(&modified, &modified_path)?;

    let exclusions = config.exclusions.with_oa_builtins();
    let comparison = compare_instances(
        &reference,
        &test,
        GeometricKey::LowerLeft,
        &exclusions,
        config.strategy,
    );
    let report_path = config.run_directory.join(OA_REPORT);
    write_artifact(&report_path, &render_oa_report(&comparison, &exclusions))?;

    if comparison.passed {
        info!("lpe oa isotope: pass");
    } else {
        warn!(
            mismatches = comparison.mismatch_count(),
            "lpe oa isotope: fail"
        );
    }

    Ok(IsotopeOutcome {
        passed: comparison.passed,
        reason: failure_reason(&comparison, None),
        residual_gate: None,
        report_path: Some(report_path),
        comparison: Some(comparison),
    })
}

fn parse_both(
    reference_path: &Path,
    test_path: &Path,
) -> Result<(Vec<InstanceRecord>, Vec<InstanceRecord>), IsotopeError> {
    let parse = |path: &Path| -> Result<Vec<InstanceRecord>, IsotopeError> {
        info!("Parsing DSPF {}", path.display());
        match read_spf_instances(path) {
            Ok(records) => {
                info!("DONE");
                Ok(records)
            }
            Err(error) => {
                warn!("{}", error);
                Err(error.into())
            }
        }
    };

    let reference = parse(reference_path)?;
    let test = parse(test_path)?;
    info!(
        "{} instance(s) found in golden netlist and {} instance(s) found in sample netlist",
        reference.len(),
        test.len()
    );
    Ok((reference, test))
}

fn failure_reason(comparison: &InstanceComparison, residual_gate: Option<bool>) -> Option<String> {
    if comparison.no_instances() {
        return Some("no instances found in either netlist".to_string());
    }
    if comparison.count_mismatch() {
        return Some(format!(
            "instance count mismatch (reference={}, test={})",
            comparison.reference_count, comparison.test_count
        ));
    }
    if !comparison.passed {
        return Some(format!(
            "{} property mismatch(es) across matched instances",
            comparison.mismatch_count()
        ));
    }
    if residual_gate == Some(false) {
        return Some("degenerate ped/pes value found in test netlist".to_string());
    }
    None
}

fn ensure_non_empty(role: &'static str, path: &Path) -> Result<(), IsotopeError> {
    let usable = fs::metadata(path)
        .map(|metadata| metadata.is_file() && metadata.len() > 0)
        .unwrap_or(false);
    if usable {
        Ok(())
    } else {
        error!(path = %path.display(), "{} is empty or not found", role);
        Err(IsotopeError::MissingInput {
            role,
            path: path.to_path_buf(),
        })
    }
}

fn append_summary(config: &SpfIsotopeConfig, instances_passed: bool) -> Result<(), IsotopeError> {
    let summary_path = config.run_directory.join(RESULTS_SUMMARY);
    let status = if instances_passed { "Pass" } else { "Fail" };
    let block = format!(
        "{}\nOLD SPF : {}\nNEW SPF : {}\nISOTOPE : {}\n\n\n",
        config.skew,
        config.reference_spf.display(),
        config.test_spf.display(),
        status
    );

    let write_error = |source| IsotopeError::WriteArtifact {
        path: summary_path.clone(),
        source,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&summary_path)
        .map_err(write_error)?;
    file.write_all(block.as_bytes()).map_err(write_error)
}

fn write_artifact(path: &Path, content: &str) -> Result<(), IsotopeError> {
    fs::write(path, content).map_err(|source| IsotopeError::WriteArtifact {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{
        IsotopeDirective, IsotopeError, OaIsotopeConfig, SpfIsotopeConfig, run_oa_isotope,
        run_spf_isotope,
    };
    use crate::domain::LvsTool;
    use crate::isotope::matcher::MatchStrategy;
    use crate::netlist::ExclusionSet;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const GOLDEN: &str = "\
*|DSPF 1.3
* Instance Section
MM1 d g s b nch l=2e-08 w=1e-07 ped=0.2u pes=0.2u x=0 y=0 angle=0
MM2 d g s b pch l=2e-08 w=2e-07 ped=0.3u pes=0.3u x=0 y=5 angle=0
";

    fn write_file(path: &Path, content: &str) -> PathBuf {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dir should be created");
        }
        fs::write(path, content).expect("file should be written");
        path.to_path_buf()
    }

    fn spf_config(temp: &TempDir, test: &str, lvs_tool: LvsTool) -> SpfIsotopeConfig {
        SpfIsotopeConfig {
            reference_spf: write_file(&temp.path().join("golden.spf"), GOLDEN),
            test_spf: write_file(&temp.path().join("sample.spf"), test),
            run_directory: temp.path().join("run"),
            skew: "tttt".to_string(),
            lvs_tool,
            exclusions: ExclusionSet::new(),
            strategy: MatchStrategy::LinearScan,
        }
    }

    #[test]
    fn directive_parsing_follows_ignore_syntax() {
        assert_eq!(
            IsotopeDirective::parse(Some("-ignore ped,pes")).expect("directive should parse"),
            IsotopeDirective::Compare(ExclusionSet::from_list("ped,pes"))
        );
        assert_eq!(
            IsotopeDirective::parse(Some("no_run_expected")).expect("directive should parse"),
            IsotopeDirective::NoRunExpected
        );
        assert_eq!(
            IsotopeDirective::parse(None).expect("absent directive is valid"),
            IsotopeDirective::Compare(ExclusionSet::new())
        );
        assert_eq!(
            IsotopeDirective::parse(Some("-strict")).expect("other text is ignored"),
            IsotopeDirective::Compare(ExclusionSet::new())
        );
        assert!(matches!(
            IsotopeDirective::parse(Some("ignore")),
            Err(IsotopeError::InvalidDirective(_))
        ));
    }

    #[test]
    fn directive_hyphens_are_stripped_from_both_ends() {
        assert_eq!(
            IsotopeDirective::parse(Some("--ignore w,l-")).expect("directive should parse"),
            IsotopeDirective::Compare(ExclusionSet::from_list("w,l"))
        );
        assert_eq!(
            IsotopeDirective::parse(Some(" -no_run_expected- ")).expect("directive should parse"),
            IsotopeDirective::NoRunExpected
        );
    }

    #[test]
    fn netlists_without_instances_fail() {
        let temp = TempDir::new().expect("tempdir should be created");
        let capacitors_only = "*|DSPF 1.3\nC1 a b 1e-15\n";
        let mut config = spf_config(&temp, capacitors_only, LvsTool::Icv);
        config.reference_spf = write_file(&temp.path().join("golden-empty.spf"), capacitors_only);

        let outcome = run_spf_isotope(&config).expect("isotope should run");

        assert!(!outcome.passed);
        assert_eq!(
            outcome.reason.as_deref(),
            Some("no instances found in either netlist")
        );
        let report = fs::read_to_string(config.run_directory.join("tttt/propertymatch.rpt"))
            .expect("report should be readable");
        assert!(report.contains("# NO INSTANCES FOUND"));
        let comparison_log = fs::read_to_string(config.run_directory.join("tttt/comparison.log"))
            .expect("comparison log should be readable");
        assert!(comparison_log.contains("WARN No instances found in either netlist"));
        let summary = fs::read_to_string(config.run_directory.join("Results.summary"))
            .expect("summary should be readable");
        assert!(summary.ends_with("ISOTOPE : Fail\n\n\n"));
    }

    #[test]
    fn identical_netlists_pass_and_write_artifacts() {
        let temp = TempDir::new().expect("tempdir should be created");
        let config = spf_config(&temp, GOLDEN, LvsTool::Calibre);

        let outcome = run_spf_isotope(&config).expect("isotope should run");

        assert!(outcome.passed);
        assert_eq!(outcome.residual_gate, None);
        let skew_dir = config.run_directory.join("tttt");
        for artifact in ["propertymatch.rpt", "comparison.log", "parser.log"] {
            assert!(skew_dir.join(artifact).is_file(), "{artifact} should exist");
        }
        let parser_log =
            fs::read_to_string(skew_dir.join("parser.log")).expect("parser log should be readable");
        assert!(parser_log.contains(
            "2 instance(s) found in golden netlist and 2 instance(s) found in sample netlist"
        ));

        let summary = fs::read_to_string(config.run_directory.join("Results.summary"))
            .expect("summary should be readable");
        assert!(summary.starts_with("tttt\nOLD SPF : "));
        assert!(summary.ends_with("ISOTOPE : Pass\n\n\n"));
    }

    #[test]
    fn summary_is_appended_across_runs() {
        let temp = TempDir::new().expect("tempdir should be created");
        let config = spf_config(&temp, GOLDEN, LvsTool::Calibre);

        run_spf_isotope(&config).expect("first run should succeed");
        run_spf_isotope(&config).expect("second run should succeed");

        let summary = fs::read_to_string(config.run_directory.join("Results.summary"))
            .expect("summary should be readable");
        assert_eq!(summary.matches("ISOTOPE : Pass").count(), 2);
    }

    #[test]
    fn icv_gate_fails_on_degenerate_periphery() {
        let temp = TempDir::new().expect("tempdir should be created");
        let sample = GOLDEN.replace("ped=0.2u", "ped=0.001u");
        let golden = sample.clone();
        let mut config = spf_config(&temp, &sample, LvsTool::Icv);
        config.reference_spf = write_file(&temp.path().join("golden-degenerate.spf"), &golden);

        let outcome = run_spf_isotope(&config).expect("isotope should run");

        assert!(!outcome.passed);
        assert_eq!(outcome.residual_gate, Some(false));
        assert!(
            outcome
                .comparison
                .as_ref()
                .is_some_and(|comparison| comparison.passed)
        );

        config.exclusions = ExclusionSet::from_list("ped,pes");
        let outcome = run_spf_isotope(&config).expect("isotope should run");
        assert!(outcome.passed);
        assert_eq!(outcome.residual_gate, Some(true));
    }

    #[test]
    fn property_mismatch_fails_and_is_summarized() {
        let temp = TempDir::new().expect("tempdir should be created");
        let sample = GOLDEN.replace("w=2e-07", "w=3e-07");
        let config = spf_config(&temp, &sample, LvsTool::Calibre);

        let outcome = run_spf_isotope(&config).expect("isotope should run");

        assert!(!outcome.passed);
        assert!(
            outcome
                .reason
                .as_deref()
                .is_some_and(|reason| reason.contains("1 property mismatch"))
        );
        let summary = fs::read_to_string(config.run_directory.join("Results.summary"))
            .expect("summary should be readable");
        assert!(summary.contains("ISOTOPE : Fail"));
    }

    #[test]
    fn empty_test_file_is_rejected_before_parsing() {
        let temp = TempDir::new().expect("tempdir should be created");
        let config = spf_config(&temp, "", LvsTool::Calibre);

        let error = run_spf_isotope(&config).expect_err("empty test SPF should fail");
        assert!(matches!(
            error,
            IsotopeError::MissingInput {
                role: "test SPF",
                ..
            }
        ));
        assert!(!config.run_directory.exists());
    }

    #[test]
    fn oa_run_matches_by_lower_left_corner() {
        let temp = TempDir::new().expect("tempdir should be created");
        let spf = write_file(
            &temp.path().join("cell.spf"),
            "* Instance Section\nMM1 d g s b nch l=20n w=100n llx=0.1 lly=0.2 x=3 y=4 angle=0\n",
        );
        let scs = write_file(
            &temp.path().join("input.scs"),
            "simulator lang=spectre\nM0 d g s b nch l=20n \\\nw=100n llx=0.1 lly=0.2\n",
        );
        let config = OaIsotopeConfig {
            reference_spf: spf,
            oa_netlist: scs,
            run_directory: temp.path().join("oa-run"),
            exclusions: ExclusionSet::new(),
            strategy: MatchStrategy::KeyIndex,
        };

        let outcome = run_oa_isotope(&config).expect("oa isotope should run");

        assert!(outcome.passed, "reason: {:?}", outcome.reason);
        let modified = fs::read_to_string(config.run_directory.join("input_modified.scs"))
            .expect("modified netlist should exist");
        assert!(modified.starts_with("\nsimulator"));
        assert!(modified.contains("l=20n w=100n"));
        assert!(config.run_directory.join("isotope_report.txt").is_file());
    }

    #[test]
    fn missing_oa_netlist_is_a_failed_verdict() {
        let temp = TempDir::new().expect("tempdir should be created");
        let config = OaIsotopeConfig {
            reference_spf: write_file(&temp.path().join("cell.spf"), GOLDEN),
            oa_netlist: temp.path().join("never-written.scs"),
            run_directory: temp.path().join("oa-run"),
            exclusions: ExclusionSet::new(),
            strategy: MatchStrategy::LinearScan,
        };

        let outcome = run_oa_isotope(&config).expect("missing OA netlist is not an error");
        assert!(!outcome.passed);
        assert!(outcome.comparison.is_none());
    }
}
