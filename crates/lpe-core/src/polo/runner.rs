use super::PoloError;
use super::compare::{ValueComparison, Verdict, compare_measurements};
use super::measurement::{ExtractionView, Measurement, MeasurementRecord, read_measurements};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const POLO_COMPARE_REPORT: &str = "Result.polocompare";
const UNSET: &str = "<unset>";

/// Which of the four numeric comparisons a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ComparisonModes {
    /// Pre-layout vs post-layout within the new file.
    pub compare_new: bool,
    /// Pre-layout vs post-layout within the old file.
    pub compare_old: bool,
    pub compare_new_vs_old_polo: bool,
    pub compare_new_vs_old_prelayout: bool,
}

impl ComparisonModes {
    pub const ALL: Self = Self {
        compare_new: true,
        compare_old: true,
        compare_new_vs_old_polo: true,
        compare_new_vs_old_prelayout: true,
    };

    pub fn requested(self) -> impl Iterator<Item = ComparisonMode> {
        [
            (self.compare_new, ComparisonMode::NewPrelayoutVsPolo),
            (self.compare_old, ComparisonMode::OldPrelayoutVsPolo),
            (self.compare_new_vs_old_polo, ComparisonMode::NewVsOldPolo),
            (
                self.compare_new_vs_old_prelayout,
                ComparisonMode::NewVsOldPrelayout,
            ),
        ]
        .into_iter()
        .filter_map(|(requested, mode)| requested.then_some(mode))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    NewPrelayoutVsPolo,
    OldPrelayoutVsPolo,
    NewVsOldPolo,
    NewVsOldPrelayout,
}

/// Report wording for one mode.
struct ModeText {
    matched: &'static str,
    exceeded: &'static str,
    names_differ: &'static str,
    first_label: &'static str,
    second_label: &'static str,
}

impl ComparisonMode {
    fn operands<'r>(
        self,
        new: &'r MeasurementRecord,
        old: &'r MeasurementRecord,
    ) -> (Option<&'r Measurement>, Option<&'r Measurement>) {
        match self {
            Self::NewPrelayoutVsPolo => (new.prelayout.as_ref(), new.post_layout.as_ref()),
            Self::OldPrelayoutVsPolo => (old.prelayout.as_ref(), old.post_layout.as_ref()),
            Self::NewVsOldPolo => (new.post_layout.as_ref(), old.post_layout.as_ref()),
            Self::NewVsOldPrelayout => (new.prelayout.as_ref(), old.prelayout.as_ref()),
        }
    }

    const fn text(self) -> ModeText {
        match self {
            Self::NewPrelayoutVsPolo => ModeText {
                matched: "Name and value match for Prelayout vs Polo for the new run",
                exceeded: "for Prelayout vs Polo for the new run",
                names_differ: "Names do not match for Prelayout vs Polo for the new run",
                first_label: "    Prelay: ",
                second_label: "    POLO:   ",
            },
            Self::OldPrelayoutVsPolo => ModeText {
                matched: "Name and value match for Prelayout vs Polo for the old run",
                exceeded: "for Prelayout vs Polo for the old run",
                names_differ: "Names do not match for Prelayout vs Polo for the old run",
                first_label: "    Prelay: ",
                second_label: "    POLO:   ",
            },
            Self::NewVsOldPolo => ModeText {
                matched: "Name and value match for New Run Polo vs Old Run Polo",
                exceeded: "for New Run Polo vs Old Run Polo",
                names_differ: "Names do not match for Polo vs Polo for the new and old run",
                first_label: "    New POLO: ",
                second_label: "    OLD POLO: ",
            },
            Self::NewVsOldPrelayout => ModeText {
                matched: "Name and value match for New Run Prelayout vs Old Run Prelayout",
                exceeded: "for New Run Prelayout vs Old Run Prelayout",
                names_differ: "Names do not match for Prelayout vs Prelayout for the new and old run",
                first_label: "    New Prelayout: ",
                second_label: "    OLD Prelayout: ",
            },
        }
    }

    const fn description(self) -> &'static str {
        match self {
            Self::NewPrelayoutVsPolo => "Compare pre-layout result vs POLO result in new file",
            Self::OldPrelayoutVsPolo => "Compare pre-layout result vs POLO result in old file",
            Self::NewVsOldPolo => "Compare new release POLO result vs old release POLO result",
            Self::NewVsOldPrelayout => {
                "Compare new release prelayout result vs old release prelayout result"
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PoloCompareConfig {
    pub new_file: PathBuf,
    pub old_file: PathBuf,
    pub run_directory: PathBuf,
    pub pct_error: f64,
    pub extraction_view: ExtractionView,
    pub modes: ComparisonModes,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModeResult {
    pub mode: ComparisonMode,
    pub verdict: Verdict,
    pub diff: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoloOutcome {
    pub passed: bool,
    pub results: Vec<ModeResult>,
    pub report_path: PathBuf,
}

impl PoloOutcome {
    pub const fn exit_code(&self) -> i32 {
        if self.passed { 0 } else { 1 }
    }
}

/// Runs the requested numeric comparisons and writes `Result.polocompare`.
pub fn run_polo_compare(config: &PoloCompareConfig) -> Result<PoloOutcome, PoloError> {
    for (role, path) in [("new", &config.new_file), ("old", &config.old_file)] {
        if !path.is_file() {
            return Err(PoloError::FileNotFound {
                role,
                path: path.clone(),
            });
        }
    }

    let new = read_measurements(&config.new_file, config.extraction_view)?;
    let old = read_measurements(&config.old_file, config.extraction_view)?;

    let mut lines = Vec::new();
    let mut results = Vec::new();
    for mode in config.modes.requested() {
        info!("{}", mode.description());
        let (first, second) = mode.operands(&new, &old);
        let comparison = compare_measurements(config.pct_error, first, second)?;
        lines.extend(render_mode_block(mode, config, first, second, comparison));
        lines.push(String::new());
        results.push(ModeResult {
            mode,
            verdict: comparison.verdict,
            diff: comparison.diff,
        });
    }

    fs::create_dir_all(&config.run_directory).map_err(|source| PoloError::CreateDirectory {
        path: config.run_directory.clone(),
        source,
    })?;
    let report_path = config.run_directory.join(POLO_COMPARE_REPORT);
    let mut report = lines.join("\n");
    if !lines.is_empty() {
        report.push('\n');
    }
    write_report(&report_path, &report)?;

    let passed = results.iter().all(|result| result.verdict.is_match());
    if passed {
        info!(report = %report_path.display(), "polo compare passed");
    } else {
        info!(report = %report_path.display(), "polo compare failed");
    }

    Ok(PoloOutcome {
        passed,
        results,
        report_path,
    })
}

fn render_mode_block(
    mode: ComparisonMode,
    config: &PoloCompareConfig,
    first: Option<&Measurement>,
    second: Option<&Measurement>,
    comparison: ValueComparison,
) -> Vec<String> {
    let new_file = format!("New File {}", config.new_file.display());
    let old_file = format!("Old File {}", config.old_file.display());
    let mut lines = match mode {
        ComparisonMode::NewPrelayoutVsPolo => vec![new_file],
        ComparisonMode::OldPrelayoutVsPolo => vec![old_file],
        ComparisonMode::NewVsOldPolo | ComparisonMode::NewVsOldPrelayout => {
            vec![new_file, old_file]
        }
    };

    let text = mode.text();
    lines.push(match comparison.verdict {
        Verdict::Match => text.matched.to_string(),
        Verdict::ToleranceExceeded => format!(
            "Values do not match within {}% {}",
            config.pct_error, text.exceeded
        ),
        Verdict::NameMismatch => text.names_differ.to_string(),
    });

    lines.push(format!("{}{}", text.first_label, operand(first)));
    lines.push(format!("{}{}", text.second_label, operand(second)));
    if comparison.verdict == Verdict::ToleranceExceeded {
        lines.push(format!("    Difference: {}%", comparison.diff));
    }
    lines
}

fn operand(measurement: Option<&Measurement>) -> String {
    measurement.map_or_else(|| UNSET.to_string(), Measurement::to_string)
}

fn write_report(path: &Path, report: &str) -> Result<(), PoloError> {
    fs::write(path, report).map_err(|source| PoloError::WriteReport {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{ComparisonMode, ComparisonModes, PoloCompareConfig, run_polo_compare};
    use crate::polo::compare::Verdict;
    use crate::polo::measurement::ExtractionView;
    use crate::polo::PoloError;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) -> PathBuf {
        fs::write(path, content).expect("output should be written");
        path.to_path_buf()
    }

    fn config(temp: &TempDir, new: &str, old: &str, modes: ComparisonModes) -> PoloCompareConfig {
        PoloCompareConfig {
            new_file: write(&temp.path().join("new.out"), new),
            old_file: write(&temp.path().join("old.out"), old),
            run_directory: temp.path().join("ttt"),
            pct_error: 5.0,
            extraction_view: ExtractionView::Polo,
            modes,
        }
    }

    #[test]
    fn matching_runs_pass_and_report_every_mode() {
        let temp = TempDir::new().expect("tempdir should be created");
        let text = "(prelay) freq=100\n(polo) freq=102\n";
        let config = config(&temp, text, text, ComparisonModes::ALL);

        let outcome = run_polo_compare(&config).expect("compare should run");

        assert!(outcome.passed);
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(outcome.results.len(), 4);
        let report = fs::read_to_string(&outcome.report_path).expect("report should exist");
        let new_file = config.new_file.display().to_string();
        assert!(report.starts_with(&format!(
            "New File {new_file}\nName and value match for Prelayout vs Polo for the new run\n    Prelay: freq = 100\n    POLO:   freq = 102\n\n"
        )));
        assert!(report.contains("Name and value match for New Run Polo vs Old Run Polo\n    New POLO: freq = 102\n    OLD POLO: freq = 102\n"));
        assert!(report.contains("    New Prelayout: freq = 100\n    OLD Prelayout: freq = 100\n"));
    }

    #[test]
    fn drift_beyond_tolerance_fails_with_difference_line() {
        let temp = TempDir::new().expect("tempdir should be created");
        let modes = ComparisonModes {
            compare_new_vs_old_polo: true,
            ..ComparisonModes::default()
        };
        let config = config(
            &temp,
            "(prelay) freq=100\n(polo) freq=100\n",
            "(prelay) freq=100\n(polo) freq=120\n",
            modes,
        );

        let outcome = run_polo_compare(&config).expect("compare should run");

        assert!(!outcome.passed);
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(outcome.results[0].mode, ComparisonMode::NewVsOldPolo);
        assert_eq!(outcome.results[0].verdict, Verdict::ToleranceExceeded);
        let report = fs::read_to_string(&outcome.report_path).expect("report should exist");
        assert_eq!(
            report,
            format!(
                "New File {}\nOld File {}\n\
                 Values do not match within 5% for New Run Polo vs Old Run Polo\n\
                 \x20   New POLO: freq = 100\n\
                 \x20   OLD POLO: freq = 120\n\
                 \x20   Difference: 16.666666666666668%\n\n",
                config.new_file.display(),
                config.old_file.display()
            )
        );
    }

    #[test]
    fn unset_stage_is_name_mismatch() {
        let temp = TempDir::new().expect("tempdir should be created");
        let modes = ComparisonModes {
            compare_old: true,
            ..ComparisonModes::default()
        };
        let config = config(&temp, "(prelay) freq=1\n", "(prelay) freq=1\n", modes);

        let outcome = run_polo_compare(&config).expect("compare should run");

        assert!(!outcome.passed);
        let report = fs::read_to_string(&outcome.report_path).expect("report should exist");
        assert!(report.contains("Names do not match for Prelayout vs Polo for the old run\n"));
        assert!(report.contains("    POLO:   <unset>\n"));
    }

    #[test]
    fn empty_mode_set_passes_with_empty_report() {
        let temp = TempDir::new().expect("tempdir should be created");
        let config = config(&temp, "", "", ComparisonModes::default());

        let outcome = run_polo_compare(&config).expect("compare should run");

        assert!(outcome.passed);
        assert_eq!(
            fs::read_to_string(&outcome.report_path).expect("report should exist"),
            ""
        );
    }

    #[test]
    fn both_inputs_are_checked_before_parsing() {
        let temp = TempDir::new().expect("tempdir should be created");
        let mut config = config(&temp, "", "", ComparisonModes::ALL);
        config.old_file = temp.path().join("missing.out");

        let error = run_polo_compare(&config).expect_err("missing old file should fail");
        assert!(matches!(error, PoloError::FileNotFound { role: "old", .. }));
        assert!(!config.run_directory.exists());
    }
}
