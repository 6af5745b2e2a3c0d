use super::CliError;
use anyhow::Context;
use lpe_core::domain::LvsTool;
use lpe_core::isotope::{
    IsotopeDirective, IsotopeOutcome, MatchStrategy, OaIsotopeConfig, SpfIsotopeConfig,
    run_oa_isotope, run_spf_isotope,
};
use lpe_core::polo::{
    ComparisonModes, ExtractionView, PoloCompareConfig, check_simulation_output, run_polo_compare,
};
use lpe_core::scenario::{load_scenario, render_human_summary, run_scenario};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(clap::Args)]
pub(super) struct IsotopeArgs {
    /// Golden SPF netlist
    #[arg(long)]
    reference: PathBuf,

    /// Re-extracted SPF netlist under test
    #[arg(long)]
    test: PathBuf,

    /// Run directory; artifacts land in <run-dir>/<skew>
    #[arg(long, default_value = ".")]
    run_dir: PathBuf,

    /// Process skew label
    #[arg(long)]
    skew: String,

    /// LVS tool that produced the layout netlist (icv, calibre, pvs, pegasus)
    #[arg(long, default_value = "calibre")]
    lvs_tool: LvsTool,

    #[command(flatten)]
    common: IsotopeFlags,
}

#[derive(clap::Args)]
pub(super) struct OaIsotopeArgs {
    /// Golden SPF netlist
    #[arg(long)]
    reference: PathBuf,

    /// Spectre netlist written by OA netlisting
    #[arg(long)]
    oa_netlist: PathBuf,

    /// Run directory for input_modified.scs and isotope_report.txt
    #[arg(long, default_value = ".")]
    run_dir: PathBuf,

    #[command(flatten)]
    common: IsotopeFlags,
}

#[derive(clap::Args)]
pub(super) struct IsotopeFlags {
    /// Isotope directive, e.g. "-ignore ped,pes" or "no_run_expected"
    #[arg(long, allow_hyphen_values = true)]
    extra: Option<String>,

    /// Candidate lookup strategy (linear_scan, key_index)
    #[arg(long, default_value = "linear_scan", value_parser = parse_match_strategy)]
    strategy: MatchStrategy,

    /// Print the outcome as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct PoloCompareArgs {
    /// Simulation output of the new release
    #[arg(long)]
    new: PathBuf,

    /// Simulation output of the old release
    #[arg(long)]
    old: PathBuf,

    /// Directory receiving Result.polocompare
    #[arg(long, default_value = ".")]
    run_dir: PathBuf,

    /// Allowed percent difference
    #[arg(long)]
    pct_error: f64,

    /// Extraction view selecting the post-layout stage tag (polo, oa, smc-oa)
    #[arg(long, default_value = "polo")]
    view: ExtractionView,

    /// Pre-layout vs post-layout in the new file
    #[arg(long)]
    compare_new: bool,

    /// Pre-layout vs post-layout in the old file
    #[arg(long)]
    compare_old: bool,

    /// New vs old post-layout result
    #[arg(long)]
    compare_new_vs_old_polo: bool,

    /// New vs old pre-layout result
    #[arg(long)]
    compare_new_vs_old_prelayout: bool,

    /// Request all four comparisons
    #[arg(long)]
    all: bool,

    /// Print the outcome as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct SimCheckArgs {
    /// Simulation .out file
    output: PathBuf,

    /// Print the outcome as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct ScenarioArgs {
    /// Scenario JSON file
    scenario: PathBuf,

    /// JSON report output path (overrides the scenario's reportPath)
    #[arg(long)]
    report: Option<PathBuf>,
}

fn parse_match_strategy(value: &str) -> Result<MatchStrategy, String> {
    match value {
        "linear_scan" | "linear-scan" => Ok(MatchStrategy::LinearScan),
        "key_index" | "key-index" => Ok(MatchStrategy::KeyIndex),
        other => Err(format!(
            "unknown strategy '{}' (expected linear_scan or key_index)",
            other
        )),
    }
}

impl PoloCompareArgs {
    fn modes(&self) -> ComparisonModes {
        if self.all {
            return ComparisonModes::ALL;
        }
        ComparisonModes {
            compare_new: self.compare_new,
            compare_old: self.compare_old,
            compare_new_vs_old_polo: self.compare_new_vs_old_polo,
            compare_new_vs_old_prelayout: self.compare_new_vs_old_prelayout,
        }
    }
}

pub(super) fn run_isotope_command(args: IsotopeArgs) -> Result<i32, CliError> {
    let Some(exclusions) = directive_exclusions(&args.common)? else {
        return Ok(0);
    };
    let config = SpfIsotopeConfig {
        reference_spf: args.reference,
        test_spf: args.test,
        run_directory: args.run_dir,
        skew: args.skew,
        lvs_tool: args.lvs_tool,
        exclusions,
        strategy: args.common.strategy,
    };
    let outcome = run_spf_isotope(&config).map_err(CliError::compute)?;
    report_isotope("Isotope", &outcome, args.common.json)
}

pub(super) fn run_oa_isotope_command(args: OaIsotopeArgs) -> Result<i32, CliError> {
    let Some(exclusions) = directive_exclusions(&args.common)? else {
        return Ok(0);
    };
    let config = OaIsotopeConfig {
        reference_spf: args.reference,
        oa_netlist: args.oa_netlist,
        run_directory: args.run_dir,
        exclusions,
        strategy: args.common.strategy,
    };
    let outcome = run_oa_isotope(&config).map_err(CliError::compute)?;
    report_isotope("OA isotope", &outcome, args.common.json)
}

pub(super) fn run_polo_compare_command(args: PoloCompareArgs) -> Result<i32, CliError> {
    let config = PoloCompareConfig {
        modes: args.modes(),
        new_file: args.new,
        old_file: args.old,
        run_directory: args.run_dir,
        pct_error: args.pct_error,
        extraction_view: args.view,
    };
    info!(
        new = %config.new_file.display(),
        old = %config.old_file.display(),
        view = %config.extraction_view,
        "running polo compare"
    );
    let outcome = run_polo_compare(&config).map_err(CliError::compute)?;

    if args.json {
        print_json(&outcome)?;
    } else {
        let status = if outcome.passed { "PASS" } else { "FAIL" };
        println!("Polo compare status: {}", status);
        for result in &outcome.results {
            println!(
                "  {:?}: {:?} (diff {}%)",
                result.mode, result.verdict, result.diff
            );
        }
        println!("Report: {}", outcome.report_path.display());
    }
    Ok(outcome.exit_code())
}

pub(super) fn run_sim_check_command(args: SimCheckArgs) -> Result<i32, CliError> {
    let health = check_simulation_output(&args.output).map_err(CliError::compute)?;
    if args.json {
        print_json(&health)?;
    } else {
        println!("Simulation status: {}", health.message);
    }
    if health.passed() { Ok(0) } else { Ok(1) }
}

pub(super) fn run_scenario_command(args: ScenarioArgs) -> Result<i32, CliError> {
    info!(scenario = %args.scenario.display(), "loading scenario");
    let mut config = load_scenario(&args.scenario).map_err(CliError::compute)?;
    if let Some(report) = args.report {
        config.report_path = Some(report);
    }

    let report = run_scenario(&config).map_err(CliError::Compute)?;
    println!("{}", render_human_summary(&report));
    println!("JSON report: {}", config.report_path().display());

    if report.passed { Ok(0) } else { Ok(1) }
}

fn directive_exclusions(
    flags: &IsotopeFlags,
) -> Result<Option<lpe_core::netlist::ExclusionSet>, CliError> {
    let directive = IsotopeDirective::parse(flags.extra.as_deref()).map_err(CliError::compute)?;
    match directive {
        IsotopeDirective::Compare(exclusions) => Ok(Some(exclusions)),
        IsotopeDirective::NoRunExpected => {
            println!("Isotope check skipped: no_run_expected");
            Ok(None)
        }
    }
}

fn report_isotope(label: &str, outcome: &IsotopeOutcome, json: bool) -> Result<i32, CliError> {
    if json {
        print_json(outcome)?;
    } else {
        let status = if outcome.passed { "PASS" } else { "FAIL" };
        println!("{} status: {}", label, status);
        if let Some(reason) = &outcome.reason {
            println!("  reason: {}", reason);
        }
        if let Some(path) = &outcome.report_path {
            println!("Report: {}", path.display());
        }
    }
    if outcome.passed { Ok(0) } else { Ok(1) }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize outcome")?;
    println!("{}", json);
    Ok(())
}
