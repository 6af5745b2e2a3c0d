//! Fixed-width text reports for instance comparisons.
//!
//! Column widths are scraped by downstream log tooling and must stay stable.

use super::matcher::{InstanceComparison, PairComparison, PropertyComparison};
use crate::netlist::ExclusionSet;
use tracing::{info, warn};

const RULE_WIDTH: usize = 140;
const OA_RULE_WIDTH: usize = 160;
const ABSENT: &str = "<absent>";

/// `propertymatch.rpt` body for an SPF-vs-SPF comparison.
pub fn render_property_match_report(
    comparison: &InstanceComparison,
    exclusions: &ExclusionSet,
) -> String {
    let rule = format!("# {}", "=".repeat(RULE_WIDTH));
    let mut lines = vec![
        format!("LIST OF PARAMETERS IGNORED DURING COMPARISON:  {}", exclusions),
        "# PROPERTY MATCH/MISMATCH TABLE:".to_string(),
        rule.clone(),
        format!(
            "# {:<22}{:<25}{:<20}{:<23}{:<21}",
            "NETLIST", "DEVICE NAME", "DEVICE MODEL", "MATCHED PROPERTIES", "MISMATCHED PROPERTIES"
        ),
        rule.clone(),
        rule.clone(),
    ];

    if comparison.no_instances() {
        lines.push(
            "# NO INSTANCES FOUND: neither golden nor sample netlist has an instance section"
                .to_string(),
        );
    } else if comparison.count_mismatch() {
        lines.push(format!(
            "# INSTANCE COUNT MISMATCH: golden netlist has {} instance(s), sample netlist has {} instance(s)",
            comparison.reference_count, comparison.test_count
        ));
    } else {
        for pair in comparison.pairs() {
            lines.extend(render_pair_block(pair, &rule));
        }
    }
    finish(lines)
}

fn render_pair_block(pair: &PairComparison, rule: &str) -> Vec<String> {
    let mut lines = vec![
        format!("# {:<width$}", "MATCHED", width = RULE_WIDTH),
        format!(
            "# {:<6}{:>26}{:>26}",
            "GOLDEN", pair.reference_device, pair.reference_model
        ),
    ];

    let mut golden = Vec::with_capacity(pair.properties.len());
    let mut sample = Vec::with_capacity(pair.properties.len() + 1);
    sample.push(format!(
        "# {:<6}{:>26}{:>26}",
        "SAMPLE", pair.test_device, pair.test_model
    ));

    for property in &pair.properties {
        let width = if property.matched {
            85
        } else {
            lines.push(format!("# {:<width$}", "MISMATCHED", width = RULE_WIDTH));
            111
        };
        golden.push(format!(
            "# {:>width$}",
            format!("{} = {}", property.name, property.reference_value),
        ));
        sample.push(format!(
            "# {:>width$}",
            format!("{} = {}", property.name, test_value(property)),
        ));
    }

    lines.extend(golden);
    lines.push(format!("# {}", "-".repeat(RULE_WIDTH)));
    lines.extend(sample);
    let blank = format!("# {}", " ".repeat(RULE_WIDTH));
    lines.push(blank.clone());
    lines.push(blank);
    lines.push(rule.to_string());
    lines
}

/// `isotope_report.txt` body for an SPF-vs-OA comparison.
pub fn render_oa_report(comparison: &InstanceComparison, exclusions: &ExclusionSet) -> String {
    let mut lines = vec![
        "ISOTOPE COMPARISON REPORT:".to_string(),
        String::new(),
        format!("LIST OF PARAMETERS IGNORED DURING COMPARISON:{}", exclusions),
        String::new(),
        "COMPARISON DETAILS:".to_string(),
        String::new(),
    ];

    if comparison.no_instances() {
        lines.push("NO INSTANCES FOUND: neither SPF nor OA netlist describes a device".to_string());
        return finish(lines);
    }
    if comparison.count_mismatch() {
        lines.push(format!(
            "INSTANCE COUNT MISMATCH: SPF netlist has {} instance(s), OA netlist has {} instance(s)",
            comparison.reference_count, comparison.test_count
        ));
        return finish(lines);
    }

    for pair in comparison.pairs() {
        lines.push(format!("{:>63}{:>50}", "SPF INSTANCE", "OA INSTANCE"));
        lines.push(format!(
            "{:<51}{:<51}{:<51}{:<50}",
            "PROPERTY", pair.reference_device, pair.test_device, "COMPARISON"
        ));
        for property in &pair.properties {
            let status = if property.matched { "MATCH" } else { "MISMATCH" };
            lines.push(format!(
                "{:<51}{:<51}{:<51}{:<51}",
                property.name,
                property.reference_value,
                test_value(property),
                status
            ));
        }
        lines.push("-".repeat(OA_RULE_WIDTH));
    }
    finish(lines)
}

/// Replays the pairing walk of a comparison as `tracing` events. Run inside
/// [`super::run_log::capture_to_file`] to produce `comparison.log`.
pub fn log_comparison(comparison: &InstanceComparison) {
    if comparison.no_instances() {
        warn!("No instances found in either netlist");
        return;
    }
    if comparison.count_mismatch() {
        info!("Number of instances did not match for the files");
        return;
    }

    for outcome in &comparison.references {
        info!(
            "Finding match for {} device in position {} in golden netlist",
            outcome.device, outcome.position
        );
        if outcome.pairs.is_empty() {
            warn!("No match found in sample netlist for {} device", outcome.device);
        }
        for pair in &outcome.pairs {
            info!("Match found in sample netlist with {} device", pair.test_device);
            info!(
                "Comparing properties of {} in golden netlist with {} in sample netlist",
                pair.reference_device, pair.test_device
            );
            for property in &pair.properties {
                if property.matched {
                    info!("Matched property {} = {}", property.name, property.reference_value);
                } else {
                    info!(
                        "Mismatched properties {} {} in golden netlist {} = {} in sample netlist",
                        property.name,
                        property.reference_value,
                        property.name,
                        test_value(property)
                    );
                }
            }
        }
    }
}

fn finish(lines: Vec<String>) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn test_value(property: &PropertyComparison) -> &str {
    property.test_value.as_deref().unwrap_or(ABSENT)
}
