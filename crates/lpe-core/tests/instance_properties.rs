use lpe_core::isotope::{GeometricKey, MatchStrategy, compare_instances, ped_pes_check};
use lpe_core::netlist::{ExclusionSet, InstanceRecord, parse_instance_line, parse_spf_instances};
use std::path::Path;

const MODELS: [&str; 3] = ["nch_lvt", "pch_svt", "rppoly"];
const STRATEGIES: [MatchStrategy; 2] = [MatchStrategy::LinearScan, MatchStrategy::KeyIndex];

fn synthetic_line(index: usize, port_count: usize, extra: &str) -> String {
    let ports: Vec<String> = (0..port_count).map(|port| format!("n{index}_{port}")).collect();
    format!(
        "XM{index} {} {} w={}e-08 l=2e-08 ped=0.{index}u pes=0.{index}u x={} y={} angle=0{extra}",
        ports.join(" "),
        MODELS[index % MODELS.len()],
        index + 1,
        index * 3,
        index % 2,
    )
}

fn synthetic_netlist(count: usize) -> String {
    let mut text = String::from("*|DSPF 1.3\n*|GROUND_NET vss\n* Instance Section\n");
    for index in 0..count {
        text.push_str(&synthetic_line(index, 2 + index % 3, ""));
        text.push('\n');
    }
    text
}

fn records(text: &str) -> Vec<InstanceRecord> {
    parse_spf_instances(text, Path::new("synthetic.spf")).expect("synthetic netlist should parse")
}

#[test]
fn comparing_a_netlist_with_itself_always_matches() {
    for count in [1, 2, 7, 25] {
        let parsed = records(&synthetic_netlist(count));
        for strategy in STRATEGIES {
            let comparison = compare_instances(
                &parsed,
                &parsed,
                GeometricKey::Placement,
                &ExclusionSet::new(),
                strategy,
            );
            assert!(comparison.passed, "count={count} strategy={strategy:?}");
            assert_eq!(comparison.mismatch_count(), 0);
            assert_eq!(comparison.unmatched_references().count(), 0);
        }
    }
}

#[test]
fn differing_instance_counts_always_fail() {
    let reference = records(&synthetic_netlist(4));
    let test = records(&synthetic_netlist(5));
    let everything = ExclusionSet::from_list("w,l,ped,pes,x,y,angle,device_type,num_of_ports");

    for exclusions in [ExclusionSet::new(), everything] {
        let comparison = compare_instances(
            &reference,
            &test,
            GeometricKey::Placement,
            &exclusions,
            MatchStrategy::LinearScan,
        );
        assert!(!comparison.passed);
        assert!(comparison.count_mismatch());
        assert_eq!(comparison.pairs().count(), 0);
    }
}

#[test]
fn strategies_produce_identical_comparisons() {
    let reference = records(&synthetic_netlist(12));
    let drifted = synthetic_netlist(12).replace("l=2e-08", "l=3e-08");
    let test = records(&drifted);

    let linear = compare_instances(
        &reference,
        &test,
        GeometricKey::Placement,
        &ExclusionSet::new(),
        MatchStrategy::LinearScan,
    );
    let indexed = compare_instances(
        &reference,
        &test,
        GeometricKey::Placement,
        &ExclusionSet::new(),
        MatchStrategy::KeyIndex,
    );

    assert!(!linear.passed);
    assert_eq!(linear, indexed);
}

#[test]
fn repeated_exclusions_do_not_change_other_outcomes() {
    let reference = records(&synthetic_netlist(6));
    let test = records(&synthetic_netlist(6).replace("l=2e-08", "l=4e-08"));

    let once = ExclusionSet::from_list("ped");
    let mut twice = ExclusionSet::from_list("ped,ped");
    twice.insert("ped");
    assert_eq!(once, twice);

    let first = compare_instances(
        &reference,
        &test,
        GeometricKey::Placement,
        &once,
        MatchStrategy::LinearScan,
    );
    let second = compare_instances(
        &reference,
        &test,
        GeometricKey::Placement,
        &twice,
        MatchStrategy::LinearScan,
    );
    assert_eq!(first, second);
    assert_eq!(first.mismatch_count(), 6);
}

#[test]
fn synthetic_lines_round_trip_token_positions() {
    for index in 0..10 {
        for port_count in 0..5 {
            let line = synthetic_line(index, port_count, "");
            let record = parse_instance_line(&line)
                .expect("synthetic line should be well formed")
                .expect("synthetic line should describe a device");

            let tokens: Vec<&str> = line.split_whitespace().collect();
            assert_eq!(record.device_name(), tokens[0]);
            assert_eq!(record.device_type(), tokens[port_count + 1]);
            assert_eq!(record.num_of_ports(), Some(port_count as i64));
            assert_eq!(record.get("y"), Some((index % 2).to_string().as_str()));
        }
    }
}

#[test]
fn gate_fails_exactly_when_sentinel_present_and_not_excluded() {
    let periphery = ["0.2u", "0.001u"];
    let exclusion_lists = ["", "ped", "pes", "ped,pes", "w"];

    for ped in periphery {
        for pes in periphery {
            let record = InstanceRecord::from_pairs([
                ("PROPERTY", "XM0"),
                ("device_type", "nch"),
                ("ped", ped),
                ("pes", pes),
            ]);
            for list in exclusion_lists {
                let exclusions = ExclusionSet::from_list(list);
                let has_sentinel = ped == "0.001u" || pes == "0.001u";
                let gated = !exclusions.contains("ped") && !exclusions.contains("pes");
                assert_eq!(
                    ped_pes_check(std::slice::from_ref(&record), &exclusions),
                    !(has_sentinel && gated),
                    "ped={ped} pes={pes} exclusions={list:?}"
                );
            }
        }
    }
}

#[test]
fn netlists_without_instance_sections_never_pass() {
    let reference = records("*|DSPF 1.3\nC1 a b 1e-15\n");
    let test = records("*|DSPF 1.3\nR1 a b 10\n");
    assert!(reference.is_empty() && test.is_empty());

    for strategy in STRATEGIES {
        for key in [GeometricKey::Placement, GeometricKey::LowerLeft] {
            let comparison =
                compare_instances(&reference, &test, key, &ExclusionSet::new(), strategy);
            assert!(!comparison.passed, "key={key:?} strategy={strategy:?}");
            assert!(comparison.no_instances());
        }
    }
}
