use crate::netlist::{ExclusionSet, InstanceRecord, PROPERTY_KEY};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Property tuple that pins a device to one location in the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometricKey {
    /// SPF-vs-SPF: placement origin and rotation.
    Placement,
    /// OA-vs-SPF: lower-left corner of the device bounding box.
    LowerLeft,
}

impl GeometricKey {
    pub const fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Placement => &["x", "y", "angle"],
            Self::LowerLeft => &["llx", "lly"],
        }
    }

    /// Key values of a record. Absent fields take part as `None`, so two
    /// records that both lack a key field still agree on it.
    pub fn values<'r>(self, record: &'r InstanceRecord) -> Vec<Option<&'r str>> {
        self.fields().iter().map(|field| record.get(field)).collect()
    }

    pub fn describe(self, record: &InstanceRecord) -> String {
        self.fields()
            .iter()
            .map(|field| format!("{} = {}", field, record.get(field).unwrap_or("<absent>")))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Scan every test record for every reference record.
    #[default]
    LinearScan,
    /// Hash the test records by geometric key once, then look up.
    KeyIndex,
}

trait CandidateLookup {
    /// Indices of test records sharing the reference key, in test order.
    fn candidates(&self, reference: &InstanceRecord) -> Vec<usize>;
}

struct LinearScan<'t> {
    key: GeometricKey,
    test: &'t [InstanceRecord],
}

impl CandidateLookup for LinearScan<'_> {
    fn candidates(&self, reference: &InstanceRecord) -> Vec<usize> {
        let wanted = self.key.values(reference);
        self.test
            .iter()
            .enumerate()
            .filter(|(_, candidate)| self.key.values(candidate) == wanted)
            .map(|(index, _)| index)
            .collect()
    }
}

struct KeyIndex<'t> {
    key: GeometricKey,
    index: HashMap<Vec<Option<&'t str>>, Vec<usize>>,
}

impl<'t> KeyIndex<'t> {
    fn new(key: GeometricKey, test: &'t [InstanceRecord]) -> Self {
        let mut index: HashMap<Vec<Option<&'t str>>, Vec<usize>> = HashMap::new();
        for (position, record) in test.iter().enumerate() {
            index.entry(key.values(record)).or_default().push(position);
        }
        Self { key, index }
    }
}

impl CandidateLookup for KeyIndex<'_> {
    fn candidates(&self, reference: &InstanceRecord) -> Vec<usize> {
        self.index
            .get(&self.key.values(reference))
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyComparison {
    pub name: String,
    pub reference_value: String,
    pub test_value: Option<String>,
    pub matched: bool,
}

/// Field-by-field comparison of one geometrically matched pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairComparison {
    pub test_index: usize,
    pub reference_device: String,
    pub reference_model: String,
    pub test_device: String,
    pub test_model: String,
    pub properties: Vec<PropertyComparison>,
}

impl PairComparison {
    pub fn passed(&self) -> bool {
        self.properties.iter().all(|property| property.matched)
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &PropertyComparison> {
        self.properties.iter().filter(|property| !property.matched)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceOutcome {
    pub reference_index: usize,
    pub device: String,
    pub position: String,
    pub pairs: Vec<PairComparison>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceComparison {
    pub key: GeometricKey,
    pub reference_count: usize,
    pub test_count: usize,
    pub passed: bool,
    /// Empty when the record counts differ or are zero; no pairing is
    /// attempted then.
    pub references: Vec<ReferenceOutcome>,
}

impl InstanceComparison {
    pub fn count_mismatch(&self) -> bool {
        self.reference_count != self.test_count
    }

    /// Neither netlist described a single device. Nothing was compared, so
    /// the comparison fails.
    pub fn no_instances(&self) -> bool {
        self.reference_count == 0 && self.test_count == 0
    }

    pub fn pairs(&self) -> impl Iterator<Item = &PairComparison> {
        self.references.iter().flat_map(|outcome| outcome.pairs.iter())
    }

    pub fn mismatch_count(&self) -> usize {
        self.pairs().map(|pair| pair.mismatches().count()).sum()
    }

    /// Reference devices that found no geometric partner. These do not fail
    /// the comparison on their own.
    pub fn unmatched_references(&self) -> impl Iterator<Item = &ReferenceOutcome> {
        self.references.iter().filter(|outcome| outcome.pairs.is_empty())
    }
}

/// Pairs reference and test devices by geometric key and compares every
/// non-excluded reference field against its partner.
pub fn compare_instances(
    reference: &[InstanceRecord],
    test: &[InstanceRecord],
    key: GeometricKey,
    exclusions: &ExclusionSet,
    strategy: MatchStrategy,
) -> InstanceComparison {
    if reference.len() != test.len() || reference.is_empty() {
        if reference.is_empty() && test.is_empty() {
            info!("no instances found in either netlist");
        } else {
            info!(
                reference = reference.len(),
                test = test.len(),
                "number of instances did not match"
            );
        }
        return InstanceComparison {
            key,
            reference_count: reference.len(),
            test_count: test.len(),
            passed: false,
            references: Vec::new(),
        };
    }

    let lookup: Box<dyn CandidateLookup + '_> = match strategy {
        MatchStrategy::LinearScan => Box::new(LinearScan { key, test }),
        MatchStrategy::KeyIndex => Box::new(KeyIndex::new(key, test)),
    };

    let mut passed = true;
    let mut references = Vec::with_capacity(reference.len());
    for (reference_index, reference_record) in reference.iter().enumerate() {
        let pairs: Vec<PairComparison> = lookup
            .candidates(reference_record)
            .into_iter()
            .map(|test_index| {
                compare_pair(reference_record, &test[test_index], test_index, exclusions)
            })
            .collect();

        if pairs.is_empty() {
            debug!(
                device = reference_record.device_name(),
                "no geometric match in test netlist"
            );
        }
        passed &= pairs.iter().all(PairComparison::passed);

        references.push(ReferenceOutcome {
            reference_index,
            device: reference_record.device_name().to_string(),
            position: key.describe(reference_record),
            pairs,
        });
    }

    InstanceComparison {
        key,
        reference_count: reference.len(),
        test_count: test.len(),
        passed,
        references,
    }
}

fn compare_pair(
    reference: &InstanceRecord,
    test: &InstanceRecord,
    test_index: usize,
    exclusions: &ExclusionSet,
) -> PairComparison {
    let properties = reference
        .fields()
        .filter(|(name, _)| *name != PROPERTY_KEY && !exclusions.contains(name))
        .map(|(name, reference_value)| {
            let test_value = test.get(name);
            PropertyComparison {
                name: name.to_string(),
                reference_value: reference_value.to_string(),
                test_value: test_value.map(str::to_string),
                matched: test_value == Some(reference_value),
            }
        })
        .collect();

    PairComparison {
        test_index,
        reference_device: reference.device_name().to_string(),
        reference_model: reference.device_type().to_string(),
        test_device: test.device_name().to_string(),
        test_model: test.device_type().to_string(),
        properties,
    }
}
