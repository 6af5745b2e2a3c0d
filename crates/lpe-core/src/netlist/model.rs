use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

pub const PROPERTY_KEY: &str = "PROPERTY";
pub const DEVICE_TYPE_KEY: &str = "device_type";
pub const NUM_OF_PORTS_KEY: &str = "num_of_ports";

/// Built-in exclusions for OA-vs-SPF comparison. Silicon-adjusted sizes and
/// placement keys are not carried by the OA netlist.
pub const OA_BUILTIN_EXCLUSIONS: [&str; 6] = ["si_w", "si_l", "x", "y", "angle", PROPERTY_KEY];

/// One device entry of a netlist: property name to raw string value, in the
/// order the properties first appeared on the source line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstanceRecord {
    fields: IndexMap<String, String>,
}

impl InstanceRecord {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::default();
        for (name, value) in pairs {
            record.insert(name, value);
        }
        record
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn device_name(&self) -> &str {
        self.get(PROPERTY_KEY).unwrap_or_default()
    }

    pub fn device_type(&self) -> &str {
        self.get(DEVICE_TYPE_KEY).unwrap_or_default()
    }

    pub fn num_of_ports(&self) -> Option<i64> {
        self.get(NUM_OF_PORTS_KEY)?.parse().ok()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Property names skipped during field comparison.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExclusionSet {
    names: BTreeSet<String>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for name in names {
            set.insert(name);
        }
        set
    }

    /// Parses a comma-separated list, dropping empty entries.
    pub fn from_list(list: &str) -> Self {
        Self::from_names(
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty()),
        )
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn with_oa_builtins(&self) -> Self {
        let mut set = self.clone();
        for name in OA_BUILTIN_EXCLUSIONS {
            set.insert(name);
        }
        set
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Display for ExclusionSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for name in &self.names {
            write!(f, "{} ", name)?;
        }
        Ok(())
    }
}
