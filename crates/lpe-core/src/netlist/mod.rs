//! Device records extracted from SPF netlists and OA-derived spectre netlists.

pub mod model;
pub mod parser;

pub use model::{
    DEVICE_TYPE_KEY, ExclusionSet, InstanceRecord, NUM_OF_PORTS_KEY, OA_BUILTIN_EXCLUSIONS,
    PROPERTY_KEY,
};
pub use parser::{
    LineFault, NetlistError, normalize_line_continuations, parse_instance_line, parse_oa_devices,
    parse_spf_instances, read_oa_devices, read_spf_instances, records_from_lines,
};
