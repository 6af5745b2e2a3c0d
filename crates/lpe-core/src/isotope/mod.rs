//! Isotope checks: a re-extracted netlist must describe the same devices, at
//! the same places, with the same properties as a golden one.

pub mod gate;
pub mod matcher;
pub mod report;
pub mod run_log;
pub mod runner;

pub use gate::{DEGENERATE_PERIPHERY, GATED_PROPERTIES, ped_pes_check};
pub use matcher::{
    GeometricKey, InstanceComparison, MatchStrategy, PairComparison, PropertyComparison,
    ReferenceOutcome, compare_instances,
};
pub use report::{log_comparison, render_oa_report, render_property_match_report};
pub use run_log::capture_to_file;
pub use runner::{
    IsotopeDirective, IsotopeError, IsotopeOutcome, OaIsotopeConfig, SpfIsotopeConfig,
    run_oa_isotope, run_spf_isotope,
};
