//! Post-extraction checks for parasitic extraction flows: device-level
//! isotope comparison of extracted netlists and tolerance comparison of
//! pre-layout vs post-layout simulation results.

pub mod domain;
pub mod isotope;
pub mod netlist;
pub mod polo;
pub mod scenario;
