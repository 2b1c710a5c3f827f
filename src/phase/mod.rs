//! Phase input definitions and plan file loading

mod data;
pub mod loader;

pub use data::{PhaseSpec, MONTHS_PER_YEAR};
pub use loader::{load_phases_from_csv, load_phases_from_json, load_plan, MAX_DURATION_MONTHS};
