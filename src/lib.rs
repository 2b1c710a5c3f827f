//! Corpus Planner - Multi-phase projection engine for SIP, lumpsum and SWP plans
//!
//! This library provides:
//! - Month-by-month ledger simulation of a single phase
//! - Multi-phase plans with balance rollover between phases
//! - Yearly aggregates, plan totals and a money-weighted return
//! - CSV / JSON plan loading and parallel scenario sweeps

pub mod error;
pub mod phase;
pub mod projection;
pub mod plan;
pub mod scenario;

// Re-export commonly used types
pub use error::{InvalidParameterError, LoadError};
pub use phase::PhaseSpec;
pub use projection::{simulate_phase, LedgerRow, PhaseResult, ProjectionConfig, ProjectionEngine, YearlyRow};
pub use plan::{run_plan, Plan, PlanResult};
pub use scenario::ScenarioRunner;
