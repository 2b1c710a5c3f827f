//! Monthly ledger engine for single-phase projections

mod state;
mod engine;
mod ledger;
pub mod irr;

pub use state::LedgerState;
pub use engine::{simulate_phase, ProjectionConfig, ProjectionEngine};
pub use ledger::{aggregate_years, LedgerRow, PhaseResult, YearlyRow};
pub use irr::{calculate_irr, investor_cashflows, money_weighted_return};
