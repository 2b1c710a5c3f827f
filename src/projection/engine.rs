//! Core ledger engine for monthly phase simulations

use log::{debug, warn};

use super::ledger::{LedgerRow, PhaseResult};
use super::state::LedgerState;
use crate::error::InvalidParameterError;
use crate::phase::PhaseSpec;

/// Configuration for a projection run
#[derive(Debug, Clone)]
pub struct ProjectionConfig {
    /// Whether to keep monthly ledger rows in phase results
    pub detailed_output: bool,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            detailed_output: true,
        }
    }
}

/// Main projection engine
///
/// Holds no state between calls; every projection works on its own inputs.
#[derive(Debug, Clone, Default)]
pub struct ProjectionEngine {
    config: ProjectionConfig,
}

impl ProjectionEngine {
    /// Create a new projection engine with given config
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Simulate one validated phase month by month
    ///
    /// `carried_balance` is the balance before the phase lumpsum is added and
    /// may be negative when a deficit rolls over from a depleted phase.
    pub fn simulate(&self, spec: &PhaseSpec, carried_balance: f64, plan_month_offset: u32) -> Vec<LedgerRow> {
        let monthly_rate = spec.monthly_rate();
        let mut state = LedgerState::from_phase(spec, carried_balance);
        let mut ledger = Vec::with_capacity(spec.duration_months as usize);

        for _month in 1..=spec.duration_months {
            // Advance state to next month
            state.advance_month(spec);

            let row = self.calculate_month(spec, &mut state, monthly_rate, plan_month_offset);
            ledger.push(row);
        }

        ledger
    }

    /// Calculate flows for a single month
    ///
    /// Order: add contribution, subtract withdrawal, then grow the result so
    /// new money earns alongside the existing balance.
    fn calculate_month(
        &self,
        spec: &PhaseSpec,
        state: &mut LedgerState,
        monthly_rate: f64,
        plan_month_offset: u32,
    ) -> LedgerRow {
        let contribution = state.current_contribution;
        let withdrawal = if spec.withdraws_in_month(state.month) {
            spec.withdrawal_amount
        } else {
            0.0
        };

        let base = state.opening_balance + contribution - withdrawal;
        let growth = base * monthly_rate;
        let closing_balance = base + growth;

        state.closing_balance = closing_balance;

        LedgerRow {
            month: state.month,
            plan_month: plan_month_offset + state.month,
            opening_balance: state.opening_balance,
            contribution,
            withdrawal,
            growth,
            closing_balance,
        }
    }

    /// Run a validated phase and summarize it
    ///
    /// Always returns the full ledger; callers drop it per `detailed_output`
    /// once they have read what they need.
    pub fn project_phase(
        &self,
        phase_index: usize,
        spec: &PhaseSpec,
        carried_balance: f64,
        plan_month_offset: u32,
    ) -> PhaseResult {
        let label = spec.display_label(phase_index);
        debug!(
            "{}: {} months from carried balance {:.2} plus lumpsum {:.2}",
            label, spec.duration_months, carried_balance, spec.additional_lumpsum
        );

        let ledger = self.simulate(spec, carried_balance, plan_month_offset);
        let result = PhaseResult::from_ledger(
            phase_index,
            label,
            plan_month_offset,
            carried_balance,
            spec.additional_lumpsum,
            ledger,
        );

        if let Some(month) = result.depletion_month {
            warn!(
                "{}: balance turns negative in month {} (withdrawal {:.2}/month, low point {:.2})",
                result.label, month, spec.withdrawal_amount, result.min_balance
            );
        }
        debug!("{}: final balance {:.2}", result.label, result.final_balance);

        result
    }
}

/// Simulate one phase from a non-negative opening balance
///
/// The phase lumpsum is added on top of `opening_balance` in month 1. Returns
/// one row per month; balances that go negative are reported as-is.
pub fn simulate_phase(spec: &PhaseSpec, opening_balance: f64) -> Result<Vec<LedgerRow>, InvalidParameterError> {
    if !opening_balance.is_finite() || opening_balance < 0.0 {
        return Err(InvalidParameterError::new(
            "opening_balance",
            format!("must be a non-negative amount, got {}", opening_balance),
        ));
    }
    spec.validate()?;

    Ok(ProjectionEngine::default().simulate(spec, opening_balance, 0))
}
