//! Running balance state for a single phase

use crate::phase::PhaseSpec;

/// State of a phase at a point in time during simulation
#[derive(Debug, Clone)]
pub struct LedgerState {
    /// Current phase month (1-indexed, 0 before the first month)
    pub month: u32,

    /// Phase year (1-indexed)
    pub phase_year: u32,

    /// Month within phase year (1-12)
    pub month_in_year: u32,

    /// Balance at the start of the current month
    pub opening_balance: f64,

    /// Balance at the end of the current month
    pub closing_balance: f64,

    /// SIP amount in effect, after any step-ups so far
    pub current_contribution: f64,

    /// Lumpsum still to be injected (consumed in month 1)
    pub pending_lumpsum: f64,
}

impl LedgerState {
    /// Initialize state from a phase and the balance carried into it
    pub fn from_phase(spec: &PhaseSpec, carried_balance: f64) -> Self {
        Self {
            month: 0,
            phase_year: 1,
            month_in_year: 0,
            opening_balance: carried_balance,
            closing_balance: carried_balance,
            current_contribution: spec.monthly_contribution,
            pending_lumpsum: spec.additional_lumpsum,
        }
    }

    /// Advance to next month
    pub fn advance_month(&mut self, spec: &PhaseSpec) {
        self.month += 1;
        self.phase_year = spec.year_of_month(self.month);
        self.month_in_year = spec.month_in_year(self.month);

        // Step-up compounds on the current level at each new 12-month block
        if self.month_in_year == 1 && self.phase_year > 1 {
            self.current_contribution *= spec.step_up_factor();
        }

        // Opening comes from prior closing; the lumpsum joins month 1's base
        self.opening_balance = self.closing_balance + std::mem::take(&mut self.pending_lumpsum);
    }
}
