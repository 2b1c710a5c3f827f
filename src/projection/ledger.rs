//! Ledger output structures for phase simulations

use serde::{Deserialize, Serialize};

use crate::phase::MONTHS_PER_YEAR;

/// A single row of ledger output for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    /// Month within the phase (1-indexed)
    pub month: u32,

    /// Month within the whole plan (1-indexed)
    pub plan_month: u32,

    /// Start-of-month balance; month 1 includes the phase lumpsum
    pub opening_balance: f64,

    pub contribution: f64,
    pub withdrawal: f64,
    pub growth: f64,

    /// opening + contribution - withdrawal + growth, never clamped
    pub closing_balance: f64,
}

/// Year-level aggregate of up to 12 ledger rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyRow {
    /// Year within the phase (1-indexed)
    pub year: u32,

    /// Year on the cumulative plan timeline (1-indexed)
    pub plan_year: u32,

    /// Rows in this bucket (12 except for a trailing partial year)
    pub months: u32,

    pub contributed: f64,
    pub withdrawn: f64,
    pub growth: f64,

    /// Phase lumpsum plus SIP contributions up to year end
    pub invested_to_date: f64,

    pub withdrawn_to_date: f64,

    /// Cumulative growth since phase start
    pub net_gain_to_date: f64,

    pub closing_balance: f64,
}

/// Complete result for one phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseResult {
    /// Position of the phase within the plan (0-indexed)
    pub phase_index: usize,

    pub label: String,

    /// Plan month before this phase's first month
    pub plan_month_offset: u32,

    pub duration_months: u32,

    /// Balance rolled over from the previous phase
    pub rollover_balance: f64,

    /// New money injected at phase start
    pub lumpsum_invested: f64,

    /// rollover_balance + lumpsum_invested
    pub starting_balance: f64,

    /// Sum of SIP contributions
    pub total_contributed: f64,

    /// lumpsum_invested + total_contributed
    pub total_invested: f64,

    pub total_withdrawn: f64,
    pub total_growth: f64,
    pub final_balance: f64,

    /// Lowest closing balance in the phase
    pub min_balance: f64,

    /// First phase month whose closing balance is negative
    pub depletion_month: Option<u32>,

    pub yearly: Vec<YearlyRow>,

    /// Monthly rows (empty when detailed output is disabled)
    pub ledger: Vec<LedgerRow>,
}

impl PhaseResult {
    /// Build a phase result from its full monthly ledger
    pub fn from_ledger(
        phase_index: usize,
        label: String,
        plan_month_offset: u32,
        rollover_balance: f64,
        lumpsum_invested: f64,
        ledger: Vec<LedgerRow>,
    ) -> Self {
        let total_contributed: f64 = ledger.iter().map(|r| r.contribution).sum();
        let total_withdrawn: f64 = ledger.iter().map(|r| r.withdrawal).sum();
        let total_growth: f64 = ledger.iter().map(|r| r.growth).sum();

        let starting_balance = rollover_balance + lumpsum_invested;
        let final_balance = ledger.last().map(|r| r.closing_balance).unwrap_or(starting_balance);
        let min_balance = ledger
            .iter()
            .map(|r| r.closing_balance)
            .fold(f64::INFINITY, f64::min)
            .min(final_balance);
        let depletion_month = ledger
            .iter()
            .find(|r| r.closing_balance < 0.0)
            .map(|r| r.month);

        let yearly = aggregate_years(&ledger, lumpsum_invested, plan_month_offset);

        Self {
            phase_index,
            label,
            plan_month_offset,
            duration_months: ledger.len() as u32,
            rollover_balance,
            lumpsum_invested,
            starting_balance,
            total_contributed,
            total_invested: lumpsum_invested + total_contributed,
            total_withdrawn,
            total_growth,
            final_balance,
            min_balance,
            depletion_month,
            yearly,
            ledger,
        }
    }

    /// Whether the balance went negative at any point
    pub fn is_depleted(&self) -> bool {
        self.depletion_month.is_some()
    }

    /// Drop the monthly rows, keeping totals and yearly aggregates
    pub fn discard_ledger(&mut self) {
        self.ledger = Vec::new();
    }
}

/// Aggregate monthly rows into 12-row year buckets
///
/// A trailing partial bucket is emitted when the row count is not a
/// multiple of 12. The year-end balance is the last row's closing balance.
pub fn aggregate_years(
    ledger: &[LedgerRow],
    lumpsum_invested: f64,
    plan_month_offset: u32,
) -> Vec<YearlyRow> {
    let mut yearly = Vec::with_capacity(ledger.len().div_ceil(MONTHS_PER_YEAR as usize));
    let mut invested_to_date = lumpsum_invested;
    let mut withdrawn_to_date = 0.0;
    let mut net_gain_to_date = 0.0;

    for (i, bucket) in ledger.chunks(MONTHS_PER_YEAR as usize).enumerate() {
        let contributed: f64 = bucket.iter().map(|r| r.contribution).sum();
        let withdrawn: f64 = bucket.iter().map(|r| r.withdrawal).sum();
        let growth: f64 = bucket.iter().map(|r| r.growth).sum();

        invested_to_date += contributed;
        withdrawn_to_date += withdrawn;
        net_gain_to_date += growth;

        // chunks() never yields an empty slice
        let last = &bucket[bucket.len() - 1];
        let plan_month = plan_month_offset + last.month;

        yearly.push(YearlyRow {
            year: i as u32 + 1,
            plan_year: (plan_month - 1) / MONTHS_PER_YEAR + 1,
            months: bucket.len() as u32,
            contributed,
            withdrawn,
            growth,
            invested_to_date,
            withdrawn_to_date,
            net_gain_to_date,
            closing_balance: last.closing_balance,
        });
    }

    yearly
}
