//! Phase orchestration: sequence phases into one plan
//!
//! Each phase is an independent simulation seeded with a single scalar, the
//! final balance of the phase before it. Nothing else crosses phase
//! boundaries, so a plan is fully reproducible from its ordered phase list.

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::InvalidParameterError;
use crate::phase::PhaseSpec;
use crate::projection::{money_weighted_return, PhaseResult, ProjectionEngine};

/// Where a plan's balance first went negative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Depletion {
    pub phase_index: usize,
    /// Month within the phase (1-indexed)
    pub month: u32,
    /// Month within the plan (1-indexed)
    pub plan_month: u32,
}

/// Complete result for an ordered sequence of phases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResult {
    pub phases: Vec<PhaseResult>,
    pub total_months: u32,

    /// Lumpsums plus SIP contributions across all phases
    pub total_invested: f64,

    pub total_withdrawn: f64,
    pub total_growth: f64,
    pub final_balance: f64,
    pub depletion: Option<Depletion>,

    /// Annualized IRR of the investor's cash flows
    pub money_weighted_return: Option<f64>,
}

impl PlanResult {
    fn from_phases(phases: Vec<PhaseResult>, money_weighted_return: Option<f64>) -> Self {
        let depletion = phases.iter().find_map(|p| {
            p.depletion_month.map(|month| Depletion {
                phase_index: p.phase_index,
                month,
                plan_month: p.plan_month_offset + month,
            })
        });

        Self {
            total_months: phases.iter().map(|p| p.duration_months).sum(),
            total_invested: phases.iter().map(|p| p.total_invested).sum(),
            total_withdrawn: phases.iter().map(|p| p.total_withdrawn).sum(),
            total_growth: phases.iter().map(|p| p.total_growth).sum(),
            final_balance: phases.last().map(|p| p.final_balance).unwrap_or(0.0),
            depletion,
            money_weighted_return,
            phases,
        }
    }

    /// Whether withdrawals outran the balance at any point
    pub fn is_sustainable(&self) -> bool {
        self.depletion.is_none()
    }
}

/// Run phases in order with the default engine
pub fn run_plan(phases: &[PhaseSpec]) -> Result<PlanResult, InvalidParameterError> {
    run_plan_with(&ProjectionEngine::default(), phases)
}

/// Run phases in order, threading each final balance into the next phase
///
/// Every phase is validated before any simulation starts; the first
/// invalid phase's error is returned unchanged.
pub fn run_plan_with(
    engine: &ProjectionEngine,
    phases: &[PhaseSpec],
) -> Result<PlanResult, InvalidParameterError> {
    if phases.is_empty() {
        return Err(InvalidParameterError::new(
            "phases",
            "a plan needs at least one phase",
        ));
    }
    for spec in phases {
        spec.validate()?;
    }

    let mut results: Vec<PhaseResult> = Vec::with_capacity(phases.len());
    let mut carried_balance = 0.0;
    let mut plan_month_offset = 0;

    for (index, spec) in phases.iter().enumerate() {
        let result = engine.project_phase(index, spec, carried_balance, plan_month_offset);

        carried_balance = result.final_balance;
        plan_month_offset += result.duration_months;
        results.push(result);
    }

    // The IRR needs the monthly rows, so it is taken before they are dropped
    let mwrr = money_weighted_return(&results);
    if !engine.config().detailed_output {
        results.iter_mut().for_each(PhaseResult::discard_ledger);
    }

    let plan = PlanResult::from_phases(results, mwrr);
    info!(
        "plan: {} phases over {} months, invested {:.2}, withdrawn {:.2}, final balance {:.2}",
        plan.phases.len(),
        plan.total_months,
        plan.total_invested,
        plan.total_withdrawn,
        plan.final_balance
    );

    Ok(plan)
}

/// The working set of phases a caller edits between calculations
///
/// Owned by the caller and passed in explicitly; every `run` recomputes
/// the whole plan from scratch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    phases: Vec<PhaseSpec>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_phases(phases: Vec<PhaseSpec>) -> Self {
        Self { phases }
    }

    pub fn phases(&self) -> &[PhaseSpec] {
        &self.phases
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Append a phase at the end of the plan
    pub fn push(&mut self, spec: PhaseSpec) {
        self.phases.push(spec);
    }

    /// Insert a phase before position `index` (`index == len` appends)
    pub fn insert(&mut self, index: usize, spec: PhaseSpec) -> Result<(), InvalidParameterError> {
        if index > self.phases.len() {
            return Err(out_of_range(index, self.phases.len() + 1));
        }
        self.phases.insert(index, spec);
        Ok(())
    }

    /// Swap in new parameters for one phase, returning the old ones
    pub fn replace(&mut self, index: usize, spec: PhaseSpec) -> Result<PhaseSpec, InvalidParameterError> {
        let len = self.phases.len();
        let slot = self.phases.get_mut(index).ok_or_else(|| out_of_range(index, len))?;
        Ok(std::mem::replace(slot, spec))
    }

    pub fn remove(&mut self, index: usize) -> Result<PhaseSpec, InvalidParameterError> {
        if index >= self.phases.len() {
            return Err(out_of_range(index, self.phases.len()));
        }
        Ok(self.phases.remove(index))
    }

    pub fn clear(&mut self) {
        self.phases.clear();
    }

    pub fn run(&self) -> Result<PlanResult, InvalidParameterError> {
        run_plan(&self.phases)
    }

    pub fn run_with(&self, engine: &ProjectionEngine) -> Result<PlanResult, InvalidParameterError> {
        run_plan_with(engine, &self.phases)
    }
}

fn out_of_range(index: usize, len: usize) -> InvalidParameterError {
    InvalidParameterError::new(
        "phase_index",
        format!("{} is out of range for {} positions", index, len),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ProjectionConfig;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn three_phase_plan() -> Vec<PhaseSpec> {
        vec![
            PhaseSpec::new(120, 12.0)
                .with_label("Accumulation")
                .with_sip(10_000.0, 10.0)
                .with_lumpsum(100_000.0),
            PhaseSpec::new(60, 9.0).with_lumpsum(500_000.0).with_sip(15_000.0, 0.0),
            PhaseSpec::new(300, 7.0).with_label("Retirement").with_withdrawal(60_000.0, 1),
        ]
    }

    #[test]
    fn test_rollover_continuity() {
        let specs = three_phase_plan();
        let plan = run_plan(&specs).unwrap();

        assert_eq!(plan.phases.len(), 3);
        assert_eq!(plan.phases[0].starting_balance, specs[0].additional_lumpsum);
        assert_eq!(plan.phases[0].rollover_balance, 0.0);

        for i in 0..plan.phases.len() - 1 {
            let expected = plan.phases[i].final_balance + specs[i + 1].additional_lumpsum;
            assert_eq!(plan.phases[i + 1].starting_balance, expected);
            assert_eq!(plan.phases[i + 1].ledger[0].opening_balance, expected);
        }
    }

    #[test]
    fn test_recurrence_across_all_phases() {
        let plan = run_plan(&three_phase_plan()).unwrap();

        for phase in &plan.phases {
            for row in &phase.ledger {
                let expected = row.opening_balance + row.contribution - row.withdrawal + row.growth;
                assert_abs_diff_eq!(row.closing_balance, expected, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_plan_totals_and_timeline() {
        let plan = run_plan(&three_phase_plan()).unwrap();

        assert_eq!(plan.total_months, 480);
        assert_eq!(plan.phases[1].plan_month_offset, 120);
        assert_eq!(plan.phases[2].ledger[0].plan_month, 181);
        // Phase 2's first year is year 11 of the plan
        assert_eq!(plan.phases[1].yearly[0].plan_year, 11);
        assert_eq!(plan.phases[2].yearly.len(), 25);

        let invested: f64 = plan.phases.iter().map(|p| p.total_invested).sum();
        assert_relative_eq!(plan.total_invested, invested);
        assert_relative_eq!(plan.final_balance, plan.phases[2].final_balance);
        assert_relative_eq!(plan.total_withdrawn, 60_000.0 * 300.0);
    }

    #[test]
    fn test_yearly_row_balances() {
        let plan = run_plan(&three_phase_plan()).unwrap();
        let phase = &plan.phases[0];

        for (year, row) in phase.yearly.iter().enumerate() {
            let last_month = (year + 1) * 12;
            assert_eq!(row.closing_balance, phase.ledger[last_month - 1].closing_balance);
            // invested + growth - withdrawn reconstructs the balance
            assert_relative_eq!(
                row.closing_balance,
                phase.rollover_balance + row.invested_to_date + row.net_gain_to_date - row.withdrawn_to_date,
                max_relative = 1e-9
            );
        }
    }

    #[test]
    fn test_unsustainable_plan_is_reported_not_rejected() {
        let specs = vec![
            PhaseSpec::new(24, 8.0).with_lumpsum(200_000.0),
            PhaseSpec::new(36, 6.0).with_withdrawal(20_000.0, 1),
            PhaseSpec::new(12, 6.0).with_sip(5_000.0, 0.0),
        ];
        let plan = run_plan(&specs).unwrap();

        let depletion = plan.depletion.expect("plan should deplete");
        assert_eq!(depletion.phase_index, 1);
        assert_eq!(depletion.plan_month, 24 + depletion.month);
        assert!(!plan.is_sustainable());

        // The deficit rolls into the next phase unchanged
        assert!(plan.phases[1].final_balance < 0.0);
        assert_eq!(plan.phases[2].rollover_balance, plan.phases[1].final_balance);
        assert_eq!(plan.phases[2].ledger.len(), 12);
    }

    #[test]
    fn test_fails_fast_on_invalid_phase() {
        let mut specs = three_phase_plan();
        specs[2] = PhaseSpec::new(300, 7.0).with_withdrawal(60_000.0, 301);

        let err = run_plan(&specs).unwrap_err();
        assert_eq!(err.field, "withdrawal_start_month");
        assert_eq!(err, specs[2].validate().unwrap_err());

        assert_eq!(run_plan(&[]).unwrap_err().field, "phases");
    }

    #[test]
    fn test_summary_only_engine() {
        let engine = ProjectionEngine::new(ProjectionConfig { detailed_output: false });
        let detailed = run_plan(&three_phase_plan()).unwrap();
        let summary = run_plan_with(&engine, &three_phase_plan()).unwrap();

        assert!(summary.phases.iter().all(|p| p.ledger.is_empty()));
        assert_eq!(summary.final_balance, detailed.final_balance);
        assert_eq!(summary.money_weighted_return, detailed.money_weighted_return);
        assert_eq!(summary.phases[0].yearly, detailed.phases[0].yearly);
    }

    #[test]
    fn test_single_rate_plan_mwrr() {
        let specs = vec![
            PhaseSpec::new(36, 10.0).with_sip(1_000.0, 5.0).with_lumpsum(25_000.0),
            PhaseSpec::new(24, 10.0).with_withdrawal(500.0, 1),
        ];
        let plan = run_plan(&specs).unwrap();
        assert_abs_diff_eq!(plan.money_weighted_return.unwrap(), 0.10, epsilon = 1e-6);
    }

    #[test]
    fn test_plan_editing_recomputes() {
        let mut plan = Plan::from_phases(three_phase_plan());
        let before = plan.run().unwrap();

        let old = plan
            .replace(1, PhaseSpec::new(60, 9.0).with_lumpsum(0.0).with_sip(15_000.0, 0.0))
            .unwrap();
        assert_eq!(old.additional_lumpsum, 500_000.0);
        let after = plan.run().unwrap();

        assert_eq!(after.phases[0].final_balance, before.phases[0].final_balance);
        assert!(after.final_balance < before.final_balance);

        plan.remove(2).unwrap();
        assert_eq!(plan.len(), 2);
        assert!(plan.insert(5, PhaseSpec::new(12, 5.0)).is_err());
        plan.insert(0, PhaseSpec::new(12, 5.0).with_lumpsum(1_000.0)).unwrap();
        assert_eq!(plan.run().unwrap().phases.len(), 3);

        plan.clear();
        assert!(plan.is_empty());
        assert!(plan.run().is_err());
    }

    #[test]
    fn test_plan_serializes_as_phase_document() {
        let plan = Plan::from_phases(three_phase_plan());
        let json = serde_json::to_string(&plan).unwrap();

        let loaded = crate::phase::load_phases_from_json(json.as_bytes()).unwrap();
        assert_eq!(loaded, plan.phases());
    }
}
