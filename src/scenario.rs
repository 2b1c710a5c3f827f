//! Scenario runner for batch plan projections
//!
//! Holds a base plan and runs variations of it (or unrelated plans) in
//! parallel. Each scenario owns its inputs, so no coordination is needed.

use log::debug;
use rayon::prelude::*;

use crate::error::InvalidParameterError;
use crate::phase::PhaseSpec;
use crate::plan::{run_plan_with, PlanResult};
use crate::projection::{ProjectionConfig, ProjectionEngine};

/// Outcome of one scenario; failures stay per scenario
pub type ScenarioResult = Result<PlanResult, InvalidParameterError>;

/// Pre-configured scenario runner for batch projections
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::new(phases);
///
/// // Same plan under different return assumptions
/// let results = runner.run_return_sweep(&[6.0, 8.0, 10.0, 12.0]);
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    base_phases: Vec<PhaseSpec>,
    engine: ProjectionEngine,
}

impl ScenarioRunner {
    /// Create runner for a base plan; scenarios keep yearly rows but not
    /// monthly ledgers
    pub fn new(base_phases: Vec<PhaseSpec>) -> Self {
        Self::with_config(base_phases, ProjectionConfig { detailed_output: false })
    }

    pub fn with_config(base_phases: Vec<PhaseSpec>, config: ProjectionConfig) -> Self {
        Self {
            base_phases,
            engine: ProjectionEngine::new(config),
        }
    }

    /// Run the base plan unchanged
    pub fn run(&self) -> ScenarioResult {
        run_plan_with(&self.engine, &self.base_phases)
    }

    /// Run the base plan with every phase's return replaced
    pub fn run_with_return(&self, annual_return_percent: f64) -> ScenarioResult {
        let phases: Vec<PhaseSpec> = self
            .base_phases
            .iter()
            .cloned()
            .map(|mut p| {
                p.annual_return_percent = annual_return_percent;
                p
            })
            .collect();
        run_plan_with(&self.engine, &phases)
    }

    /// Run the base plan once per return rate, results in input order
    pub fn run_return_sweep(&self, annual_returns: &[f64]) -> Vec<ScenarioResult> {
        debug!("running {} return scenarios", annual_returns.len());
        annual_returns
            .par_iter()
            .map(|&rate| self.run_with_return(rate))
            .collect()
    }

    /// Run unrelated plans with this runner's engine config
    pub fn run_batch(&self, plans: &[Vec<PhaseSpec>]) -> Vec<ScenarioResult> {
        plans
            .par_iter()
            .map(|phases| run_plan_with(&self.engine, phases))
            .collect()
    }

    pub fn base_phases(&self) -> &[PhaseSpec] {
        &self.base_phases
    }
}

/// Evenly spaced return rates from `from` to `to` inclusive
pub fn return_grid(from: f64, to: f64, step: f64) -> Result<Vec<f64>, InvalidParameterError> {
    if !(step.is_finite() && step > 0.0) {
        return Err(InvalidParameterError::new(
            "step",
            format!("must be a positive number, got {}", step),
        ));
    }
    if !(from.is_finite() && to.is_finite()) || to < from {
        return Err(InvalidParameterError::new(
            "to",
            format!("range {}..={} is empty or not finite", from, to),
        ));
    }

    // Half a step of slack so float drift does not drop the last point
    let count = ((to - from) / step + 0.5).floor() as usize + 1;
    Ok((0..count).map(|i| from + step * i as f64).collect())
}
