//! Internal Rate of Return (IRR) calculation
//!
//! Used to calculate the money-weighted return of a plan from its ledger

use super::ledger::PhaseResult;

/// Calculate the Internal Rate of Return (IRR) for a series of cash flows
/// using the Newton-Raphson method.
///
/// # Arguments
/// * `cashflows` - Vector of cash flows (positive = inflow, negative = outflow)
/// * `periods_per_year` - Number of periods per year (12 for monthly)
///
/// # Returns
/// * `Option<f64>` - Annual IRR as a decimal (e.g., 0.05 for 5%), or None if no solution found
pub fn calculate_irr(cashflows: &[f64], periods_per_year: u32) -> Option<f64> {
    if cashflows.is_empty() {
        return None;
    }

    if cashflows.iter().all(|&cf| cf.abs() < 1e-10) {
        return Some(0.0);
    }

    // IRR needs at least one sign change
    let has_positive = cashflows.iter().any(|&cf| cf > 1e-10);
    let has_negative = cashflows.iter().any(|&cf| cf < -1e-10);
    if !has_positive || !has_negative {
        return None;
    }

    // Newton-Raphson on the periodic rate
    let mut rate = 0.05 / periods_per_year as f64;
    let tolerance = 1e-10;
    let max_iterations = 1000;

    for _ in 0..max_iterations {
        let (npv, dnpv) = npv_and_derivative(cashflows, rate);

        if dnpv.abs() < 1e-20 {
            return calculate_irr_bisection(cashflows, periods_per_year);
        }

        let new_rate = (rate - npv / dnpv).clamp(-0.99, 10.0);

        if (new_rate - rate).abs() < tolerance {
            return Some(annualize(new_rate, periods_per_year));
        }

        rate = new_rate;
    }

    calculate_irr_bisection(cashflows, periods_per_year)
}

fn annualize(periodic_rate: f64, periods_per_year: u32) -> f64 {
    (1.0 + periodic_rate).powi(periods_per_year as i32) - 1.0
}

/// Calculate NPV and its derivative with respect to rate
fn npv_and_derivative(cashflows: &[f64], rate: f64) -> (f64, f64) {
    let mut npv = 0.0;
    let mut dnpv = 0.0;

    for (t, &cf) in cashflows.iter().enumerate() {
        let discount = (1.0 + rate).powi(t as i32);
        npv += cf / discount;
        if t > 0 {
            dnpv -= (t as f64) * cf / (discount * (1.0 + rate));
        }
    }

    (npv, dnpv)
}

/// Fallback IRR calculation using bisection method
fn calculate_irr_bisection(cashflows: &[f64], periods_per_year: u32) -> Option<f64> {
    let mut low = -0.99_f64;
    let mut high = 10.0_f64;
    let tolerance = 1e-10;
    let max_iterations = 1000;

    let mut npv_low = npv_at_rate(cashflows, low);
    let npv_high = npv_at_rate(cashflows, high);

    if npv_low * npv_high > 0.0 {
        return None;
    }

    for _ in 0..max_iterations {
        let mid = (low + high) / 2.0;
        let npv_mid = npv_at_rate(cashflows, mid);

        if npv_mid.abs() < tolerance || (high - low) / 2.0 < tolerance {
            return Some(annualize(mid, periods_per_year));
        }

        if npv_mid * npv_low < 0.0 {
            high = mid;
        } else {
            low = mid;
            npv_low = npv_mid;
        }
    }

    None
}

/// Calculate NPV at a given periodic rate
fn npv_at_rate(cashflows: &[f64], rate: f64) -> f64 {
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}

/// Investor-side monthly cash flows for a sequence of phases
///
/// Index t is the start of plan month t+1: lumpsums and contributions are
/// outflows, withdrawals inflows. The final balance lands at the end of the
/// last month. Rollovers between phases are internal and produce no flow.
/// Phases must still carry their monthly ledger.
pub fn investor_cashflows(phases: &[PhaseResult]) -> Vec<f64> {
    let total_months: usize = phases.iter().map(|p| p.ledger.len()).sum();
    let mut flows = vec![0.0; total_months + 1];

    for phase in phases {
        for row in &phase.ledger {
            let t = (row.plan_month - 1) as usize;
            flows[t] += row.withdrawal - row.contribution;
            if row.month == 1 {
                flows[t] -= phase.lumpsum_invested;
            }
        }
    }

    if let Some(last) = phases.last() {
        flows[total_months] += last.final_balance;
    }

    flows
}

/// Money-weighted annual return of a plan's monthly cash flows
pub fn money_weighted_return(phases: &[PhaseResult]) -> Option<f64> {
    calculate_irr(&investor_cashflows(phases), 12)
}
