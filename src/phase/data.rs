//! Phase parameter structures

use serde::{Deserialize, Serialize};

use crate::error::InvalidParameterError;

/// Months per phase year
pub const MONTHS_PER_YEAR: u32 = 12;

/// Default withdrawal start month (withdraw from the first month)
fn default_withdrawal_start_month() -> u32 {
    1
}

/// Parameters for one phase of an investment plan
///
/// A phase combines a monthly contribution (SIP) with an optional annual
/// step-up, a one-time lumpsum injected at phase start, and an optional
/// monthly withdrawal (SWP), all against a single balance compounding at
/// `annual_return_percent`. Percentages are expressed as percent (12.0 = 12%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSpec {
    /// Free-text name shown in reports
    #[serde(default)]
    pub label: Option<String>,

    /// Monthly SIP amount
    #[serde(default)]
    pub monthly_contribution: f64,

    /// Annual compounding increase applied to the SIP amount
    #[serde(default)]
    pub annual_step_up_percent: f64,

    /// New money injected at the start of the phase
    #[serde(default)]
    pub additional_lumpsum: f64,

    /// Nominal annual return
    pub annual_return_percent: f64,

    /// Phase length in months
    pub duration_months: u32,

    /// Monthly SWP amount (0 = no withdrawals)
    #[serde(default)]
    pub withdrawal_amount: f64,

    /// 1-indexed month within the phase when withdrawals begin
    #[serde(default = "default_withdrawal_start_month")]
    pub withdrawal_start_month: u32,
}

impl PhaseSpec {
    /// Create a phase with no cash flows; add them with the `with_*` methods
    pub fn new(duration_months: u32, annual_return_percent: f64) -> Self {
        Self {
            label: None,
            monthly_contribution: 0.0,
            annual_step_up_percent: 0.0,
            additional_lumpsum: 0.0,
            annual_return_percent,
            duration_months,
            withdrawal_amount: 0.0,
            withdrawal_start_month: default_withdrawal_start_month(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Monthly contribution with an annual step-up percentage
    pub fn with_sip(mut self, monthly_contribution: f64, annual_step_up_percent: f64) -> Self {
        self.monthly_contribution = monthly_contribution;
        self.annual_step_up_percent = annual_step_up_percent;
        self
    }

    pub fn with_lumpsum(mut self, additional_lumpsum: f64) -> Self {
        self.additional_lumpsum = additional_lumpsum;
        self
    }

    /// Monthly withdrawal starting at `start_month` (1-indexed)
    pub fn with_withdrawal(mut self, withdrawal_amount: f64, start_month: u32) -> Self {
        self.withdrawal_amount = withdrawal_amount;
        self.withdrawal_start_month = start_month;
        self
    }

    /// Check every parameter invariant
    pub fn validate(&self) -> Result<(), InvalidParameterError> {
        if self.duration_months == 0 {
            return Err(InvalidParameterError::new(
                "duration_months",
                "must be positive, got 0",
            ));
        }

        non_negative("monthly_contribution", self.monthly_contribution)?;
        non_negative("annual_step_up_percent", self.annual_step_up_percent)?;
        non_negative("additional_lumpsum", self.additional_lumpsum)?;
        non_negative("withdrawal_amount", self.withdrawal_amount)?;

        if !self.annual_return_percent.is_finite() {
            return Err(InvalidParameterError::new(
                "annual_return_percent",
                format!("must be finite, got {}", self.annual_return_percent),
            ));
        }
        // (1 + r)^(1/12) is undefined below -100%
        if self.annual_return_percent <= -100.0 {
            return Err(InvalidParameterError::new(
                "annual_return_percent",
                format!("must be greater than -100, got {}", self.annual_return_percent),
            ));
        }

        if self.has_withdrawals()
            && (self.withdrawal_start_month == 0
                || self.withdrawal_start_month > self.duration_months)
        {
            return Err(InvalidParameterError::new(
                "withdrawal_start_month",
                format!(
                    "must be within 1..={}, got {}",
                    self.duration_months, self.withdrawal_start_month
                ),
            ));
        }

        Ok(())
    }

    pub fn has_withdrawals(&self) -> bool {
        self.withdrawal_amount > 0.0
    }

    /// Month-equivalent rate: (1 + r)^(1/12) - 1
    pub fn monthly_rate(&self) -> f64 {
        (1.0 + self.annual_return_percent / 100.0).powf(1.0 / MONTHS_PER_YEAR as f64) - 1.0
    }

    /// Multiplier applied to the contribution at each new 12-month block
    pub fn step_up_factor(&self) -> f64 {
        1.0 + self.annual_step_up_percent / 100.0
    }

    /// Phase year (1-indexed) for a phase month
    pub fn year_of_month(&self, month: u32) -> u32 {
        (month - 1) / MONTHS_PER_YEAR + 1
    }

    /// Month within the phase year (1-12)
    pub fn month_in_year(&self, month: u32) -> u32 {
        (month - 1) % MONTHS_PER_YEAR + 1
    }

    /// Whether the SWP applies in the given phase month
    pub fn withdraws_in_month(&self, month: u32) -> bool {
        self.has_withdrawals() && month >= self.withdrawal_start_month
    }

    /// Label for display, falling back to "Phase N"
    pub fn display_label(&self, phase_index: usize) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| format!("Phase {}", phase_index + 1))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), InvalidParameterError> {
    if !value.is_finite() {
        return Err(InvalidParameterError::new(
            field,
            format!("must be finite, got {}", value),
        ));
    }
    if value < 0.0 {
        return Err(InvalidParameterError::new(
            field,
            format!("must be non-negative, got {}", value),
        ));
    }
    Ok(())
}
