//! Load phase sequences from CSV or JSON plan files

use super::{PhaseSpec, MONTHS_PER_YEAR};
use crate::error::{InvalidParameterError, LoadError};
use csv::Reader;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Longest phase accepted from a plan file (100 years)
///
/// The engine itself has no cap; this bound belongs to input handling.
pub const MAX_DURATION_MONTHS: u32 = 100 * MONTHS_PER_YEAR;

/// Raw CSV row; blank cells fall back to the field defaults
#[derive(Debug, Deserialize)]
struct CsvRow {
    label: Option<String>,
    monthly_contribution: Option<f64>,
    annual_step_up_percent: Option<f64>,
    additional_lumpsum: Option<f64>,
    annual_return_percent: f64,
    duration_months: u32,
    withdrawal_amount: Option<f64>,
    withdrawal_start_month: Option<u32>,
}

impl CsvRow {
    fn to_phase(self) -> PhaseSpec {
        PhaseSpec {
            label: self.label.filter(|l| !l.trim().is_empty()),
            monthly_contribution: self.monthly_contribution.unwrap_or(0.0),
            annual_step_up_percent: self.annual_step_up_percent.unwrap_or(0.0),
            additional_lumpsum: self.additional_lumpsum.unwrap_or(0.0),
            annual_return_percent: self.annual_return_percent,
            duration_months: self.duration_months,
            withdrawal_amount: self.withdrawal_amount.unwrap_or(0.0),
            withdrawal_start_month: self.withdrawal_start_month.unwrap_or(1),
        }
    }
}

/// JSON plan document: `{ "phases": [ ... ] }`
#[derive(Debug, Deserialize)]
struct JsonPlan {
    phases: Vec<JsonPhase>,
}

/// JSON phase; duration may be given in months or whole years
#[derive(Debug, Deserialize)]
struct JsonPhase {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    monthly_contribution: f64,
    #[serde(default)]
    annual_step_up_percent: f64,
    #[serde(default)]
    additional_lumpsum: f64,
    annual_return_percent: f64,
    #[serde(default)]
    duration_months: Option<u32>,
    #[serde(default)]
    duration_years: Option<u32>,
    #[serde(default)]
    withdrawal_amount: f64,
    #[serde(default)]
    withdrawal_start_month: Option<u32>,
}

impl JsonPhase {
    fn to_phase(self) -> Result<PhaseSpec, InvalidParameterError> {
        let duration_months = match (self.duration_months, self.duration_years) {
            (Some(months), None) => months,
            (None, Some(years)) => years.saturating_mul(MONTHS_PER_YEAR),
            (Some(_), Some(_)) => {
                return Err(InvalidParameterError::new(
                    "duration_months",
                    "give either duration_months or duration_years, not both",
                ))
            }
            (None, None) => {
                return Err(InvalidParameterError::new(
                    "duration_months",
                    "missing; give duration_months or duration_years",
                ))
            }
        };

        Ok(PhaseSpec {
            label: self.label,
            monthly_contribution: self.monthly_contribution,
            annual_step_up_percent: self.annual_step_up_percent,
            additional_lumpsum: self.additional_lumpsum,
            annual_return_percent: self.annual_return_percent,
            duration_months,
            withdrawal_amount: self.withdrawal_amount,
            withdrawal_start_month: self.withdrawal_start_month.unwrap_or(1),
        })
    }
}

/// Validate loaded phases, including the plan-file duration cap
fn check_phases(phases: Vec<PhaseSpec>) -> Result<Vec<PhaseSpec>, LoadError> {
    if phases.is_empty() {
        return Err(LoadError::Empty);
    }

    for (i, phase) in phases.iter().enumerate() {
        let index = i + 1;
        phase
            .validate()
            .map_err(|source| LoadError::Invalid { index, source })?;

        if phase.duration_months > MAX_DURATION_MONTHS {
            return Err(LoadError::Invalid {
                index,
                source: InvalidParameterError::new(
                    "duration_months",
                    format!(
                        "{} exceeds the {} month limit",
                        phase.duration_months, MAX_DURATION_MONTHS
                    ),
                ),
            });
        }
    }

    Ok(phases)
}

/// Load phases from CSV, one phase per row in plan order
pub fn load_phases_from_csv<R: Read>(reader: R) -> Result<Vec<PhaseSpec>, LoadError> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut phases = Vec::new();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        phases.push(row.to_phase());
    }

    check_phases(phases)
}

/// Load phases from a JSON plan document
pub fn load_phases_from_json<R: Read>(reader: R) -> Result<Vec<PhaseSpec>, LoadError> {
    let plan: JsonPlan = serde_json::from_reader(reader)?;
    let mut phases = Vec::with_capacity(plan.phases.len());

    for (i, raw) in plan.phases.into_iter().enumerate() {
        let phase = raw
            .to_phase()
            .map_err(|source| LoadError::Invalid { index: i + 1, source })?;
        phases.push(phase);
    }

    check_phases(phases)
}

/// Load a plan file, picking the format from its extension
pub fn load_plan<P: AsRef<Path>>(path: P) -> Result<Vec<PhaseSpec>, LoadError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => load_phases_from_csv(File::open(path)?),
        "json" => load_phases_from_json(File::open(path)?),
        _ => Err(LoadError::UnsupportedFormat(extension)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV_PLAN: &str = "\
label,monthly_contribution,annual_step_up_percent,additional_lumpsum,annual_return_percent,duration_months,withdrawal_amount,withdrawal_start_month
Accumulation,10000,10,500000,12,120,,
,,,200000,8,60,40000,13
";

    #[test]
    fn test_load_csv_with_defaults() {
        let phases = load_phases_from_csv(CSV_PLAN.as_bytes()).expect("Failed to load plan");
        assert_eq!(phases.len(), 2);

        let first = &phases[0];
        assert_eq!(first.label.as_deref(), Some("Accumulation"));
        assert_eq!(first.monthly_contribution, 10_000.0);
        assert_eq!(first.annual_step_up_percent, 10.0);
        assert_eq!(first.withdrawal_amount, 0.0);
        assert_eq!(first.withdrawal_start_month, 1);

        let second = &phases[1];
        assert_eq!(second.label, None);
        assert_eq!(second.monthly_contribution, 0.0);
        assert_eq!(second.additional_lumpsum, 200_000.0);
        assert_eq!(second.withdrawal_amount, 40_000.0);
        assert_eq!(second.withdrawal_start_month, 13);
    }

    #[test]
    fn test_csv_error_names_row() {
        let csv = "\
annual_return_percent,duration_months,withdrawal_amount,withdrawal_start_month
10,12,,
10,12,500,13
";
        match load_phases_from_csv(csv.as_bytes()) {
            Err(LoadError::Invalid { index, source }) => {
                assert_eq!(index, 2);
                assert_eq!(source.field, "withdrawal_start_month");
            }
            other => panic!("expected invalid phase 2, got {:?}", other),
        }
    }

    #[test]
    fn test_load_json_years_and_months() {
        let json = r#"{
            "phases": [
                { "label": "Build", "monthly_contribution": 5000, "annual_return_percent": 12, "duration_years": 10 },
                { "additional_lumpsum": 100000, "annual_return_percent": 7, "duration_months": 18,
                  "withdrawal_amount": 25000, "withdrawal_start_month": 6 }
            ]
        }"#;

        let phases = load_phases_from_json(json.as_bytes()).expect("Failed to load plan");
        assert_eq!(phases[0].duration_months, 120);
        assert_eq!(phases[0].label.as_deref(), Some("Build"));
        assert_eq!(phases[1].duration_months, 18);
        assert_eq!(phases[1].withdrawal_start_month, 6);
    }

    #[test]
    fn test_json_duration_must_be_unambiguous() {
        let both = r#"{"phases":[{"annual_return_percent":5,"duration_months":12,"duration_years":1}]}"#;
        assert!(matches!(
            load_phases_from_json(both.as_bytes()),
            Err(LoadError::Invalid { index: 1, .. })
        ));

        let neither = r#"{"phases":[{"annual_return_percent":5}]}"#;
        assert!(matches!(
            load_phases_from_json(neither.as_bytes()),
            Err(LoadError::Invalid { index: 1, .. })
        ));
    }

    #[test]
    fn test_duration_cap() {
        let json = r#"{"phases":[{"annual_return_percent":5,"duration_years":101}]}"#;
        match load_phases_from_json(json.as_bytes()) {
            Err(LoadError::Invalid { source, .. }) => assert_eq!(source.field, "duration_months"),
            other => panic!("expected duration cap error, got {:?}", other),
        }

        let json = r#"{"phases":[{"annual_return_percent":5,"duration_years":100}]}"#;
        assert!(load_phases_from_json(json.as_bytes()).is_ok());
    }

    #[test]
    fn test_empty_plan() {
        let json = r#"{"phases":[]}"#;
        assert!(matches!(load_phases_from_json(json.as_bytes()), Err(LoadError::Empty)));
    }

    #[test]
    fn test_sample_plans_agree() {
        let from_csv = load_plan("data/sample_plan.csv").expect("Failed to load CSV plan");
        let from_json = load_plan("data/sample_plan.json").expect("Failed to load JSON plan");

        assert_eq!(from_csv.len(), 3);
        assert_eq!(from_csv, from_json);
        assert_eq!(from_csv[2].label.as_deref(), Some("Retirement"));
        assert_eq!(from_csv[2].duration_months, 300);
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            load_plan("plan.yaml"),
            Err(LoadError::UnsupportedFormat(ext)) if ext == "yaml"
        ));
    }
}
