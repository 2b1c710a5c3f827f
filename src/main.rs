//! Corpus Planner CLI
//!
//! Runs a multi-phase plan file and prints the yearly ledger per phase

use anyhow::{Context, Result};
use clap::Parser;
use corpus_planner::phase::load_plan;
use corpus_planner::{run_plan, PlanResult};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "corpus_planner")]
#[command(about = "Project a multi-phase SIP / lumpsum / SWP investment plan")]
struct Args {
    /// Plan file (.csv or .json), one phase per row / entry
    #[arg(short, long, default_value = "data/sample_plan.csv")]
    plan: PathBuf,

    /// Write the full monthly ledger to this CSV file
    #[arg(long)]
    ledger_out: Option<PathBuf>,

    /// Print the complete result as JSON instead of tables
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let phases = load_plan(&args.plan)
        .with_context(|| format!("failed to load plan {}", args.plan.display()))?;
    let result = run_plan(&phases)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_tables(&result);
    }

    if let Some(path) = &args.ledger_out {
        write_ledger(path, &result)
            .with_context(|| format!("failed to write ledger {}", path.display()))?;
        println!("\nMonthly ledger written to: {}", path.display());
    }

    Ok(())
}

fn print_tables(result: &PlanResult) {
    for phase in &result.phases {
        println!("\n{} ({} months)", phase.label, phase.duration_months);
        println!(
            "  Rollover: {:.2}  Lumpsum: {:.2}  Starting balance: {:.2}",
            phase.rollover_balance, phase.lumpsum_invested, phase.starting_balance
        );
        println!(
            "{:>5} {:>8} {:>16} {:>16} {:>16} {:>16} {:>18}",
            "Year", "PlanYear", "Contributed", "Withdrawn", "Invested", "WithdrawnTotal", "Balance"
        );
        println!("{}", "-".repeat(101));

        for row in &phase.yearly {
            println!(
                "{:>5} {:>8} {:>16.2} {:>16.2} {:>16.2} {:>16.2} {:>18.2}",
                row.year,
                row.plan_year,
                row.contributed,
                row.withdrawn,
                row.invested_to_date,
                row.withdrawn_to_date,
                row.closing_balance,
            );
        }

        if let Some(month) = phase.depletion_month {
            println!(
                "  Withdrawals exceed the balance from month {} (low point {:.2})",
                month, phase.min_balance
            );
        }
    }

    println!("\nPlan Summary:");
    println!("  Total Months: {}", result.total_months);
    println!("  Total Invested: {:.2}", result.total_invested);
    println!("  Total Withdrawn: {:.2}", result.total_withdrawn);
    println!("  Total Growth: {:.2}", result.total_growth);
    println!("  Final Balance: {:.2}", result.final_balance);
    match result.money_weighted_return {
        Some(rate) => println!("  Money-weighted Return: {:.4}%", rate * 100.0),
        None => println!("  Money-weighted Return: n/a"),
    }
    match result.depletion {
        Some(d) => println!(
            "  Sustainable: no (phase {} month {}, plan month {})",
            d.phase_index + 1,
            d.month,
            d.plan_month
        ),
        None => println!("  Sustainable: yes"),
    }
}

fn write_ledger(path: &Path, result: &PlanResult) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "Phase",
        "Label",
        "Month",
        "PlanMonth",
        "Opening",
        "Contribution",
        "Withdrawal",
        "Growth",
        "Closing",
    ])?;

    for phase in &result.phases {
        for row in &phase.ledger {
            writer.write_record([
                (phase.phase_index + 1).to_string(),
                phase.label.clone(),
                row.month.to_string(),
                row.plan_month.to_string(),
                format!("{:.8}", row.opening_balance),
                format!("{:.8}", row.contribution),
                format!("{:.8}", row.withdrawal),
                format!("{:.8}", row.growth),
                format!("{:.8}", row.closing_balance),
            ])?;
        }
    }

    writer.flush()?;
    Ok(())
}
