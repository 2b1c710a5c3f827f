//! Run a plan file across a range of annual return assumptions
//!
//! Usage: cargo run --bin sweep_returns -- --plan data/sample_plan.csv --from 4 --to 14 --step 1

use anyhow::{Context, Result};
use clap::Parser;
use corpus_planner::phase::load_plan;
use corpus_planner::scenario::{return_grid, ScenarioRunner};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "sweep_returns")]
#[command(about = "Project a plan under a grid of annual return rates")]
struct Args {
    /// Plan file (.csv or .json)
    #[arg(short, long, default_value = "data/sample_plan.csv")]
    plan: PathBuf,

    /// Lowest annual return in percent
    #[arg(long, default_value_t = 4.0)]
    from: f64,

    /// Highest annual return in percent
    #[arg(long, default_value_t = 14.0)]
    to: f64,

    /// Step between rates in percent
    #[arg(long, default_value_t = 1.0)]
    step: f64,

    /// Output CSV path
    #[arg(short, long, default_value = "return_sweep.csv")]
    out: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let start = Instant::now();
    let phases = load_plan(&args.plan)
        .with_context(|| format!("failed to load plan {}", args.plan.display()))?;
    let rates = return_grid(args.from, args.to, args.step)?;
    println!("Loaded {} phases, running {} scenarios...", phases.len(), rates.len());

    let runner = ScenarioRunner::new(phases);
    let results = runner.run_return_sweep(&rates);

    let mut writer = csv::Writer::from_path(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    writer.write_record([
        "ReturnPct",
        "TotalInvested",
        "TotalWithdrawn",
        "FinalBalance",
        "DepletionPhase",
        "DepletionMonth",
        "Mwrr",
    ])?;

    println!(
        "{:>9} {:>18} {:>18} {:>18} {:>12}",
        "Return%", "Invested", "Withdrawn", "FinalBalance", "Depletes"
    );
    println!("{}", "-".repeat(79));

    for (rate, result) in rates.iter().zip(results) {
        let plan = result.with_context(|| format!("scenario at {}% failed", rate))?;

        let (depletion_phase, depletion_month) = match plan.depletion {
            Some(d) => ((d.phase_index + 1).to_string(), d.month.to_string()),
            None => (String::new(), String::new()),
        };
        let mwrr = plan
            .money_weighted_return
            .map(|r| format!("{:.8}", r))
            .unwrap_or_default();

        writer.write_record([
            format!("{:.4}", rate),
            format!("{:.2}", plan.total_invested),
            format!("{:.2}", plan.total_withdrawn),
            format!("{:.2}", plan.final_balance),
            depletion_phase,
            depletion_month,
            mwrr,
        ])?;

        let depletes = match plan.depletion {
            Some(d) => format!("month {}", d.plan_month),
            None => "no".to_string(),
        };
        println!(
            "{:>9.2} {:>18.2} {:>18.2} {:>18.2} {:>12}",
            rate, plan.total_invested, plan.total_withdrawn, plan.final_balance, depletes
        );
    }

    writer.flush()?;
    println!("\nOutput written to {}", args.out.display());
    println!("Total time: {:?}", start.elapsed());

    Ok(())
}
