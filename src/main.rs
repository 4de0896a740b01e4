//! telco-churn: renders the customer churn report
//!
//! Loads the churn CSV, prints the churn-rate table and writes every
//! selected chart into a standalone HTML page.

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Instant;
use telco_churn::{init_logging, load_telco, Args, Report};
use tracing::info;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    init_logging(args.log_level())?;

    if args.verbose {
        println!("Telco Churn Report");
        println!("==================\n");
    }

    run_report(&args)
}

/// Load, render and write the report
fn run_report(args: &Args) -> Result<()> {
    let start_time = Instant::now();

    // Step 1: Load data
    let data = load_telco(&args.input)?;
    println!("✓ Data loaded: {} customers", data.len());

    // Step 2: Render charts
    let selection = args.selected_charts();
    info!(charts = selection.len(), "rendering report");
    let report = Report::build(&data, &selection)?;

    println!("\n=== Churn Rate ===");
    print!("{}", report.churn);

    // Step 3: Write HTML
    std::fs::write(&args.output, report.to_html())
        .with_context(|| format!("Failed to write report to {}", args.output))?;

    let total_time = start_time.elapsed();
    println!("\n=== Report Complete ===");
    println!("Charts rendered: {}", report.charts.len());
    println!("Total processing time: {:.2}s", total_time.as_secs_f64());
    println!("Report saved to: {}", args.output);

    Ok(())
}
