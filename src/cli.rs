//! Command-line interface definitions and argument parsing

use crate::report::ChartId;
use clap::Parser;

/// Customer churn report: renders churn charts from a telco CSV into one HTML page
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "data/telcochurn.csv")]
    pub input: String,

    /// Output path for the HTML report
    #[arg(short, long, default_value = "churn_report.html")]
    pub output: String,

    /// Charts to include; repeat the flag to select several (default: all)
    #[arg(short, long = "chart", value_enum)]
    pub charts: Vec<ChartId>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Charts to render, all of them when none were selected
    pub fn selected_charts(&self) -> Vec<ChartId> {
        if self.charts.is_empty() {
            ChartId::ALL.to_vec()
        } else {
            self.charts.clone()
        }
    }

    /// Default log filter when `RUST_LOG` is unset
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "telco_churn=debug"
        } else {
            "telco_churn=info"
        }
    }
}
