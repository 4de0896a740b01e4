//! telco-churn: customer churn reporting
//!
//! Loads a telco churn CSV with Polars, derives an ordered tenure band for
//! every customer and renders cross-tabulated churn charts with Plotters as
//! base64-encoded PNG strings for embedding in web pages.

pub mod charts;
pub mod cli;
pub mod config;
pub mod crosstab;
pub mod data;
pub mod logging;
pub mod report;
pub mod tenure;
pub mod viz;

// Re-export public items for easier access
pub use charts::{
    plot_internet, plot_phone, plot_tenure_churn, plot_tenure_cltv, plot_top_ten, table_churn,
    ChurnTable,
};
pub use cli::Args;
pub use config::ChartConfig;
pub use crosstab::{crosstab, CrossTab, Normalize};
pub use data::{load_telco, CustomerRecord, TelcoData};
pub use logging::init_logging;
pub use report::{ChartId, Report};
pub use tenure::{attach_tenure_group, classify_tenure, TenureGroup};
pub use viz::{render_chart, Figure};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
