//! Churn report charts. Each one cross-tabulates the loaded data and
//! returns the rendered chart as a base64 PNG string.

use crate::config::ChartConfig;
use crate::crosstab::{crosstab, value_counts, Aggregate, CrossTab, Normalize, RowOrder};
use crate::data::{
    TelcoData, CHURN_LABEL_COLUMN, CITY_COLUMN, CLTV_COLUMN, INTERNET_SERVICE_COLUMN,
    PHONE_SERVICE_COLUMN,
};
use crate::tenure::{TenureGroup, TENURE_GROUP_COLUMN, TENURE_MONTHS_COLUMN};
use crate::viz::render_chart;
use std::fmt;
use tracing::info;

/// Number of cities in the top churn chart
pub const TOP_CITY_COUNT: usize = 10;

/// Share of customers per churn label, in percent
#[derive(Debug, Clone, PartialEq)]
pub struct ChurnTable {
    pub rows: Vec<ChurnShare>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChurnShare {
    pub label: String,
    pub percent: f64,
}

impl ChurnTable {
    pub fn percent(&self, label: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|row| row.label == label)
            .map(|row| row.percent)
    }
}

impl fmt::Display for ChurnTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<12} {:>8}", CHURN_LABEL_COLUMN, "percent")?;
        for row in &self.rows {
            writeln!(f, "{:<12} {:>8.2}", row.label, row.percent)?;
        }
        Ok(())
    }
}

fn ensure_rows(data: &TelcoData) -> crate::Result<()> {
    if data.is_empty() {
        anyhow::bail!("Dataset has no customers");
    }
    Ok(())
}

fn churn_crosstab(data: &TelcoData, index: &str, normalize: Normalize) -> crate::Result<CrossTab> {
    let table = crosstab(data.frame(), index, CHURN_LABEL_COLUMN, &Aggregate::Count)?;
    Ok(table.normalized(normalize))
}

fn render(table: &CrossTab, config: &ChartConfig) -> crate::Result<String> {
    info!(title = %config.title, rows = table.rows.len(), "rendering chart");
    render_chart(table, config)
}

/// Percentage of retained and churned customers
pub fn table_churn(data: &TelcoData) -> crate::Result<ChurnTable> {
    ensure_rows(data)?;
    let counts = value_counts(data.frame(), CHURN_LABEL_COLUMN)?;
    let total: f64 = counts.iter().map(|(_, count)| count).sum();

    let rows = counts
        .into_iter()
        .map(|(label, count)| ChurnShare {
            label,
            percent: if total > 0.0 { count / total * 100.0 } else { 0.0 },
        })
        .collect();
    Ok(ChurnTable { rows })
}

/// Churn split within each phone service option
pub fn phone_service_table(data: &TelcoData) -> crate::Result<CrossTab> {
    churn_crosstab(data, PHONE_SERVICE_COLUMN, ChartConfig::phone_service().normalize)
}

pub fn plot_phone(data: &TelcoData) -> crate::Result<String> {
    ensure_rows(data)?;
    render(&phone_service_table(data)?, &ChartConfig::phone_service())
}

/// Share of all customers per internet service and churn label
pub fn internet_service_table(data: &TelcoData) -> crate::Result<CrossTab> {
    churn_crosstab(data, INTERNET_SERVICE_COLUMN, ChartConfig::internet_service().normalize)
}

pub fn plot_internet(data: &TelcoData) -> crate::Result<String> {
    ensure_rows(data)?;
    render(&internet_service_table(data)?, &ChartConfig::internet_service())
}

/// Share of all customers per tenure band and churn label, bands in
/// declared order
pub fn tenure_churn_table(data: &TelcoData) -> crate::Result<CrossTab> {
    let order = RowOrder::Explicit(TenureGroup::order().into_iter().map(String::from).collect());
    Ok(
        churn_crosstab(data, TENURE_GROUP_COLUMN, ChartConfig::tenure_churn().normalize)?
            .with_row_order(&order),
    )
}

pub fn plot_tenure_churn(data: &TelcoData) -> crate::Result<String> {
    ensure_rows(data)?;
    render(&tenure_churn_table(data)?, &ChartConfig::tenure_churn())
}

/// Mean lifetime value per tenure month and churn label
pub fn tenure_cltv_table(data: &TelcoData) -> crate::Result<CrossTab> {
    let aggregate = Aggregate::Mean {
        values: CLTV_COLUMN.to_string(),
    };
    Ok(
        crosstab(data.frame(), TENURE_MONTHS_COLUMN, CHURN_LABEL_COLUMN, &aggregate)?
            .with_row_order(&RowOrder::Numeric),
    )
}

pub fn plot_tenure_cltv(data: &TelcoData) -> crate::Result<String> {
    ensure_rows(data)?;
    render(&tenure_cltv_table(data)?, &ChartConfig::tenure_cltv())
}

/// Churn split within the cities holding the most customers
pub fn top_city_table(data: &TelcoData) -> crate::Result<CrossTab> {
    let counts = crosstab(data.frame(), CITY_COLUMN, CHURN_LABEL_COLUMN, &Aggregate::Count)?;
    Ok(counts
        .top_rows(TOP_CITY_COUNT)
        .normalized(ChartConfig::top_ten_cities().normalize))
}

pub fn plot_top_ten(data: &TelcoData) -> crate::Result<String> {
    ensure_rows(data)?;
    render(&top_city_table(data)?, &ChartConfig::top_ten_cities())
}
