//! HTML report embedding every chart as a data URI

use crate::charts::{self, ChurnTable};
use crate::config::ChartConfig;
use crate::data::TelcoData;
use clap::ValueEnum;

/// Charts available in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChartId {
    Phone,
    Internet,
    TenureChurn,
    TenureCltv,
    TopCities,
}

impl ChartId {
    pub const ALL: [ChartId; 5] = [
        ChartId::Phone,
        ChartId::Internet,
        ChartId::TenureChurn,
        ChartId::TenureCltv,
        ChartId::TopCities,
    ];

    /// Preset the chart is rendered with
    pub fn config(self) -> ChartConfig {
        match self {
            ChartId::Phone => ChartConfig::phone_service(),
            ChartId::Internet => ChartConfig::internet_service(),
            ChartId::TenureChurn => ChartConfig::tenure_churn(),
            ChartId::TenureCltv => ChartConfig::tenure_cltv(),
            ChartId::TopCities => ChartConfig::top_ten_cities(),
        }
    }

    pub fn title(self) -> String {
        self.config().title
    }

    /// Render this chart as a base64 PNG
    pub fn render(self, data: &TelcoData) -> crate::Result<String> {
        match self {
            ChartId::Phone => charts::plot_phone(data),
            ChartId::Internet => charts::plot_internet(data),
            ChartId::TenureChurn => charts::plot_tenure_churn(data),
            ChartId::TenureCltv => charts::plot_tenure_cltv(data),
            ChartId::TopCities => charts::plot_top_ten(data),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub id: ChartId,
    pub png_base64: String,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub churn: ChurnTable,
    pub charts: Vec<RenderedChart>,
}

impl Report {
    /// Render the churn table and the selected charts
    pub fn build(data: &TelcoData, selection: &[ChartId]) -> crate::Result<Self> {
        let churn = charts::table_churn(data)?;
        let charts = selection
            .iter()
            .map(|&id| {
                Ok(RenderedChart {
                    id,
                    png_base64: id.render(data)?,
                })
            })
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(Self { churn, charts })
    }

    /// Standalone HTML page
    pub fn to_html(&self) -> String {
        let mut html = String::from(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Customer Churn Report</title>\n</head>\n<body>\n<h1>Customer Churn Report</h1>\n",
        );

        html.push_str("<table>\n<tr><th>churn_label</th><th>percent</th></tr>\n");
        for row in &self.churn.rows {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{:.2}</td></tr>\n",
                escape_html(&row.label),
                row.percent
            ));
        }
        html.push_str("</table>\n");

        for chart in &self.charts {
            let title = escape_html(&chart.id.title());
            html.push_str(&format!(
                "<h2>{}</h2>\n<img alt=\"{}\" src=\"data:image/png;base64,{}\">\n",
                title, title, chart.png_base64
            ));
        }
        html.push_str("</body>\n</html>\n");
        html
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ChurnShare;

    #[test]
    fn test_titles_come_from_presets() {
        assert_eq!(ChartId::Phone.title(), "Phone Service Customer");
        assert_eq!(ChartId::TopCities.title(), "Top 10 churn city");
        for id in ChartId::ALL {
            assert_eq!(id.title(), id.config().title);
        }
    }

    #[test]
    fn test_to_html_embeds_data_uri() {
        let report = Report {
            churn: ChurnTable {
                rows: vec![ChurnShare {
                    label: "<No>".to_string(),
                    percent: 73.46,
                }],
            },
            charts: vec![RenderedChart {
                id: ChartId::Phone,
                png_base64: "iVBORw0KGgo=".to_string(),
            }],
        };

        let html = report.to_html();
        assert!(html.contains("data:image/png;base64,iVBORw0KGgo="));
        assert!(html.contains("Phone Service Customer"));
        assert!(html.contains("&lt;No&gt;"));
        assert!(html.contains("73.46"));
    }
}
