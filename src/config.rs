//! Chart configuration: every rendering option is a named field

use crate::crosstab::Normalize;
use plotters::style::RGBColor;

/// Bar colours: retained, churned
pub const CHURN_PALETTE: [&str; 2] = ["#53a4b1", "#c34454"];

/// Line colours: retained, churned
pub const GREY_PALETTE: [&str; 2] = ["#333333", "#b3b3b3"];

/// Legend entries for the `No`/`Yes` churn columns
pub const CHURN_LEGEND: [&str; 2] = ["Retain", "Churn"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Categories on the x axis
    Vertical,
    /// Categories on the y axis
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    /// Dashed line with a point marker at each value
    DashedWithMarkers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar(Orientation),
    Line(LineStyle),
}

/// Tick label format of the value axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    Plain,
    /// Proportions rendered as `NN%`
    Percent,
    /// Whole dollars with thousands separators
    Currency,
}

impl ValueFormat {
    pub fn format(self, value: f64) -> String {
        match self {
            ValueFormat::Plain => format!("{:.2}", value),
            ValueFormat::Percent => format!("{:.0}%", value * 100.0),
            ValueFormat::Currency => format_currency(value),
        }
    }
}

/// `1234.6` -> `$1,235`
pub fn format_currency(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendPosition {
    UpperLeft,
    UpperRight,
    LowerRight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendConfig {
    /// Entry per table column, in column order
    pub labels: Vec<String>,
    pub position: LegendPosition,
}

impl LegendConfig {
    pub fn churn(position: LegendPosition) -> Self {
        Self {
            labels: CHURN_LEGEND.iter().map(|s| s.to_string()).collect(),
            position,
        }
    }
}

/// Ordered series colours as hex strings
#[derive(Debug, Clone, PartialEq)]
pub struct Palette(pub Vec<String>);

impl Palette {
    pub fn from_hex(colors: &[&str]) -> Self {
        Self(colors.iter().map(|c| c.to_string()).collect())
    }

    /// Colour of series `index`, cycling through the palette
    pub fn color(&self, index: usize) -> crate::Result<RGBColor> {
        if self.0.is_empty() {
            anyhow::bail!("Palette has no colours");
        }
        parse_hex_color(&self.0[index % self.0.len()])
    }
}

/// Parse `#rrggbb`
pub fn parse_hex_color(hex: &str) -> crate::Result<RGBColor> {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        anyhow::bail!("Invalid colour '{}', expected #rrggbb", hex);
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| anyhow::anyhow!("Invalid colour '{}', expected #rrggbb", hex))
    };
    Ok(RGBColor(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Output size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FigureSize {
    pub width: u32,
    pub height: u32,
}

impl Default for FigureSize {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

/// Everything a chart render needs besides its table
#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    pub title: String,
    pub kind: ChartKind,
    pub normalize: Normalize,
    pub value_format: ValueFormat,
    pub palette: Palette,
    pub legend: LegendConfig,
    pub size: FigureSize,
    /// Description of the category (or x) axis; empty for none
    pub category_label: String,
    /// Description of the value axis; empty for none
    pub value_label: String,
}

impl ChartConfig {
    fn churn_bars(title: &str, orientation: Orientation, normalize: Normalize) -> Self {
        Self {
            title: title.to_string(),
            kind: ChartKind::Bar(orientation),
            normalize,
            value_format: ValueFormat::Percent,
            palette: Palette::from_hex(&CHURN_PALETTE),
            legend: LegendConfig::churn(LegendPosition::UpperRight),
            size: FigureSize::default(),
            category_label: String::new(),
            value_label: String::new(),
        }
    }

    pub fn phone_service() -> Self {
        Self::churn_bars("Phone Service Customer", Orientation::Horizontal, Normalize::Index)
    }

    pub fn internet_service() -> Self {
        Self::churn_bars("Internet Service Customer", Orientation::Horizontal, Normalize::All)
    }

    pub fn tenure_churn() -> Self {
        Self::churn_bars("Churn Rate by Tenure Group", Orientation::Vertical, Normalize::All)
    }

    pub fn tenure_cltv() -> Self {
        Self {
            title: "Average Lifetime Value by Tenure".to_string(),
            kind: ChartKind::Line(LineStyle::DashedWithMarkers),
            normalize: Normalize::None,
            value_format: ValueFormat::Currency,
            palette: Palette::from_hex(&GREY_PALETTE),
            legend: LegendConfig::churn(LegendPosition::LowerRight),
            size: FigureSize::default(),
            category_label: "Tenure (in Months)".to_string(),
            value_label: String::new(),
        }
    }

    pub fn top_ten_cities() -> Self {
        Self {
            legend: LegendConfig::churn(LegendPosition::UpperRight),
            size: FigureSize {
                width: 1000,
                height: 600,
            },
            category_label: "City".to_string(),
            ..Self::churn_bars("Top 10 churn city", Orientation::Horizontal, Normalize::Index)
        }
    }
}
