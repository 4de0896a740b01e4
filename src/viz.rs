//! Chart rendering with Plotters into in-memory PNG images

use crate::config::{ChartConfig, ChartKind, FigureSize, LegendPosition, LineStyle, Orientation};
use crate::crosstab::CrossTab;
use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use std::io::Cursor;
use tracing::debug;

/// First eight bytes of every PNG file
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Share of each category slot covered by its bar group
const GROUP_WIDTH: f64 = 0.8;

type TickFormatter<'a> = &'a dyn Fn(&f64) -> String;

/// A drawing surface owned by one render call.
///
/// The pixel buffer is only reachable through [`Figure::draw`], and the
/// figure is consumed by [`Figure::into_base64_png`], so two renders never
/// share state.
#[derive(Debug)]
pub struct Figure {
    size: FigureSize,
    pixels: Vec<u8>,
}

impl Figure {
    pub fn new(size: FigureSize) -> Self {
        let len = size.width as usize * size.height as usize * 3;
        Self {
            size,
            pixels: vec![255; len],
        }
    }

    pub fn size(&self) -> FigureSize {
        self.size
    }

    /// Paint onto the figure. The drawing area is flushed to the buffer
    /// before this returns.
    pub fn draw<F>(&mut self, paint: F) -> crate::Result<()>
    where
        F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> crate::Result<()>,
    {
        let root = BitMapBackend::with_buffer(&mut self.pixels, (self.size.width, self.size.height))
            .into_drawing_area();
        root.fill(&WHITE)?;
        paint(&root)?;
        root.present()?;
        Ok(())
    }

    /// PNG bytes of the current buffer
    pub fn encode_png(&self) -> crate::Result<Vec<u8>> {
        encode_png(self.size, self.pixels.clone())
    }

    /// Encode and release the figure
    pub fn into_base64_png(self) -> crate::Result<String> {
        let png = encode_png(self.size, self.pixels)?;
        Ok(to_base64(&png))
    }
}

/// Encode a packed RGB buffer as PNG
pub fn encode_png(size: FigureSize, rgb: Vec<u8>) -> crate::Result<Vec<u8>> {
    let image = image::RgbImage::from_raw(size.width, size.height, rgb)
        .context("Pixel buffer does not match figure size")?;
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, image::ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

/// Standard base64 with padding, as plain text
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Render `table` as configured and return the PNG as base64
pub fn render_chart(table: &CrossTab, config: &ChartConfig) -> crate::Result<String> {
    if table.is_empty() {
        anyhow::bail!("Nothing to plot for '{}'", config.title);
    }

    let mut figure = Figure::new(config.size);
    match config.kind {
        ChartKind::Bar(orientation) => {
            figure.draw(|root| draw_bars(root, table, config, orientation))?
        }
        ChartKind::Line(style) => figure.draw(|root| draw_lines(root, table, config, style))?,
    }

    let encoded = figure.into_base64_png()?;
    debug!(title = %config.title, bytes = encoded.len(), "chart rendered");
    Ok(encoded)
}

/// Label of the category sitting at axis position `x`, if any
fn category_at(categories: &[String], x: f64) -> String {
    let slot = x.round();
    if (x - slot).abs() > 1e-6 || slot < 0.0 {
        return String::new();
    }
    categories.get(slot as usize).cloned().unwrap_or_default()
}

fn series_label(config: &ChartConfig, table: &CrossTab, column: usize) -> String {
    config
        .legend
        .labels
        .get(column)
        .cloned()
        .unwrap_or_else(|| table.columns[column].clone())
}

fn label_position(position: LegendPosition) -> SeriesLabelPosition {
    match position {
        LegendPosition::UpperLeft => SeriesLabelPosition::UpperLeft,
        LegendPosition::UpperRight => SeriesLabelPosition::UpperRight,
        LegendPosition::LowerRight => SeriesLabelPosition::LowerRight,
    }
}

fn draw_bars(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    table: &CrossTab,
    config: &ChartConfig,
    orientation: Orientation,
) -> crate::Result<()> {
    let categories = -0.5..(table.rows.len() as f64 - 0.5);
    let top = table.value_range().map(|(_, hi)| hi).unwrap_or(0.0);
    let value_max = if top > 0.0 { top * 1.1 } else { 1.0 };
    let values = 0.0..value_max;

    let (x_range, y_range) = match orientation {
        Orientation::Vertical => (categories, values),
        Orientation::Horizontal => (values, categories),
    };

    let mut chart = ChartBuilder::on(root)
        .caption(&config.title, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(if orientation == Orientation::Horizontal { 120 } else { 60 })
        .build_cartesian_2d(x_range, y_range)?;

    let category_fmt = |x: &f64| category_at(&table.rows, *x);
    let value_fmt = |v: &f64| config.value_format.format(*v);
    let (x_fmt, y_fmt, x_labels, y_labels) = match orientation {
        Orientation::Vertical => (
            &category_fmt as TickFormatter,
            &value_fmt as TickFormatter,
            table.rows.len(),
            8,
        ),
        Orientation::Horizontal => (
            &value_fmt as TickFormatter,
            &category_fmt as TickFormatter,
            8,
            table.rows.len(),
        ),
    };
    let (x_desc, y_desc) = match orientation {
        Orientation::Vertical => (&config.category_label, &config.value_label),
        Orientation::Horizontal => (&config.value_label, &config.category_label),
    };

    let mut mesh = chart.configure_mesh();
    mesh.x_labels(x_labels)
        .y_labels(y_labels)
        .x_label_formatter(x_fmt)
        .y_label_formatter(y_fmt)
        .axis_desc_style(("sans-serif", 15));
    match orientation {
        Orientation::Vertical => mesh.disable_x_mesh(),
        Orientation::Horizontal => mesh.disable_y_mesh(),
    };
    if !x_desc.is_empty() {
        mesh.x_desc(x_desc.as_str());
    }
    if !y_desc.is_empty() {
        mesh.y_desc(y_desc.as_str());
    }
    mesh.draw()?;

    let bar_width = GROUP_WIDTH / table.columns.len() as f64;
    for column in 0..table.columns.len() {
        let color = config.palette.color(column)?;
        let bars = table
            .values
            .iter()
            .enumerate()
            .filter(|(_, row)| !row[column].is_nan())
            .map(|(slot, row)| {
                let start = slot as f64 - GROUP_WIDTH / 2.0 + column as f64 * bar_width;
                let end = start + bar_width;
                let corners = match orientation {
                    Orientation::Vertical => [(start, 0.0), (end, row[column])],
                    Orientation::Horizontal => [(0.0, start), (row[column], end)],
                };
                Rectangle::new(corners, color.filled())
            });

        chart
            .draw_series(bars)?
            .label(series_label(config, table, column))
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(label_position(config.legend.position))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

fn draw_lines(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    table: &CrossTab,
    config: &ChartConfig,
    style: LineStyle,
) -> crate::Result<()> {
    let xs = table
        .rows
        .iter()
        .map(|label| {
            label
                .parse::<f64>()
                .with_context(|| format!("Line chart needs numeric row keys, got '{}'", label))
        })
        .collect::<crate::Result<Vec<f64>>>()?;

    let x_min = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let x_max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let x_pad = ((x_max - x_min) * 0.05).max(0.5);
    let (y_min, y_max) = table
        .value_range()
        .context("Line chart has no values to plot")?;
    let y_pad = ((y_max - y_min) * 0.1).max(y_max.abs() * 0.05).max(1.0);

    let mut chart = ChartBuilder::on(root)
        .caption(&config.title, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(
            (x_min - x_pad)..(x_max + x_pad),
            (y_min - y_pad)..(y_max + y_pad),
        )?;

    let x_fmt = |x: &f64| format!("{:.0}", x);
    let y_fmt = |y: &f64| config.value_format.format(*y);
    let mut mesh = chart.configure_mesh();
    mesh.x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .axis_desc_style(("sans-serif", 15));
    if !config.category_label.is_empty() {
        mesh.x_desc(config.category_label.as_str());
    }
    if !config.value_label.is_empty() {
        mesh.y_desc(config.value_label.as_str());
    }
    mesh.draw()?;

    for column in 0..table.columns.len() {
        let color = config.palette.color(column)?;
        let points: Vec<(f64, f64)> = xs
            .iter()
            .zip(table.column_values(column))
            .filter(|(_, v)| !v.is_nan())
            .map(|(&x, v)| (x, v))
            .collect();

        let annotation = match style {
            LineStyle::Solid => chart.draw_series(LineSeries::new(points, color.stroke_width(2)))?,
            LineStyle::DashedWithMarkers => {
                chart.draw_series(points.iter().map(|&p| Circle::new(p, 3, color.filled())))?;
                chart.draw_series(DashedLineSeries::new(points, 6, 4, color.stroke_width(1)))?
            }
        };
        annotation
            .label(series_label(config, table, column))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .position(label_position(config.legend.position))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn churn_table() -> CrossTab {
        CrossTab {
            rows: vec!["DSL".into(), "Fiber optic".into(), "No".into()],
            columns: vec!["No".into(), "Yes".into()],
            values: vec![vec![0.3, 0.1], vec![0.25, 0.2], vec![0.15, 0.0]],
        }
    }

    fn assert_png(encoded: &str) {
        assert!(!encoded.is_empty());
        let bytes = STANDARD.decode(encoded).unwrap();
        assert_eq!(&bytes[..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_figure_encodes_png() {
        let figure = Figure::new(FigureSize {
            width: 40,
            height: 30,
        });
        assert_eq!(figure.size().width, 40);
        let png = figure.encode_png().unwrap();
        assert_eq!(&png[..8], &PNG_SIGNATURE);
        assert_png(&figure.into_base64_png().unwrap());
    }

    #[test]
    fn test_figure_draw_changes_pixels() {
        let mut figure = Figure::new(FigureSize {
            width: 20,
            height: 20,
        });
        figure
            .draw(|root| {
                root.fill(&BLACK)?;
                Ok(())
            })
            .unwrap();
        assert!(figure.pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn test_encode_png_rejects_short_buffer() {
        let size = FigureSize {
            width: 10,
            height: 10,
        };
        assert!(encode_png(size, vec![0; 10]).is_err());
    }

    #[test]
    fn test_render_horizontal_bars() {
        assert_png(&render_chart(&churn_table(), &ChartConfig::phone_service()).unwrap());
    }

    #[test]
    fn test_render_vertical_bars() {
        assert_png(&render_chart(&churn_table(), &ChartConfig::tenure_churn()).unwrap());
    }

    #[test]
    fn test_render_dashed_line() {
        let table = CrossTab {
            rows: vec!["1".into(), "2".into(), "5".into()],
            columns: vec!["No".into(), "Yes".into()],
            values: vec![vec![3000.0, 2500.0], vec![3100.0, f64::NAN], vec![4200.0, 3900.0]],
        };
        assert_png(&render_chart(&table, &ChartConfig::tenure_cltv()).unwrap());
    }

    #[test]
    fn test_render_solid_line() {
        let table = CrossTab {
            rows: vec!["0".into(), "12".into()],
            columns: vec!["No".into()],
            values: vec![vec![1500.0], vec![1800.0]],
        };
        let config = ChartConfig {
            kind: ChartKind::Line(LineStyle::Solid),
            ..ChartConfig::tenure_cltv()
        };
        assert_png(&render_chart(&table, &config).unwrap());
    }

    #[test]
    fn test_line_chart_needs_numeric_rows() {
        assert!(render_chart(&churn_table(), &ChartConfig::tenure_cltv()).is_err());
    }

    #[test]
    fn test_empty_table_is_rejected() {
        let table = CrossTab {
            rows: Vec::new(),
            columns: vec!["No".into()],
            values: Vec::new(),
        };
        assert!(render_chart(&table, &ChartConfig::internet_service()).is_err());
    }

    #[test]
    fn test_category_at() {
        let rows = vec!["a".to_string(), "b".to_string()];
        assert_eq!(category_at(&rows, 1.0), "b");
        assert_eq!(category_at(&rows, 0.5), "");
        assert_eq!(category_at(&rows, 2.0), "");
        assert_eq!(category_at(&rows, -1.0), "");
    }
}
