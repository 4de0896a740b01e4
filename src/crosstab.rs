//! Cross-tabulation of two categorical columns, with optional normalisation

use polars::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;

const INDEX_KEY: &str = "__index";
const COLUMN_KEY: &str = "__column";
const VALUE_KEY: &str = "__value";

/// How cell values are produced from the grouped rows
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregate {
    /// Number of rows per cell
    Count,
    /// Mean of a numeric column per cell
    Mean { values: String },
}

/// Normalisation applied to a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalize {
    #[default]
    None,
    /// Divide every cell by the grand total
    All,
    /// Divide every cell by its row total
    Index,
    /// Divide every cell by its column total
    Columns,
}

/// Ordering of row labels
#[derive(Debug, Clone, PartialEq)]
pub enum RowOrder {
    Lexical,
    /// Sort labels by their numeric value
    Numeric,
    /// Fixed category order; labels not listed are dropped
    Explicit(Vec<String>),
}

/// Dense table of values keyed by row and column labels
#[derive(Debug, Clone, PartialEq)]
pub struct CrossTab {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    /// Row-major values, `rows.len() x columns.len()`
    pub values: Vec<Vec<f64>>,
}

impl CrossTab {
    pub fn value(&self, row: &str, column: &str) -> Option<f64> {
        let r = self.rows.iter().position(|label| label == row)?;
        let c = self.columns.iter().position(|label| label == column)?;
        Some(self.values[r][c])
    }

    /// Values of one column, in row order
    pub fn column_values(&self, column: usize) -> Vec<f64> {
        self.values.iter().map(|row| row[column]).collect()
    }

    /// Sum of each row, ignoring NaN cells
    pub fn row_totals(&self) -> Vec<f64> {
        self.values
            .iter()
            .map(|row| row.iter().filter(|v| !v.is_nan()).sum())
            .collect()
    }

    fn column_totals(&self) -> Vec<f64> {
        (0..self.columns.len())
            .map(|c| {
                self.values
                    .iter()
                    .map(|row| row[c])
                    .filter(|v| !v.is_nan())
                    .sum()
            })
            .collect()
    }

    /// Smallest and largest non-NaN value, if any
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .fold(None, |range, &v| match range {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    /// Table normalised to proportions. Zero totals leave cells at zero.
    pub fn normalized(&self, mode: Normalize) -> CrossTab {
        let divide = |value: f64, total: f64| if total == 0.0 { 0.0 } else { value / total };

        let values = match mode {
            Normalize::None => self.values.clone(),
            Normalize::All => {
                let total: f64 = self.row_totals().iter().sum();
                self.map_cells(|_, _, v| divide(v, total))
            }
            Normalize::Index => {
                let totals = self.row_totals();
                self.map_cells(|r, _, v| divide(v, totals[r]))
            }
            Normalize::Columns => {
                let totals = self.column_totals();
                self.map_cells(|_, c, v| divide(v, totals[c]))
            }
        };

        CrossTab {
            rows: self.rows.clone(),
            columns: self.columns.clone(),
            values,
        }
    }

    /// Every cell multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> CrossTab {
        CrossTab {
            rows: self.rows.clone(),
            columns: self.columns.clone(),
            values: self.map_cells(|_, _, v| v * factor),
        }
    }

    /// Keep the `n` rows with the largest totals, in their current order.
    /// Ties go to the lexically smaller label.
    pub fn top_rows(&self, n: usize) -> CrossTab {
        let totals = self.row_totals();
        let mut ranked: Vec<usize> = (0..self.rows.len()).collect();
        ranked.sort_by(|&a, &b| {
            totals[b]
                .partial_cmp(&totals[a])
                .unwrap_or(Ordering::Equal)
                .then_with(|| self.rows[a].cmp(&self.rows[b]))
        });
        let mut keep: Vec<usize> = ranked.into_iter().take(n).collect();
        keep.sort_unstable();

        CrossTab {
            rows: keep.iter().map(|&r| self.rows[r].clone()).collect(),
            columns: self.columns.clone(),
            values: keep.iter().map(|&r| self.values[r].clone()).collect(),
        }
    }

    /// Reorder rows
    pub fn with_row_order(mut self, order: &RowOrder) -> CrossTab {
        let mut indices: Vec<usize> = (0..self.rows.len()).collect();
        match order {
            RowOrder::Lexical => indices.sort_by(|&a, &b| self.rows[a].cmp(&self.rows[b])),
            RowOrder::Numeric => indices.sort_by(|&a, &b| {
                let parse = |label: &str| label.parse::<f64>().unwrap_or(f64::INFINITY);
                parse(&self.rows[a])
                    .partial_cmp(&parse(&self.rows[b]))
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| self.rows[a].cmp(&self.rows[b]))
            }),
            RowOrder::Explicit(categories) => {
                indices = categories
                    .iter()
                    .filter_map(|category| self.rows.iter().position(|label| label == category))
                    .collect();
            }
        }

        let rows = indices.iter().map(|&r| self.rows[r].clone()).collect();
        let values = indices
            .iter()
            .map(|&r| std::mem::take(&mut self.values[r]))
            .collect();
        CrossTab {
            rows,
            columns: self.columns,
            values,
        }
    }

    fn map_cells<F>(&self, f: F) -> Vec<Vec<f64>>
    where
        F: Fn(usize, usize, f64) -> f64,
    {
        self.values
            .iter()
            .enumerate()
            .map(|(r, row)| row.iter().enumerate().map(|(c, &v)| f(r, c, v)).collect())
            .collect()
    }
}

/// Group `frame` by `index` and `columns` and aggregate each cell.
///
/// Rows and columns come back in lexical order; empty cells are 0 for
/// counts and NaN for means. Rows with a null key are skipped.
pub fn crosstab(
    frame: &DataFrame,
    index: &str,
    columns: &str,
    aggregate: &Aggregate,
) -> crate::Result<CrossTab> {
    let (source, value) = match aggregate {
        Aggregate::Count => (col(columns), col(VALUE_KEY).count()),
        Aggregate::Mean { values } => (
            col(values).cast(DataType::Float64),
            col(VALUE_KEY).mean(),
        ),
    };

    let grouped = frame
        .clone()
        .lazy()
        .select([
            col(index).cast(DataType::String).alias(INDEX_KEY),
            col(columns).cast(DataType::String).alias(COLUMN_KEY),
            source.alias(VALUE_KEY),
        ])
        .drop_nulls(Some(vec![col(INDEX_KEY), col(COLUMN_KEY)]))
        .group_by([col(INDEX_KEY), col(COLUMN_KEY)])
        .agg([value.alias(VALUE_KEY)])
        .collect()?;

    let keys_r = grouped.column(INDEX_KEY)?.str()?;
    let keys_c = grouped.column(COLUMN_KEY)?.str()?;
    let cells = grouped.column(VALUE_KEY)?.cast(&DataType::Float64)?;
    let cells = cells.f64()?;

    let mut rows: Vec<String> = Vec::new();
    let mut cols: Vec<String> = Vec::new();
    let mut lookup: HashMap<(String, String), f64> = HashMap::new();
    for ((r, c), v) in keys_r.into_iter().zip(keys_c).zip(cells) {
        let (Some(r), Some(c)) = (r, c) else {
            continue;
        };
        if !rows.iter().any(|label| label == r) {
            rows.push(r.to_string());
        }
        if !cols.iter().any(|label| label == c) {
            cols.push(c.to_string());
        }
        lookup.insert((r.to_string(), c.to_string()), v.unwrap_or(f64::NAN));
    }
    rows.sort();
    cols.sort();

    let empty = match aggregate {
        Aggregate::Count => 0.0,
        Aggregate::Mean { .. } => f64::NAN,
    };
    let values = rows
        .iter()
        .map(|r| {
            cols.iter()
                .map(|c| lookup.get(&(r.clone(), c.clone())).copied().unwrap_or(empty))
                .collect()
        })
        .collect();

    Ok(CrossTab {
        rows,
        columns: cols,
        values,
    })
}

/// Frequency of each value of `column`, in lexical order
pub fn value_counts(frame: &DataFrame, column: &str) -> crate::Result<Vec<(String, f64)>> {
    let counts = frame
        .clone()
        .lazy()
        .select([col(column).cast(DataType::String).alias(INDEX_KEY)])
        .drop_nulls(None)
        .group_by([col(INDEX_KEY)])
        .agg([col(INDEX_KEY).count().alias(VALUE_KEY)])
        .collect()?;

    let labels = counts.column(INDEX_KEY)?.str()?;
    let totals = counts.column(VALUE_KEY)?.cast(&DataType::Float64)?;
    let mut pairs: Vec<(String, f64)> = labels
        .into_iter()
        .zip(totals.f64()?)
        .filter_map(|(label, total)| Some((label?.to_string(), total.unwrap_or(0.0))))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(pairs)
}
