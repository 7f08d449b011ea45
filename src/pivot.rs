use crate::error::{LedgerFrameError, Result};
use log::debug;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sentinel key for the synthetic row summing every group per period. The
/// leading tilde sorts after ASCII alphanumerics, so synthetic rows land
/// after the real groups under the ascending sort applied to the output.
pub const TOTAL_MARKER: &str = "~Total";

/// Sentinel key for the synthetic running-sum row.
pub const CUMULATIVE_TOTAL_MARKER: &str = "~Total_cum";

/// Name of the row-wise total column appended to the wide table.
pub const TOTAL_COLUMN: &str = "Total";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PivotOptions {
    /// Append a `~Total` row summing every group per period.
    pub totals: bool,
    /// Additionally append a `~Total_cum` row with running sums in period
    /// order. Only takes effect together with `totals`.
    pub cumulative_totals: bool,
}

impl Default for PivotOptions {
    fn default() -> Self {
        Self {
            totals: true,
            cumulative_totals: false,
        }
    }
}

/// Groups rows by `key_columns`, sums `value_column` per distinct
/// combination of `period_columns`, and reshapes the result into a wide
/// table: one column per period (ascending, numeric-aware), one row per key
/// group (ascending by key), cells filled with 0 where a combination has no
/// rows and rounded to 2 decimal places. A row-wise [`TOTAL_COLUMN`] is
/// always appended; synthetic total rows follow [`PivotOptions`].
pub fn pivot_with_totals(
    df: &DataFrame,
    key_columns: &[&str],
    period_columns: &[&str],
    value_column: &str,
    options: &PivotOptions,
) -> Result<DataFrame> {
    let working = prepare_working_frame(df, key_columns, period_columns, value_column)?;

    // Grouping and summing is the engine's job; the reshape below is ours.
    let group_exprs: Vec<Expr> = key_columns
        .iter()
        .chain(period_columns.iter())
        .map(|name| col(*name))
        .collect();
    let grouped = working
        .clone()
        .lazy()
        .group_by(group_exprs)
        .agg([col(value_column).sum()])
        .collect()?;

    let mut cells: HashMap<(Vec<String>, String), f64> = HashMap::new();
    let mut key_rows: Vec<Vec<String>> = Vec::new();
    let mut periods: Vec<String> = Vec::new();

    for row in 0..grouped.height() {
        let keys = render_row(&grouped, key_columns, row)?;
        let period = render_row(&grouped, period_columns, row)?.join("_");
        let value = cell_value(&grouped, value_column, row)?;

        if !key_rows.contains(&keys) {
            key_rows.push(keys.clone());
        }
        if !periods.contains(&period) {
            periods.push(period.clone());
        }
        *cells.entry((keys, period)).or_insert(0.0) += value;
    }

    if options.totals {
        let per_period = period_totals(&working, period_columns, value_column)?;

        let total_keys = vec![TOTAL_MARKER.to_string(); key_columns.len()];
        key_rows.push(total_keys.clone());
        for (period, value) in &per_period {
            cells.insert((total_keys.clone(), period.clone()), *value);
        }

        if options.cumulative_totals {
            let cum_keys = vec![CUMULATIVE_TOTAL_MARKER.to_string(); key_columns.len()];
            key_rows.push(cum_keys.clone());
            let mut running = 0.0;
            for (period, value) in &per_period {
                running += value;
                cells.insert((cum_keys.clone(), period.clone()), running);
            }
        }
    }

    sort_periods(&mut periods);
    key_rows.sort();

    debug!(
        "[pivot_with_totals] {} key groups x {} periods",
        key_rows.len(),
        periods.len()
    );

    build_wide_frame(key_columns, &key_rows, &periods, &cells)
}

/// Casts key and period columns to strings (categorical comparison) and the
/// value column to `Float64`, erroring when the value column is not numeric.
fn prepare_working_frame(
    df: &DataFrame,
    key_columns: &[&str],
    period_columns: &[&str],
    value_column: &str,
) -> Result<DataFrame> {
    let mut working = df.clone();

    for name in key_columns.iter().chain(period_columns.iter()) {
        let series = working
            .column(name)
            .map_err(|_| LedgerFrameError::ColumnNotFound(name.to_string()))?
            .as_materialized_series();
        working.with_column(series.cast(&DataType::String)?)?;
    }

    let value = working
        .column(value_column)
        .map_err(|_| LedgerFrameError::ColumnNotFound(value_column.to_string()))?
        .as_materialized_series();
    let cast = value.cast(&DataType::Float64)?;
    if cast.null_count() > value.null_count() {
        return Err(LedgerFrameError::ColumnNotNumeric {
            column: value_column.to_string(),
            details: "cast to float produced nulls".to_string(),
        });
    }
    working.with_column(cast)?;

    Ok(working)
}

/// Sums the value column per period across all key groups, in ascending
/// period order. Feeds both the `~Total` and `~Total_cum` rows.
fn period_totals(
    working: &DataFrame,
    period_columns: &[&str],
    value_column: &str,
) -> Result<Vec<(String, f64)>> {
    let period_exprs: Vec<Expr> = period_columns.iter().map(|name| col(*name)).collect();
    let totals = working
        .clone()
        .lazy()
        .group_by(period_exprs)
        .agg([col(value_column).sum()])
        .collect()?;

    let mut rows = Vec::with_capacity(totals.height());
    for row in 0..totals.height() {
        let period = render_row(&totals, period_columns, row)?.join("_");
        let value = cell_value(&totals, value_column, row)?;
        rows.push((period, value));
    }

    let mut order: Vec<String> = rows.iter().map(|(period, _)| period.clone()).collect();
    sort_periods(&mut order);
    rows.sort_by_key(|(period, _)| {
        order
            .iter()
            .position(|candidate| candidate == period)
            .unwrap_or(usize::MAX)
    });

    Ok(rows)
}

fn build_wide_frame(
    key_columns: &[&str],
    key_rows: &[Vec<String>],
    periods: &[String],
    cells: &HashMap<(Vec<String>, String), f64>,
) -> Result<DataFrame> {
    let mut out_columns: Vec<Column> = Vec::new();

    for (idx, key_name) in key_columns.iter().enumerate() {
        let values: Vec<String> = key_rows.iter().map(|keys| keys[idx].clone()).collect();
        out_columns.push(Series::new((*key_name).into(), values).into_column());
    }

    let mut row_totals = vec![0.0; key_rows.len()];
    for period in periods {
        let values: Vec<f64> = key_rows
            .iter()
            .enumerate()
            .map(|(row, keys)| {
                let value = cells
                    .get(&(keys.clone(), period.clone()))
                    .copied()
                    .unwrap_or(0.0);
                let rounded = round2(value);
                row_totals[row] += rounded;
                rounded
            })
            .collect();
        out_columns.push(Series::new(period.as_str().into(), values).into_column());
    }

    let totals: Vec<f64> = row_totals.into_iter().map(round2).collect();
    out_columns.push(Series::new(TOTAL_COLUMN.into(), totals).into_column());

    Ok(DataFrame::new(out_columns)?)
}

fn render_row(df: &DataFrame, columns: &[&str], row: usize) -> Result<Vec<String>> {
    let mut rendered = Vec::with_capacity(columns.len());
    for name in columns {
        let ca = df
            .column(name)
            .map_err(|_| LedgerFrameError::ColumnNotFound(name.to_string()))?
            .as_materialized_series()
            .str()?
            .clone();
        rendered.push(ca.get(row).unwrap_or("").to_string());
    }
    Ok(rendered)
}

fn cell_value(df: &DataFrame, value_column: &str, row: usize) -> Result<f64> {
    let ca = df
        .column(value_column)
        .map_err(|_| LedgerFrameError::ColumnNotFound(value_column.to_string()))?
        .as_materialized_series()
        .f64()?
        .clone();
    Ok(ca.get(row).unwrap_or(0.0))
}

/// Ascending; numeric when every period renders as a number, lexical otherwise.
fn sort_periods(periods: &mut [String]) {
    let all_numeric = periods
        .iter()
        .all(|period| period.parse::<f64>().is_ok());
    if all_numeric {
        periods.sort_by(|a, b| {
            let left: f64 = a.parse().unwrap();
            let right: f64 = b.parse().unwrap();
            left.partial_cmp(&right).unwrap_or(std::cmp::Ordering::Equal)
        });
    } else {
        periods.sort();
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
