use crate::calendar::add_months;
use crate::error::{LedgerFrameError, Result};
use chrono::NaiveDate;
use log::debug;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Name of the stable row identifier column added to the expanded frame.
pub const ROW_ID_COLUMN: &str = "row_id";

/// Names of the three columns the expander consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallmentColumns {
    /// Date of the purchase (must already be a `Date` column).
    pub date: String,
    /// Number of installments, an integer of at least 1.
    pub count: String,
    /// Total amount to divide across installments.
    pub value: String,
}

impl Default for InstallmentColumns {
    fn default() -> Self {
        Self {
            date: "date".to_string(),
            count: "installments".to_string(),
            value: "value".to_string(),
        }
    }
}

/// Expands each source row into one row per installment period.
///
/// A row with date `d`, count `n` and value `v` becomes `n` rows carrying
/// `v / n` each, dated `d` advanced by 0, 1, ... n-1 whole months via
/// [`add_months`]. The count column holds the 0-based period offset in the
/// output, and every other source column is carried over unchanged through
/// a join on [`ROW_ID_COLUMN`]. The emitted amounts sum back to `v` exactly.
///
/// A count below 1 or a null in any of the three columns is an error.
pub fn expand_installments(df: &DataFrame, columns: &InstallmentColumns) -> Result<DataFrame> {
    let height = df.height();

    let mut source = df.clone();
    let row_ids: Vec<i64> = (0..height as i64).collect();
    source.with_column(Series::new(ROW_ID_COLUMN.into(), row_ids))?;

    let dates: Vec<Option<NaiveDate>> = source
        .column(&columns.date)
        .map_err(|_| LedgerFrameError::ColumnNotFound(columns.date.clone()))?
        .as_materialized_series()
        .date()?
        .as_date_iter()
        .collect();
    let counts = integer_cells(&source, &columns.count)?;
    let values = float_cells(&source, &columns.value)?;

    let mut out_ids = Vec::new();
    let mut out_dates = Vec::new();
    let mut out_periods = Vec::new();
    let mut out_values = Vec::new();

    for row in 0..height {
        let date = dates[row].ok_or_else(|| missing(&columns.date, row))?;
        let count = counts[row].ok_or_else(|| missing(&columns.count, row))?;
        let value = values[row].ok_or_else(|| missing(&columns.value, row))?;

        if count < 1 {
            return Err(LedgerFrameError::InvalidInstallmentCount { row, count });
        }

        let per_period = value / count as f64;
        debug!(
            "[expand_installments] row {}: {} installments of {} starting {}",
            row, count, per_period, date
        );

        for offset in 0..count {
            out_ids.push(row as i64);
            out_dates.push(add_months(date, offset as u32));
            out_periods.push(offset);
            out_values.push(per_period);
        }
    }

    let expanded = DataFrame::new(vec![
        Series::new(ROW_ID_COLUMN.into(), out_ids).into_column(),
        DateChunked::from_naive_date(columns.date.as_str().into(), out_dates)
            .into_series()
            .into_column(),
        Series::new(columns.count.as_str().into(), out_periods).into_column(),
        Series::new(columns.value.as_str().into(), out_values).into_column(),
    ])?;

    let remainder = source
        .drop(&columns.date)?
        .drop(&columns.count)?
        .drop(&columns.value)?;

    let joined = remainder
        .lazy()
        .join(
            expanded.lazy(),
            [col(ROW_ID_COLUMN)],
            [col(ROW_ID_COLUMN)],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;

    // Join output order is not guaranteed; restore (source row, offset) order.
    let joined = joined.sort(
        [ROW_ID_COLUMN, columns.count.as_str()],
        SortMultipleOptions::default(),
    )?;

    Ok(joined)
}

fn integer_cells(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let series = df
        .column(name)
        .map_err(|_| LedgerFrameError::ColumnNotFound(name.to_string()))?
        .as_materialized_series();
    let cast = series.cast(&DataType::Int64)?;
    if cast.null_count() > series.null_count() {
        return Err(LedgerFrameError::ColumnNotNumeric {
            column: name.to_string(),
            details: "cast to integer produced nulls".to_string(),
        });
    }
    Ok(cast.i64()?.into_iter().collect())
}

fn float_cells(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = df
        .column(name)
        .map_err(|_| LedgerFrameError::ColumnNotFound(name.to_string()))?
        .as_materialized_series();
    let cast = series.cast(&DataType::Float64)?;
    if cast.null_count() > series.null_count() {
        return Err(LedgerFrameError::ColumnNotNumeric {
            column: name.to_string(),
            details: "cast to float produced nulls".to_string(),
        });
    }
    Ok(cast.f64()?.into_iter().collect())
}

fn missing(column: &str, row: usize) -> LedgerFrameError {
    LedgerFrameError::MissingValue {
        column: column.to_string(),
        row,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> InstallmentColumns {
        InstallmentColumns {
            date: "data".to_string(),
            count: "parcelas".to_string(),
            value: "valor".to_string(),
        }
    }

    fn purchase_frame(dates: Vec<NaiveDate>, counts: Vec<i64>, values: Vec<f64>) -> DataFrame {
        let height = dates.len();
        DataFrame::new(vec![
            DateChunked::from_naive_date("data".into(), dates)
                .into_series()
                .into_column(),
            Series::new("parcelas".into(), counts).into_column(),
            Series::new("valor".into(), values).into_column(),
            Series::new("descricao".into(), vec!["compra".to_string(); height]).into_column(),
        ])
        .unwrap()
    }

    #[test]
    fn test_expand_three_installments() {
        let df = purchase_frame(
            vec![NaiveDate::from_ymd_opt(2021, 1, 15).unwrap()],
            vec![3],
            vec![300.0],
        );

        let expanded = expand_installments(&df, &columns()).unwrap();
        assert_eq!(expanded.height(), 3);

        let values = expanded
            .column("valor")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .clone();
        for row in 0..3 {
            assert!((values.get(row).unwrap() - 100.0).abs() < 1e-9);
        }

        let dates: Vec<Option<NaiveDate>> = expanded
            .column("data")
            .unwrap()
            .as_materialized_series()
            .date()
            .unwrap()
            .as_date_iter()
            .collect();
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2021, 1, 15));
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2021, 2, 15));
        assert_eq!(dates[2], NaiveDate::from_ymd_opt(2021, 3, 15));

        let periods = expanded
            .column("parcelas")
            .unwrap()
            .as_materialized_series()
            .i64()
            .unwrap()
            .clone();
        assert_eq!(periods.get(0), Some(0));
        assert_eq!(periods.get(2), Some(2));
    }

    #[test]
    fn test_expand_clamps_end_of_january() {
        let df = purchase_frame(
            vec![NaiveDate::from_ymd_opt(2021, 1, 31).unwrap()],
            vec![2],
            vec![100.0],
        );

        let expanded = expand_installments(&df, &columns()).unwrap();
        let dates: Vec<Option<NaiveDate>> = expanded
            .column("data")
            .unwrap()
            .as_materialized_series()
            .date()
            .unwrap()
            .as_date_iter()
            .collect();
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2021, 2, 28));
    }

    #[test]
    fn test_expand_conserves_total() {
        let df = purchase_frame(
            vec![NaiveDate::from_ymd_opt(2021, 5, 3).unwrap()],
            vec![7],
            vec![1000.0],
        );

        let expanded = expand_installments(&df, &columns()).unwrap();
        let total: f64 = expanded
            .column("valor")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .sum();
        assert!(
            (total - 1000.0).abs() < 1e-6,
            "expanded rows should sum to the source value, got {}",
            total
        );
    }

    #[test]
    fn test_expand_carries_other_columns() {
        let df = purchase_frame(
            vec![NaiveDate::from_ymd_opt(2021, 1, 15).unwrap()],
            vec![2],
            vec![50.0],
        );

        let expanded = expand_installments(&df, &columns()).unwrap();
        let descriptions = expanded
            .column("descricao")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .clone();
        assert_eq!(descriptions.get(0), Some("compra"));
        assert_eq!(descriptions.get(1), Some("compra"));
    }

    #[test]
    fn test_expand_rejects_zero_count() {
        let df = purchase_frame(
            vec![NaiveDate::from_ymd_opt(2021, 1, 15).unwrap()],
            vec![0],
            vec![50.0],
        );

        let result = expand_installments(&df, &columns());
        assert!(matches!(
            result,
            Err(LedgerFrameError::InvalidInstallmentCount { row: 0, count: 0 })
        ));
    }

    #[test]
    fn test_expand_single_installment_is_identity_row() {
        let df = purchase_frame(
            vec![NaiveDate::from_ymd_opt(2021, 6, 10).unwrap()],
            vec![1],
            vec![80.0],
        );

        let expanded = expand_installments(&df, &columns()).unwrap();
        assert_eq!(expanded.height(), 1);

        let values = expanded
            .column("valor")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .clone();
        assert!((values.get(0).unwrap() - 80.0).abs() < 1e-9);
    }
}
