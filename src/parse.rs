use crate::error::{LedgerFrameError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use polars::prelude::*;

// Year-first token orders are tried before day-first ones, so an ambiguous
// value like "2021-03-05" resolves to year 2021, month 3, day 5.
const YEAR_FIRST_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];
const YEAR_FIRST_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DAY_FIRST_DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y"];

/// Parses a date string, preferring year-first token orders when the order
/// is ambiguous. Returns `None` when no known format matches.
pub fn parse_year_first_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    for format in YEAR_FIRST_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    for format in YEAR_FIRST_DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime.date());
        }
    }
    for format in DAY_FIRST_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    None
}

/// Removes literal `.` thousands separators and turns the `,` decimal
/// separator into `.`, e.g. `"1.234,56"` -> `"1234.56"`.
pub fn normalize_decimal(text: &str) -> String {
    text.trim().replace('.', "").replace(',', ".")
}

/// Parses the named date columns to the `Date` type and the positionally
/// paired value columns to `Float64`, cleaning locale-formatted monetary
/// strings first. Pairing follows zip semantics: value columns beyond the
/// length of the date list are left untouched.
///
/// Unlike the column coercer, failures here propagate: these columns were
/// named explicitly, so an unparseable value is an error.
pub fn parse_value_date_columns(
    df: &mut DataFrame,
    date_cols: &[&str],
    value_cols: &[&str],
) -> Result<()> {
    for name in date_cols {
        parse_date_column(df, name)?;
    }

    for (_, value_col) in date_cols.iter().zip(value_cols.iter()) {
        parse_value_column(df, value_col)?;
    }

    Ok(())
}

fn parse_date_column(df: &mut DataFrame, name: &str) -> Result<()> {
    let series = df
        .column(name)
        .map_err(|_| LedgerFrameError::ColumnNotFound(name.to_string()))?
        .as_materialized_series()
        .clone();

    if series.dtype() == &DataType::Date {
        return Ok(());
    }

    let ca = series.str().map_err(|_| LedgerFrameError::DateParse {
        column: name.to_string(),
        value: format!("<{} column>", series.dtype()),
    })?;

    let mut dates = Vec::with_capacity(ca.len());
    for value in ca {
        match value {
            Some(text) => {
                let date = parse_year_first_date(text).ok_or_else(|| {
                    LedgerFrameError::DateParse {
                        column: name.to_string(),
                        value: text.to_string(),
                    }
                })?;
                dates.push(Some(date));
            }
            None => dates.push(None),
        }
    }

    let parsed = DateChunked::from_naive_date_options(series.name().clone(), dates).into_series();
    df.with_column(parsed)?;
    Ok(())
}

fn parse_value_column(df: &mut DataFrame, name: &str) -> Result<()> {
    let series = df
        .column(name)
        .map_err(|_| LedgerFrameError::ColumnNotFound(name.to_string()))?
        .as_materialized_series()
        .clone();

    let candidate = match series.str() {
        Ok(ca) => {
            debug!("[parse_value_date_columns] cleaning monetary strings in '{}'", name);
            let cleaned: Vec<Option<String>> = ca
                .into_iter()
                .map(|value| value.map(normalize_decimal))
                .collect();
            Series::new(series.name().clone(), cleaned)
        }
        // Already non-string: skip cleanup, go straight to the cast.
        Err(_) => series.clone(),
    };

    let parsed = candidate.cast(&DataType::Float64)?;
    if parsed.null_count() > series.null_count() {
        return Err(LedgerFrameError::ColumnNotNumeric {
            column: name.to_string(),
            details: "value did not parse as a number after separator cleanup".to_string(),
        });
    }

    df.with_column(parsed)?;
    Ok(())
}
