use crate::error::Result;
use crate::parse::parse_year_first_date;
use log::debug;
use polars::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Matches localized date-like column names (date/data/dia/day/timestamp).
pub const DEFAULT_DATE_PATTERN: &str = "(?i)date|data|dia|day|timestamp";

/// Matches identifier-like column names that must never be coerced to
/// numeric, plus columns literally named with a single blank.
pub const DEFAULT_SKIP_PATTERN: &str = "_id$|^id_|_id_|^ $";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoerceOptions {
    /// Regex selecting columns to parse as dates.
    pub date_pattern: String,
    /// Regex selecting columns to leave untouched.
    pub skip_pattern: String,
}

impl Default for CoerceOptions {
    fn default() -> Self {
        Self {
            date_pattern: DEFAULT_DATE_PATTERN.to_string(),
            skip_pattern: DEFAULT_SKIP_PATTERN.to_string(),
        }
    }
}

/// Pure variant of [`coerce_column_types_in_place`]: returns a new frame and
/// leaves the input untouched.
pub fn coerce_column_types(df: &DataFrame, options: &CoerceOptions) -> Result<DataFrame> {
    let mut out = df.clone();
    coerce_column_types_in_place(&mut out, options)?;
    Ok(out)
}

/// Best-effort conversion of every column to a date or numeric type.
///
/// Columns whose names match the date pattern are parsed with year-first
/// disambiguation; columns matching the skip pattern are left alone; all
/// remaining string columns are tried as integer, then float. A column that
/// fails conversion is left unmodified with a debug notice — only genuine
/// engine errors and invalid option patterns propagate.
pub fn coerce_column_types_in_place(df: &mut DataFrame, options: &CoerceOptions) -> Result<()> {
    let date_re = Regex::new(&options.date_pattern)?;
    let skip_re = Regex::new(&options.skip_pattern)?;

    let names: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|name| name.to_string())
        .collect();

    for name in names {
        let series = df.column(&name)?.as_materialized_series().clone();

        if date_re.is_match(&name) {
            if series.dtype() == &DataType::Date {
                continue;
            }
            match try_parse_date_column(&series) {
                Some(parsed) => {
                    df.with_column(parsed)?;
                }
                None => debug!(
                    "[coerce_column_types] column '{}' skipped: date parse failed",
                    name
                ),
            }
            continue;
        }

        if skip_re.is_match(&name) {
            debug!(
                "[coerce_column_types] column '{}' skipped: matches skip pattern",
                name
            );
            continue;
        }

        if series.dtype() != &DataType::String {
            continue;
        }
        match try_parse_numeric_column(&series) {
            Some(parsed) => {
                df.with_column(parsed)?;
            }
            None => debug!(
                "[coerce_column_types] column '{}' skipped: not numeric",
                name
            ),
        }
    }

    Ok(())
}

/// Parses a string column as dates. Nulls pass through; any other
/// unparseable value makes the whole column fail.
fn try_parse_date_column(series: &Series) -> Option<Series> {
    let ca = series.str().ok()?;

    let mut dates = Vec::with_capacity(ca.len());
    for value in ca {
        match value {
            Some(text) => dates.push(Some(parse_year_first_date(text)?)),
            None => dates.push(None),
        }
    }

    Some(DateChunked::from_naive_date_options(series.name().clone(), dates).into_series())
}

/// Parses a string column as integers, falling back to floats. A cast that
/// introduces new nulls is a parse-format mismatch, not a result.
fn try_parse_numeric_column(series: &Series) -> Option<Series> {
    for dtype in [DataType::Int64, DataType::Float64] {
        if let Ok(cast) = series.cast(&dtype) {
            if cast.null_count() == series.null_count() {
                return Some(cast);
            }
        }
    }
    None
}
