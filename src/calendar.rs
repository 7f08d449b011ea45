use crate::error::{LedgerFrameError, Result};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

/// Highest day-of-month emitted when the target month is February.
/// Leap years are not special-cased: February targets never exceed day 28.
pub const FEBRUARY_DAY_CLAMP: u32 = 28;

/// Highest day-of-month emitted for any target month. Day 31 is never produced.
pub const MAX_DAY: u32 = 30;

/// Advances a date by `offset` whole months using calendar-correct month
/// addition. The day-of-month is preserved unless it is invalid for the
/// target month, in which case it is clamped per [`FEBRUARY_DAY_CLAMP`] and
/// [`MAX_DAY`]. Offsets that are exact multiples of 12 land on the same
/// month of a later year.
pub fn add_months(date: NaiveDate, offset: u32) -> NaiveDate {
    let months = date.month0() + offset;
    let year = date.year() + (months / 12) as i32;
    let month = months % 12 + 1;

    let mut day = date.day();
    if month == 2 && day > FEBRUARY_DAY_CLAMP {
        day = FEBRUARY_DAY_CLAMP;
    }
    if day > MAX_DAY {
        day = MAX_DAY;
    }

    // The clamps above guarantee (year, month, day) is a real date.
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap()
        .pred_opt()
        .unwrap()
}

/// Steps back `months_back` months from `date` and returns the first day of
/// the resulting month.
pub fn previous_month_start(date: NaiveDate, months_back: u32) -> NaiveDate {
    let mut current = date.with_day(1).unwrap();
    for _ in 0..months_back {
        current = current.pred_opt().unwrap().with_day(1).unwrap();
    }
    current
}

/// Derives the composite sortable key `year * 100 + month`, e.g.
/// (2021, 3) -> 202103. Keys compare in chronological order.
pub fn year_month_key(year: i32, month: u32) -> Result<i32> {
    if !(1..=12).contains(&month) {
        return Err(LedgerFrameError::InvalidMonth(month as i64));
    }
    Ok(year * 100 + month as i32)
}

/// Adds a year-month key column derived from the `year_col` and `month_col`
/// columns. Both must be convertible to integers and free of nulls.
pub fn add_year_month_key(
    df: &mut DataFrame,
    year_col: &str,
    month_col: &str,
    out_col: &str,
) -> Result<()> {
    let years = integer_column(df, year_col)?;
    let months = integer_column(df, month_col)?;

    let mut keys = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let year = years.get(row).ok_or_else(|| LedgerFrameError::MissingValue {
            column: year_col.to_string(),
            row,
        })?;
        let month = months.get(row).ok_or_else(|| LedgerFrameError::MissingValue {
            column: month_col.to_string(),
            row,
        })?;
        keys.push(year_month_key(year as i32, month as u32)?);
    }

    df.with_column(Series::new(out_col.into(), keys))?;
    Ok(())
}

fn integer_column(df: &DataFrame, name: &str) -> Result<Int64Chunked> {
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
    Ok(cast.i64()?.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_months_same_day() {
        let date = NaiveDate::from_ymd_opt(2021, 1, 15).unwrap();
        assert_eq!(add_months(date, 0), date);
        assert_eq!(
            add_months(date, 1),
            NaiveDate::from_ymd_opt(2021, 2, 15).unwrap()
        );
        assert_eq!(
            add_months(date, 2),
            NaiveDate::from_ymd_opt(2021, 3, 15).unwrap()
        );
    }

    #[test]
    fn test_add_months_february_clamp() {
        let date = NaiveDate::from_ymd_opt(2021, 1, 31).unwrap();
        assert_eq!(
            add_months(date, 1),
            NaiveDate::from_ymd_opt(2021, 2, 28).unwrap()
        );

        // Leap year February still clamps to 28.
        let date = NaiveDate::from_ymd_opt(2024, 1, 30).unwrap();
        assert_eq!(
            add_months(date, 1),
            NaiveDate::from_ymd_opt(2024, 2, 28).unwrap()
        );
    }

    #[test]
    fn test_add_months_never_emits_day_31() {
        let date = NaiveDate::from_ymd_opt(2021, 1, 31).unwrap();
        assert_eq!(
            add_months(date, 2),
            NaiveDate::from_ymd_opt(2021, 3, 30).unwrap()
        );
        assert_eq!(
            add_months(date, 3),
            NaiveDate::from_ymd_opt(2021, 4, 30).unwrap()
        );
    }

    #[test]
    fn test_add_months_year_boundary() {
        let date = NaiveDate::from_ymd_opt(2021, 11, 10).unwrap();
        assert_eq!(
            add_months(date, 1),
            NaiveDate::from_ymd_opt(2021, 12, 10).unwrap()
        );
        assert_eq!(
            add_months(date, 2),
            NaiveDate::from_ymd_opt(2022, 1, 10).unwrap()
        );
        assert_eq!(
            add_months(date, 14),
            NaiveDate::from_ymd_opt(2023, 1, 10).unwrap()
        );
    }

    #[test]
    fn test_add_months_multiples_of_twelve() {
        let date = NaiveDate::from_ymd_opt(2021, 12, 15).unwrap();
        assert_eq!(
            add_months(date, 12),
            NaiveDate::from_ymd_opt(2022, 12, 15).unwrap()
        );
        assert_eq!(
            add_months(date, 24),
            NaiveDate::from_ymd_opt(2023, 12, 15).unwrap()
        );
    }

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(
            last_day_of_month(2023, 2),
            NaiveDate::from_ymd_opt(2023, 2, 28).unwrap()
        );
        assert_eq!(
            last_day_of_month(2024, 2),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            last_day_of_month(2023, 12),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_previous_month_start() {
        let date = NaiveDate::from_ymd_opt(2023, 3, 17).unwrap();
        assert_eq!(
            previous_month_start(date, 1),
            NaiveDate::from_ymd_opt(2023, 2, 1).unwrap()
        );
        assert_eq!(
            previous_month_start(date, 3),
            NaiveDate::from_ymd_opt(2022, 12, 1).unwrap()
        );
        assert_eq!(
            previous_month_start(date, 0),
            NaiveDate::from_ymd_opt(2023, 3, 1).unwrap()
        );
    }

    #[test]
    fn test_year_month_key() {
        assert_eq!(year_month_key(2021, 3).unwrap(), 202103);
        assert_eq!(year_month_key(2021, 12).unwrap(), 202112);
        assert!(year_month_key(2021, 12).unwrap() > year_month_key(2021, 3).unwrap());
        assert!(year_month_key(2021, 0).is_err());
        assert!(year_month_key(2021, 13).is_err());
    }

    #[test]
    fn test_add_year_month_key() {
        let mut df = polars::df!(
            "ano" => [2021i64, 2021, 2022],
            "mes" => [3i64, 12, 1],
        )
        .unwrap();

        add_year_month_key(&mut df, "ano", "mes", "ano_mes").unwrap();

        let keys = df
            .column("ano_mes")
            .unwrap()
            .as_materialized_series()
            .i32()
            .unwrap();
        assert_eq!(keys.get(0), Some(202103));
        assert_eq!(keys.get(1), Some(202112));
        assert_eq!(keys.get(2), Some(202201));
    }

    #[test]
    fn test_add_year_month_key_rejects_bad_month() {
        let mut df = polars::df!(
            "ano" => [2021i64],
            "mes" => [13i64],
        )
        .unwrap();

        assert!(add_year_month_key(&mut df, "ano", "mes", "ano_mes").is_err());
    }
}
