//! # Ledger Frames
//!
//! A library of DataFrame transformation utilities for monthly financial
//! ledgers: expense exports with locale-formatted amounts, installment
//! purchases and month-keyed reporting.
//!
//! ## Core Concepts
//!
//! - **Column Coercion**: best-effort conversion of string columns to dates
//!   (year-first) or numbers, with name-based skip rules for identifiers
//! - **Installment Expansion**: one purchase paid in N installments becomes
//!   N rows, one per month, with the amount divided evenly and the date
//!   advanced by calendar-correct month arithmetic
//! - **Pivot With Totals**: grouped sums reshaped into a wide month-by-group
//!   table with synthetic `~Total` / `~Total_cum` rows and a row-wise total
//! - **Label Normalization**: accent stripping and whitespace cleanup for
//!   column names and categorical labels
//!
//! Every operation is a synchronous, stateless transformation over a
//! [`polars`] `DataFrame`, either pure (returning a new frame) or explicitly
//! in-place.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ledger_frames::*;
//! use polars::prelude::*;
//!
//! let mut df = polars::df!(
//!     "data" => ["2021-01-31", "2021-01-15"],
//!     "categoria" => ["eletrônicos", "mercado"],
//!     "parcelas" => [3i64, 1],
//!     "valor" => ["1.500,00", "250,00"],
//! )?;
//!
//! parse_value_date_columns(&mut df, &["data"], &["valor"])?;
//!
//! let expanded = expand_installments(
//!     &df,
//!     &InstallmentColumns {
//!         date: "data".into(),
//!         count: "parcelas".into(),
//!         value: "valor".into(),
//!     },
//! )?;
//!
//! let report = pivot_with_totals(
//!     &expanded,
//!     &["categoria"],
//!     &["parcelas"],
//!     "valor",
//!     &PivotOptions::default(),
//! )?;
//! ```

pub mod amortization;
pub mod calendar;
pub mod coerce;
pub mod error;
pub mod installments;
pub mod normalize;
pub mod parse;
pub mod pivot;

pub use amortization::{price_schedule, sac_schedule, AmortizationSchedule};
pub use calendar::{
    add_months, add_year_month_key, last_day_of_month, previous_month_start, year_month_key,
    FEBRUARY_DAY_CLAMP, MAX_DAY,
};
pub use coerce::{
    coerce_column_types, coerce_column_types_in_place, CoerceOptions, DEFAULT_DATE_PATTERN,
    DEFAULT_SKIP_PATTERN,
};
pub use error::{LedgerFrameError, Result};
pub use installments::{expand_installments, InstallmentColumns, ROW_ID_COLUMN};
pub use normalize::{
    default_rules, normalize_column_names, normalize_label, normalize_label_with,
    normalize_labels, SubstitutionRule,
};
pub use parse::{normalize_decimal, parse_value_date_columns, parse_year_first_date};
pub use pivot::{
    pivot_with_totals, PivotOptions, CUMULATIVE_TOTAL_MARKER, TOTAL_COLUMN, TOTAL_MARKER,
};
