//! Month-indexed tables.
//!
//! A [`Frame`] is an ordered list of month dates, an ordered list of column
//! names and a dense `dates × columns` matrix. Prices, returns, wealth, risk
//! premiums and factor data are all carried as frames.
//!
//! Conversion to and from polars [`DataFrame`]s encodes dates as an `i32`
//! day number (days from the common era) in a `date` column, which is what
//! the alignment joins key on.

use crate::error::{AnalyticsError, Result};
use chrono::{Datelike, NaiveDate};
use ndarray::{Array2, ArrayView1, Axis};
use polars::prelude::*;
use std::collections::HashSet;

/// Name of the date key column in polars frames.
pub const DATE_COLUMN: &str = "date";

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub(crate) fn date_key(date: NaiveDate) -> i32 {
    date.num_days_from_ce()
}

pub(crate) fn date_from_key(key: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(key)
}

/// Date-indexed table of f64 columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    dates: Vec<NaiveDate>,
    columns: Vec<String>,
    values: Array2<f64>,
}

impl Frame {
    /// Create a frame. `values` must be `dates.len() × columns.len()`.
    ///
    /// # Panics
    ///
    /// Panics if the shape of `values` does not match `dates` and `columns`.
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<String>, values: Array2<f64>) -> Self {
        assert_eq!(
            values.dim(),
            (dates.len(), columns.len()),
            "frame values must be dates × columns"
        );
        Self {
            dates,
            columns,
            values,
        }
    }

    /// Build a frame from named columns.
    ///
    /// Months past the end of a short column are NaN; values past the last
    /// date are ignored.
    pub fn from_columns(dates: Vec<NaiveDate>, columns: Vec<(String, Vec<f64>)>) -> Self {
        let mut values = Array2::<f64>::from_elem((dates.len(), columns.len()), f64::NAN);
        for (j, (_, data)) in columns.iter().enumerate() {
            for (i, v) in data.iter().enumerate().take(dates.len()) {
                values[[i, j]] = *v;
            }
        }
        let names = columns.into_iter().map(|(name, _)| name).collect();
        Self::new(dates, names, values)
    }

    /// Row dates, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Underlying matrix, dates × columns.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.dates.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Whether the frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Whether a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// A column by name.
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.column_index(name).map(|j| self.values.column(j))
    }

    /// A column by name, copied into a vector.
    pub fn column_vec(&self, name: &str) -> Option<Vec<f64>> {
        self.column(name).map(|c| c.to_vec())
    }

    /// The row for `date`.
    pub fn row(&self, date: NaiveDate) -> Option<ArrayView1<'_, f64>> {
        self.row_index(date).map(|i| self.values.row(i))
    }

    /// A single cell.
    pub fn get(&self, date: NaiveDate, column: &str) -> Option<f64> {
        let i = self.row_index(date)?;
        let j = self.column_index(column)?;
        Some(self.values[[i, j]])
    }

    /// Apply a series transformation to every column.
    ///
    /// `f` must return a vector of the same length as its input.
    pub fn map_columns<F>(&self, f: F) -> Self
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        let mut values = Array2::<f64>::zeros(self.values.dim());
        for (j, column) in self.values.axis_iter(Axis(1)).enumerate() {
            let mapped = f(&column.to_vec());
            for (i, v) in mapped.into_iter().enumerate().take(self.height()) {
                values[[i, j]] = v;
            }
        }
        Self::new(self.dates.clone(), self.columns.clone(), values)
    }

    /// Keep only rows whose date is in `dates`, preserving this frame's order.
    pub fn retain_dates(&self, dates: &[NaiveDate]) -> Self {
        let keep: HashSet<NaiveDate> = dates.iter().copied().collect();
        let rows: Vec<usize> = self
            .dates
            .iter()
            .enumerate()
            .filter(|(_, d)| keep.contains(d))
            .map(|(i, _)| i)
            .collect();
        Self::new(
            rows.iter().map(|&i| self.dates[i]).collect(),
            self.columns.clone(),
            self.values.select(Axis(0), &rows),
        )
    }

    /// A frame with only the named columns, in the given order.
    ///
    /// Returns the first missing name on failure.
    pub fn select(&self, names: &[&str]) -> std::result::Result<Self, String> {
        let indices = names
            .iter()
            .map(|name| self.column_index(name).ok_or_else(|| (*name).to_string()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::new(
            self.dates.clone(),
            names.iter().map(|n| (*n).to_string()).collect(),
            self.values.select(Axis(1), &indices),
        ))
    }

    /// Convert to a polars frame with an `i32` date key column.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.width() + 1);
        let keys: Vec<i32> = self.dates.iter().map(|d| date_key(*d)).collect();
        columns.push(Series::new(DATE_COLUMN.into(), keys).into());
        for (j, name) in self.columns.iter().enumerate() {
            let data: Vec<f64> = self.values.column(j).to_vec();
            columns.push(Series::new(name.as_str().into(), data).into());
        }
        DataFrame::new(columns)
    }

    /// Read a polars frame produced by [`Frame::to_dataframe`] or a join of such frames.
    ///
    /// Every column other than the date key becomes a frame column; nulls become NaN.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let keys = df.column(DATE_COLUMN)?.i32()?;
        let dates = keys
            .into_iter()
            .map(|key| {
                key.and_then(date_from_key).ok_or_else(|| {
                    AnalyticsError::Polars(PolarsError::ComputeError(
                        "invalid date key in frame".into(),
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .filter(|name| name.as_str() != DATE_COLUMN)
            .map(|name| name.to_string())
            .collect();

        let mut values = Array2::<f64>::zeros((dates.len(), names.len()));
        for (j, name) in names.iter().enumerate() {
            let column = df.column(name)?.cast(&DataType::Float64)?;
            for (i, v) in column.f64()?.into_iter().enumerate() {
                values[[i, j]] = v.unwrap_or(f64::NAN);
            }
        }

        Ok(Self::new(dates, names, values))
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn row_index(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }
}
