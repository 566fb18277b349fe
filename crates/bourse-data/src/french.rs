//! Fama-French factor tables from CSV.
//!
//! The file needs a header row. The date column is the one named `date`
//! (any case), or the first column otherwise. Every other column must be
//! numeric; empty cells become NaN. Rows whose date cannot be read (such as
//! the annual block or copyright footer of the published files) are skipped.

use crate::error::{DataError, Result};
use bourse_analytics::frame::month_start;
use bourse_analytics::{FactorTable, Frame};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// How to read a factor CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FactorCsvOptions {
    /// Values are in percent and are divided by 100
    #[serde(default)]
    pub percent: bool,
}

impl FactorCsvOptions {
    /// Options for a file published in percent units.
    pub const fn percent() -> Self {
        Self { percent: true }
    }
}

/// Parse a month from one of `YYYY-MM-DD`, `MM/DD/YYYY`, `YYYY-MM` or `YYYYMM`.
///
/// The result is always the first of the month.
pub fn parse_month(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    let date = if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        d
    } else if let Ok(d) = NaiveDate::parse_from_str(s, "%m/%d/%Y") {
        d
    } else if s.len() == 7 && s.as_bytes()[4] == b'-' {
        NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok()?
    } else if s.len() == 6 && s.bytes().all(|b| b.is_ascii_digit()) {
        let year: i32 = s[..4].parse().ok()?;
        let month: u32 = s[4..].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, 1)?
    } else {
        return None;
    };
    Some(month_start(date))
}

/// Read a factor table from any reader.
///
/// # Errors
///
/// [`DataError::Csv`] for malformed CSV, [`DataError::Parse`] for a
/// non-numeric cell and [`DataError::Analytics`] when there is no `RF` column.
pub fn parse_factor_csv<R: Read>(reader: R, options: FactorCsvOptions) -> Result<FactorTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let date_index = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("date"))
        .unwrap_or(0);
    let names: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != date_index)
        .map(|(_, h)| h.to_string())
        .collect();

    let mut dates = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    let mut skipped = 0usize;

    for record in reader.records() {
        let record = record?;
        let Some(date) = record.get(date_index).and_then(parse_month) else {
            skipped += 1;
            continue;
        };
        let cells = record
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != date_index)
            .map(|(_, cell)| cell);
        let mut row = Vec::with_capacity(names.len());
        for (j, cell) in cells.take(names.len()).enumerate() {
            let value = if cell.is_empty() {
                f64::NAN
            } else {
                cell.parse::<f64>().map_err(|e| {
                    DataError::Parse(format!("{}: bad value {cell:?} on {date}: {e}", names[j]))
                })?
            };
            row.push(value);
        }
        row.resize(names.len(), f64::NAN);

        dates.push(date);
        for (column, value) in columns.iter_mut().zip(row) {
            column.push(value);
        }
    }

    if skipped > 0 {
        warn!(skipped, "skipped factor rows without a readable month");
    }
    debug!(months = dates.len(), factors = names.len(), "parsed factor table");

    let frame = Frame::from_columns(dates, names.into_iter().zip(columns).collect());
    let table = FactorTable::new(frame)?;
    Ok(if options.percent {
        table.from_percent()
    } else {
        table
    })
}

/// Read a factor table from a CSV file.
pub fn load_factor_csv(path: impl AsRef<Path>, options: FactorCsvOptions) -> Result<FactorTable> {
    let file = File::open(path.as_ref())?;
    parse_factor_csv(file, options)
}
