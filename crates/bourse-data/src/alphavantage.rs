//! Alpha Vantage monthly time-series documents read from disk.
//!
//! Two document shapes are accepted:
//!
//! - `TIME_SERIES_MONTHLY_ADJUSTED`: `"Monthly Adjusted Time Series"`, closes
//!   taken from `"5. adjusted close"`;
//! - `TIME_SERIES_MONTHLY`: `"Monthly Time Series"`, closes taken from
//!   `"4. close"`.
//!
//! The ticker is read from `"Meta Data"."2. Symbol"`, not from the file name.

use crate::error::{DataError, Result};
use bourse_analytics::{InMemoryPriceSource, PricePoint, PriceSource};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct MonthlyDocument {
    #[serde(rename = "Meta Data")]
    meta: Option<MetaData>,
    #[serde(rename = "Monthly Adjusted Time Series")]
    adjusted: Option<BTreeMap<String, Bar>>,
    #[serde(rename = "Monthly Time Series")]
    unadjusted: Option<BTreeMap<String, Bar>>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MetaData {
    #[serde(rename = "2. Symbol")]
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct Bar {
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. adjusted close")]
    adjusted_close: Option<String>,
}

/// Parse one Alpha Vantage monthly document into its symbol and closes.
///
/// Adjusted closes are preferred when the document carries them.
pub fn parse_monthly_document(json: &str) -> Result<(String, Vec<PricePoint>)> {
    let doc: MonthlyDocument = serde_json::from_str(json)?;

    if let Some(message) = doc.error_message.or(doc.note) {
        return Err(DataError::Parse(format!("Alpha Vantage response: {message}")));
    }
    let symbol = doc
        .meta
        .map(|m| m.symbol)
        .ok_or_else(|| DataError::Parse("missing \"Meta Data\" section".to_string()))?;

    let (bars, adjusted) = match (doc.adjusted, doc.unadjusted) {
        (Some(bars), _) => (bars, true),
        (None, Some(bars)) => (bars, false),
        (None, None) => {
            return Err(DataError::MissingData {
                symbol,
                reason: "document has no monthly time series".to_string(),
            });
        }
    };

    let points = bars
        .into_iter()
        .map(|(date, bar)| {
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|e| DataError::Parse(format!("{symbol}: bad date {date:?}: {e}")))?;
            let raw = match (adjusted, bar.adjusted_close) {
                (true, Some(adj)) => adj,
                _ => bar.close,
            };
            let close = raw
                .trim()
                .parse::<f64>()
                .map_err(|e| DataError::Parse(format!("{symbol}: bad close {raw:?}: {e}")))?;
            Ok(PricePoint::new(date, close))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((symbol, points))
}

/// Price source backed by Alpha Vantage JSON files.
#[derive(Debug, Clone, Default)]
pub struct AlphaVantageFileSource {
    histories: InMemoryPriceSource,
}

impl AlphaVantageFileSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` file in `dir`.
    ///
    /// Files that cannot be parsed are logged and skipped.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut source = Self::new();
        let mut entries: Vec<_> = fs::read_dir(dir.as_ref())?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        entries.sort();

        for path in entries {
            if let Err(e) = source.load_file(&path) {
                warn!(path = %path.display(), error = %e, "skipping Alpha Vantage file");
            }
        }
        Ok(source)
    }

    /// Load a single document from disk. Returns the symbol it contained.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<String> {
        let json = fs::read_to_string(path.as_ref())?;
        self.add_document(&json)
    }

    /// Add a document from a JSON string. Returns the symbol it contained.
    ///
    /// A later document for the same symbol replaces the earlier one.
    pub fn add_document(&mut self, json: &str) -> Result<String> {
        let (symbol, points) = parse_monthly_document(json)?;
        debug!(symbol = %symbol, months = points.len(), "loaded Alpha Vantage series");
        self.histories.insert(symbol.clone(), points);
        Ok(symbol)
    }

    /// Symbols with a loaded series.
    pub fn symbols(&self) -> Vec<String> {
        self.histories.tickers()
    }
}

impl PriceSource for AlphaVantageFileSource {
    fn monthly_closes(&self, ticker: &str) -> bourse_analytics::Result<Vec<PricePoint>> {
        self.histories.monthly_closes(ticker)
    }
}
