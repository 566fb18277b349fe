//! Price history inputs.

use crate::error::{AnalyticsError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One monthly close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Month of the observation
    pub date: NaiveDate,
    /// Adjusted close price
    pub close: f64,
}

impl PricePoint {
    /// Create a new price point.
    pub const fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// A provider of monthly close-price histories.
pub trait PriceSource {
    /// Monthly adjusted closes for `ticker`, in any order.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::DataUnavailable`] when the source has no
    /// record of the ticker.
    fn monthly_closes(&self, ticker: &str) -> Result<Vec<PricePoint>>;
}

impl<S: PriceSource + ?Sized> PriceSource for &S {
    fn monthly_closes(&self, ticker: &str) -> Result<Vec<PricePoint>> {
        (**self).monthly_closes(ticker)
    }
}

/// Price histories held in memory, keyed by ticker.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceSource {
    histories: HashMap<String, Vec<PricePoint>>,
}

impl InMemoryPriceSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the history of `ticker`.
    pub fn insert(&mut self, ticker: impl Into<String>, points: Vec<PricePoint>) {
        self.histories.insert(ticker.into(), points);
    }

    /// Builder-style [`InMemoryPriceSource::insert`].
    pub fn with_history(mut self, ticker: impl Into<String>, points: Vec<PricePoint>) -> Self {
        self.insert(ticker, points);
        self
    }

    /// Tickers with a stored history.
    pub fn tickers(&self) -> Vec<String> {
        let mut tickers: Vec<_> = self.histories.keys().cloned().collect();
        tickers.sort();
        tickers
    }

    /// Number of stored histories.
    pub fn len(&self) -> usize {
        self.histories.len()
    }

    /// Whether no history is stored.
    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}

impl PriceSource for InMemoryPriceSource {
    fn monthly_closes(&self, ticker: &str) -> Result<Vec<PricePoint>> {
        match self.histories.get(ticker) {
            Some(points) if !points.is_empty() => Ok(points.clone()),
            Some(_) => Err(AnalyticsError::data_unavailable(ticker, "empty price history")),
            None => Err(AnalyticsError::data_unavailable(ticker, "ticker not in source")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(m: u32, close: f64) -> PricePoint {
        PricePoint::new(NaiveDate::from_ymd_opt(2022, m, 1).unwrap(), close)
    }

    #[test]
    fn test_in_memory_lookup() {
        let source = InMemoryPriceSource::new().with_history("AAPL", vec![point(1, 10.0)]);
        assert_eq!(source.len(), 1);
        assert_eq!(source.monthly_closes("AAPL").unwrap(), vec![point(1, 10.0)]);
    }

    #[test]
    fn test_missing_ticker() {
        let source = InMemoryPriceSource::new();
        assert!(source.is_empty());
        let err = source.monthly_closes("IBM").unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::DataUnavailable { ref symbol, .. } if symbol == "IBM"
        ));
    }

    #[test]
    fn test_empty_history_is_unavailable() {
        let source = InMemoryPriceSource::new().with_history("IBM", vec![]);
        assert!(matches!(
            source.monthly_closes("IBM"),
            Err(AnalyticsError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn test_tickers_sorted() {
        let source = InMemoryPriceSource::new()
            .with_history("MSFT", vec![point(1, 1.0)])
            .with_history("AAPL", vec![point(1, 1.0)]);
        assert_eq!(source.tickers(), vec!["AAPL", "MSFT"]);
    }
}
