//! Monthly close prices from Yahoo Finance.

use crate::error::{DataError, Result};
use bourse_analytics::PricePoint;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;
use yahoo_finance_api as yahoo;

/// Bar interval requested from Yahoo.
const MONTHLY_INTERVAL: &str = "1mo";

/// Yahoo Finance quote provider with rate limiting.
pub struct YahooQuoteProvider {
    provider: yahoo::YahooConnector,
    rate_limit_delay: Duration,
}

impl std::fmt::Debug for YahooQuoteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooQuoteProvider")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .finish_non_exhaustive()
    }
}

impl YahooQuoteProvider {
    /// Create a provider with default rate limiting (1 req/sec).
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(Duration::from_millis(1000))
    }

    /// Create a provider that waits `rate_limit_delay` after every request.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self> {
        Ok(Self {
            provider: yahoo::YahooConnector::new()?,
            rate_limit_delay,
        })
    }

    /// Delay applied after each request.
    pub const fn rate_limit_delay(&self) -> Duration {
        self.rate_limit_delay
    }

    /// Fetch monthly adjusted closes for a single symbol.
    ///
    /// # Arguments
    /// * `symbol` - The ticker symbol (e.g., "AAPL")
    /// * `start` - Start of the history
    /// * `end` - End of the history
    ///
    /// # Returns
    /// One [`PricePoint`] per monthly bar, dated by the bar's timestamp.
    pub async fn fetch_monthly_closes(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>> {
        validate_request(symbol, start, end)?;

        let start_time = time::OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;
        let end_time = time::OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;

        let response = self
            .provider
            .get_quote_history_interval(symbol, start_time, end_time, MONTHLY_INTERVAL)
            .await?;

        let quotes = response
            .quotes()
            .map_err(|e| DataError::YahooApi(e.to_string()))?;

        if quotes.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No data returned from Yahoo Finance".to_string(),
            });
        }

        let points = quotes
            .iter()
            .map(|q| {
                DateTime::from_timestamp(q.timestamp, 0)
                    .map(|dt| PricePoint::new(dt.date_naive(), q.adjclose))
                    .ok_or_else(|| {
                        DataError::TimeConversion(format!("timestamp {} out of range", q.timestamp))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(symbol, bars = points.len(), "fetched monthly closes");

        // Apply rate limiting
        sleep(self.rate_limit_delay).await;

        Ok(points)
    }
}

fn validate_request(symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if start > end {
        return Err(DataError::InvalidDateRange {
            start: start.to_rfc3339(),
            end: end.to_rfc3339(),
        });
    }
    if symbol.trim().is_empty() {
        return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
    }
    Ok(())
}
