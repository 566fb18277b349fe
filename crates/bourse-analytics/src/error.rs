//! Error types for analytics operations.

use crate::regression::RegressionError;
use chrono::NaiveDate;
use thiserror::Error;

/// Result type for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Errors that can occur while building securities, portfolios and comparisons.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The price source has no usable history for a ticker.
    #[error("No data available for {symbol}: {reason}")]
    DataUnavailable {
        /// Ticker that was requested
        symbol: String,
        /// Why the data could not be provided
        reason: String,
    },

    /// A close price is negative or not a finite number.
    #[error("Invalid close price {value} for {symbol} on {date}")]
    InvalidPrice {
        /// Ticker the price belongs to
        symbol: String,
        /// Month of the observation
        date: NaiveDate,
        /// Offending value
        value: f64,
    },

    /// A weight update referenced a security that is not in the portfolio.
    #[error("Unknown security: {0}")]
    UnknownSecurity(String),

    /// A weight is not a finite number.
    #[error("Invalid weight {value} for {name}")]
    InvalidWeight {
        /// Security the weight was meant for
        name: String,
        /// Offending value
        value: f64,
    },

    /// A portfolio needs at least one security.
    #[error("Portfolio must contain at least one security")]
    EmptyPortfolio,

    /// Two securities in one portfolio share a name.
    #[error("Duplicate security in portfolio: {0}")]
    DuplicateSecurity(String),

    /// A security uses a name reserved for a derived column.
    #[error("Security name is reserved: {0}")]
    ReservedName(String),

    /// Regression failure.
    #[error("Regression error: {0}")]
    Regression(#[from] RegressionError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

impl AnalyticsError {
    /// Build a [`AnalyticsError::DataUnavailable`] for `symbol`.
    pub fn data_unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }
}
