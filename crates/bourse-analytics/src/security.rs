//! A single instrument's monthly price history and its derived statistics.

use crate::config::AnalysisConfig;
use crate::error::{AnalyticsError, Result};
use crate::frame::month_start;
use crate::series;
use crate::source::{PricePoint, PriceSource};
use crate::statistics::Statistics;
use tracing::debug;

/// One instrument with derived returns, terminal wealth and statistics.
///
/// Prices are sorted by month with one observation per month. `returns` and
/// `wealth` always have the same length as `prices`.
#[derive(Debug, Clone, PartialEq)]
pub struct Security {
    name: String,
    prices: Vec<PricePoint>,
    returns: Vec<f64>,
    wealth: Vec<f64>,
    stats: Statistics,
}

impl Security {
    /// Load `name` from a price source and derive its statistics.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::DataUnavailable`] if the source has no data for
    /// the ticker, or any error from [`Security::from_prices`].
    pub fn new<S>(name: &str, source: &S, params: &AnalysisConfig) -> Result<Self>
    where
        S: PriceSource + ?Sized,
    {
        let points = source.monthly_closes(name)?;
        Self::from_prices(name, points, params)
    }

    /// Build a security from raw price points.
    ///
    /// Dates are moved to the first of their month and sorted ascending. When
    /// two points fall in the same month the later one in input order wins.
    ///
    /// # Errors
    ///
    /// [`AnalyticsError::DataUnavailable`] for an empty series and
    /// [`AnalyticsError::InvalidPrice`] for a negative or non-finite close.
    pub fn from_prices(
        name: &str,
        points: Vec<PricePoint>,
        params: &AnalysisConfig,
    ) -> Result<Self> {
        if points.is_empty() {
            return Err(AnalyticsError::data_unavailable(name, "no price observations"));
        }

        let mut normalized: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            if !point.close.is_finite() || point.close < 0.0 {
                return Err(AnalyticsError::InvalidPrice {
                    symbol: name.to_string(),
                    date: point.date,
                    value: point.close,
                });
            }
            normalized.push(PricePoint::new(month_start(point.date), point.close));
        }

        // Stable sort keeps input order within a month; keep the last of each run.
        normalized.sort_by_key(|p| p.date);
        let mut prices: Vec<PricePoint> = Vec::with_capacity(normalized.len());
        for point in normalized {
            match prices.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => prices.push(point),
            }
        }

        let closes: Vec<f64> = prices.iter().map(|p| p.close).collect();
        let returns = series::simple_returns(&closes);
        let wealth = series::terminal_wealth(&returns);
        let stats = series::summarize(&returns, params);

        debug!(
            security = name,
            observations = prices.len(),
            mean = stats.mean,
            stdev = stats.stdev,
            "derived security statistics"
        );

        Ok(Self {
            name: name.to_string(),
            prices,
            returns,
            wealth,
            stats,
        })
    }

    /// Ticker symbol.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Monthly closes, ascending by date.
    pub fn prices(&self) -> &[PricePoint] {
        &self.prices
    }

    /// Period returns; the first is 0.
    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    /// Cumulative terminal wealth of one unit.
    pub fn wealth(&self) -> &[f64] {
        &self.wealth
    }

    /// Summary statistics.
    pub const fn stats(&self) -> &Statistics {
        &self.stats
    }

    /// Recompute Y* with new risk inputs. Prices, returns and the other
    /// statistics are left untouched.
    pub fn update_utility(&mut self, params: &AnalysisConfig) -> f64 {
        self.stats.utility = series::utility(self.stats.mean, self.stats.variance, params);
        self.stats.utility
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemoryPriceSource;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn points(closes: &[f64]) -> Vec<PricePoint> {
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| PricePoint::new(date(2020, i as u32 + 1, 28), *c))
            .collect()
    }

    #[test]
    fn test_dates_normalized_and_sorted() {
        let mut input = points(&[100.0, 102.0, 101.0]);
        input.reverse();
        let security = Security::from_prices("AAPL", input, &AnalysisConfig::default()).unwrap();

        let dates: Vec<_> = security.prices().iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![date(2020, 1, 1), date(2020, 2, 1), date(2020, 3, 1)]);
        assert_eq!(security.prices()[0].close, 100.0);
    }

    #[test]
    fn test_same_month_keeps_last() {
        let input = vec![
            PricePoint::new(date(2021, 5, 3), 10.0),
            PricePoint::new(date(2021, 5, 31), 11.0),
            PricePoint::new(date(2021, 6, 30), 12.0),
        ];
        let security = Security::from_prices("X", input, &AnalysisConfig::default()).unwrap();
        assert_eq!(security.prices().len(), 2);
        assert_eq!(security.prices()[0].close, 11.0);
    }

    #[test]
    fn test_derived_lengths_match_prices() {
        let prices = points(&[50.0, 55.0, 44.0, 46.0]);
        let security = Security::from_prices("IBM", prices, &AnalysisConfig::default()).unwrap();
        assert_eq!(security.returns().len(), security.prices().len());
        assert_eq!(security.wealth().len(), security.prices().len());
        assert_eq!(security.returns()[0], 0.0);
        assert_relative_eq!(security.wealth()[3], 46.0 / 50.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_prices_unavailable() {
        let err = Security::from_prices("IBM", vec![], &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalyticsError::DataUnavailable { .. }));
    }

    #[test]
    fn test_negative_price_rejected() {
        let err = Security::from_prices("IBM", points(&[1.0, -2.0]), &AnalysisConfig::default())
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidPrice { value, .. } if value == -2.0));
    }

    #[test]
    fn test_new_from_source() {
        let source = InMemoryPriceSource::new().with_history("AAPL", points(&[1.0, 2.0]));
        let security = Security::new("AAPL", &source, &AnalysisConfig::default()).unwrap();
        assert_eq!(security.name(), "AAPL");
        assert!(matches!(
            Security::new("IBM", &source, &AnalysisConfig::default()),
            Err(AnalyticsError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn test_single_point_sharpe_is_non_finite() {
        let security =
            Security::from_prices("ONE", points(&[42.0]), &AnalysisConfig::default()).unwrap();
        assert_eq!(security.returns(), [0.0]);
        assert_eq!(security.stats().stdev, 0.0);
        assert!(!security.stats().sharpe.is_finite());
    }

    #[test]
    fn test_update_utility_only_touches_y_star() {
        let mut security = Security::from_prices(
            "AAPL",
            points(&[100.0, 104.0, 101.0, 108.0, 110.0]),
            &AnalysisConfig::default(),
        )
        .unwrap();
        let before = *security.stats();
        let prices = security.prices().to_vec();

        let y = security.update_utility(&AnalysisConfig::new(0.01, 0.5));

        let after = security.stats();
        assert_eq!(after.mean, before.mean);
        assert_eq!(after.variance, before.variance);
        assert_eq!(after.sharpe, before.sharpe);
        assert_eq!(security.prices(), prices.as_slice());
        assert_relative_eq!(y, (before.mean - 0.01) / (0.5 * before.variance), epsilon = 1e-12);
        assert_eq!(after.utility, y);
    }
}
