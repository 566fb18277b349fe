//! Weighted baskets of securities.
//!
//! A [`Portfolio`] owns a fixed set of [`Security`] values and a weight per
//! security. From these it derives:
//!
//! - an aligned price [`Frame`]: one row per month present in *every*
//!   security (inner join), one column per security plus a synthetic
//!   `"Portfolio"` column equal to Σ wᵢ · priceᵢ;
//! - returns and terminal-wealth frames, column by column;
//! - the portfolio's own [`Statistics`] and a [`StatisticsTable`] comparing it
//!   with every security.
//!
//! Months missing from any one security are dropped from the aligned frame.
//! No gap filling is done.

use crate::config::AnalysisConfig;
use crate::covariance::{self, CovarianceMatrix, WeightedRisk};
use crate::error::{AnalyticsError, Result};
use crate::frame::{DATE_COLUMN, Frame, date_key};
use crate::security::Security;
use crate::series;
use crate::statistics::{Statistic, Statistics, StatisticsTable};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::iter;
use tracing::{debug, warn};

/// Column name of the synthetic weighted series.
pub const PORTFOLIO_COLUMN: &str = "Portfolio";

/// Security name → weight, in portfolio order.
///
/// Weights need not sum to one and may be negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    entries: Vec<(String, f64)>,
}

impl Weights {
    /// Equal weights 1/N for the given names.
    pub fn equal<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let names: Vec<&str> = names.into_iter().collect();
        let weight = 1.0 / names.len() as f64;
        Self {
            entries: names.into_iter().map(|n| (n.to_string(), weight)).collect(),
        }
    }

    /// Weight of `name`.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, w)| *w)
    }

    /// `(name, weight)` pairs in portfolio order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, w)| (n.as_str(), *w))
    }

    /// Weights in portfolio order.
    pub fn to_array(&self) -> Array1<f64> {
        self.entries.iter().map(|(_, w)| *w).collect()
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn set(&mut self, name: &str, weight: f64) -> bool {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => {
                entry.1 = weight;
                true
            }
            None => false,
        }
    }
}

/// Everything derived from securities + weights. Replaced as a unit.
#[derive(Debug, Clone, PartialEq)]
struct Derived {
    prices: Frame,
    returns: Frame,
    wealth: Frame,
    stats: Statistics,
    statistics: StatisticsTable,
}

/// A named, weighted set of securities.
#[derive(Debug, Clone)]
pub struct Portfolio {
    name: String,
    securities: Vec<Security>,
    weights: Weights,
    params: AnalysisConfig,
    derived: Derived,
}

impl Portfolio {
    /// Build a portfolio with equal weights and derive every table.
    ///
    /// # Errors
    ///
    /// [`AnalyticsError::EmptyPortfolio`] for no securities,
    /// [`AnalyticsError::DuplicateSecurity`] when two securities share a name and
    /// [`AnalyticsError::ReservedName`] for a security called `Portfolio` or `date`.
    pub fn new(
        name: impl Into<String>,
        securities: Vec<Security>,
        params: AnalysisConfig,
    ) -> Result<Self> {
        validate_composition(&securities)?;
        let weights = Weights::equal(securities.iter().map(Security::name));
        let derived = derive(&securities, &weights, &params)?;
        Ok(Self {
            name: name.into(),
            securities,
            weights,
            params,
            derived,
        })
    }

    /// Reset every weight to 1/N and re-derive.
    pub fn reset_weights(&mut self) -> Result<()> {
        let weights = Weights::equal(self.securities.iter().map(Security::name));
        self.apply(weights)
    }

    /// Overwrite the weights named in `new_weights` and re-derive every table.
    ///
    /// Securities not named keep their weight. On error nothing changes.
    ///
    /// # Errors
    ///
    /// [`AnalyticsError::UnknownSecurity`] if a name is not in the portfolio and
    /// [`AnalyticsError::InvalidWeight`] for a non-finite value.
    pub fn update_weights(&mut self, new_weights: &HashMap<String, f64>) -> Result<()> {
        let mut weights = self.weights.clone();
        // Sorted so the reported error does not depend on hash order.
        let mut names: Vec<&String> = new_weights.keys().collect();
        names.sort();
        for name in names {
            let value = new_weights[name];
            if !value.is_finite() {
                return Err(AnalyticsError::InvalidWeight {
                    name: name.clone(),
                    value,
                });
            }
            if !weights.set(name, value) {
                return Err(AnalyticsError::UnknownSecurity(name.clone()));
            }
        }
        self.apply(weights)
    }

    /// Recompute Y* for the portfolio and every security.
    ///
    /// Only the Y* row of the statistics table changes. The parameters are kept
    /// for later re-derivations.
    pub fn update_utility(&mut self, params: AnalysisConfig) {
        self.params = params;
        for security in &mut self.securities {
            let y = security.update_utility(&params);
            self.derived
                .statistics
                .set(Statistic::Utility, security.name(), y);
        }
        let stats = &mut self.derived.stats;
        stats.utility = series::utility(stats.mean, stats.variance, &params);
        self.derived
            .statistics
            .set(Statistic::Utility, PORTFOLIO_COLUMN, stats.utility);
    }

    /// Portfolio name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Securities in portfolio order.
    pub fn securities(&self) -> &[Security] {
        &self.securities
    }

    /// A security by name.
    pub fn security(&self, name: &str) -> Option<&Security> {
        self.securities.iter().find(|s| s.name() == name)
    }

    /// Current weights.
    pub const fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Risk parameters used for Y*.
    pub const fn params(&self) -> &AnalysisConfig {
        &self.params
    }

    /// Aligned prices: securities then `"Portfolio"`.
    pub const fn prices(&self) -> &Frame {
        &self.derived.prices
    }

    /// Returns of every aligned column; first row is zero.
    pub const fn returns(&self) -> &Frame {
        &self.derived.returns
    }

    /// Terminal wealth of every aligned column.
    pub const fn wealth(&self) -> &Frame {
        &self.derived.wealth
    }

    /// Statistics of the weighted series.
    pub const fn stats(&self) -> &Statistics {
        &self.derived.stats
    }

    /// Statistics of the portfolio and every security.
    pub const fn statistics(&self) -> &StatisticsTable {
        &self.derived.statistics
    }

    /// Annualized covariance of the securities' aligned returns.
    pub fn covariance_matrix(&self) -> CovarianceMatrix {
        let names: Vec<&str> = self.securities.iter().map(Security::name).collect();
        covariance::annualized_covariance(&self.derived.returns, &names)
    }

    /// Variance and volatility of the weighted securities, wᵀΣw.
    pub fn weighted_risk(&self) -> WeightedRisk {
        self.covariance_matrix()
            .weighted_risk(&self.weights.to_array())
    }

    fn apply(&mut self, weights: Weights) -> Result<()> {
        let derived = derive(&self.securities, &weights, &self.params)?;
        self.weights = weights;
        self.derived = derived;
        Ok(())
    }
}

fn validate_composition(securities: &[Security]) -> Result<()> {
    if securities.is_empty() {
        return Err(AnalyticsError::EmptyPortfolio);
    }
    let mut seen = HashSet::new();
    for security in securities {
        let name = security.name();
        if name == PORTFOLIO_COLUMN || name == DATE_COLUMN {
            return Err(AnalyticsError::ReservedName(name.to_string()));
        }
        if !seen.insert(name) {
            return Err(AnalyticsError::DuplicateSecurity(name.to_string()));
        }
    }
    Ok(())
}

/// Run the full pipeline: prices → returns → wealth → stats → merged table.
fn derive(securities: &[Security], weights: &Weights, params: &AnalysisConfig) -> Result<Derived> {
    let prices = align_prices(securities, weights)?;
    let returns = prices.map_columns(series::simple_returns);
    let wealth = returns.map_columns(series::terminal_wealth);

    let portfolio_returns = returns.column_vec(PORTFOLIO_COLUMN).unwrap_or_default();
    let stats = series::summarize(&portfolio_returns, params);
    let statistics = StatisticsTable::merge(
        iter::once((PORTFOLIO_COLUMN, &stats))
            .chain(securities.iter().map(|s| (s.name(), s.stats()))),
    );

    debug!(
        rows = prices.height(),
        mean = stats.mean,
        stdev = stats.stdev,
        "derived portfolio tables"
    );

    Ok(Derived {
        prices,
        returns,
        wealth,
        stats,
        statistics,
    })
}

fn price_frame(security: &Security) -> PolarsResult<LazyFrame> {
    let keys: Vec<i32> = security.prices().iter().map(|p| date_key(p.date)).collect();
    let closes: Vec<f64> = security.prices().iter().map(|p| p.close).collect();
    let df = DataFrame::new(vec![
        Series::new(DATE_COLUMN.into(), keys).into(),
        Series::new(security.name().into(), closes).into(),
    ])?;
    Ok(df.lazy())
}

/// Inner-join every security's closes on month and add the weighted column.
fn align_prices(securities: &[Security], weights: &Weights) -> Result<Frame> {
    let (first, rest) = securities
        .split_first()
        .ok_or(AnalyticsError::EmptyPortfolio)?;

    let mut joined = price_frame(first)?;
    for security in rest {
        joined = joined.join(
            price_frame(security)?,
            [col(DATE_COLUMN)],
            [col(DATE_COLUMN)],
            JoinArgs::new(JoinType::Inner),
        );
    }

    let weighted = securities
        .iter()
        .map(|s| col(s.name()) * lit(weights.get(s.name()).unwrap_or(0.0)))
        .reduce(|acc, term| acc + term)
        .ok_or(AnalyticsError::EmptyPortfolio)?;

    let df = joined
        .with_column(weighted.alias(PORTFOLIO_COLUMN))
        .sort([DATE_COLUMN], SortMultipleOptions::default())
        .collect()?;
    let frame = Frame::from_dataframe(&df)?;

    let all_months: BTreeSet<_> = securities
        .iter()
        .flat_map(|s| s.prices().iter().map(|p| p.date))
        .collect();
    let dropped = all_months.len() - frame.height();
    if frame.is_empty() {
        warn!(
            securities = securities.len(),
            "securities share no common months; aligned price table is empty"
        );
    } else if dropped > 0 {
        debug!(dropped, kept = frame.height(), "inner join dropped months");
    }

    Ok(frame)
}
