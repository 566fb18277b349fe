//! Explicit constructors for the usual analysis flow.
//!
//! Nothing here is global: callers own the source, the portfolio and the
//! comparisons, and rebuild comparisons after changing weights.

use bourse_analytics::{
    AnalysisConfig, Comparisons, FactorTable, Portfolio, PriceSource, Result, Security,
};
use std::collections::HashMap;
use tracing::debug;

/// Load every ticker from `source` and build a portfolio.
///
/// Securities start equally weighted; `weights` then overrides the tickers it
/// names. An empty map keeps equal weights.
///
/// # Errors
///
/// Fails if a ticker has no usable history, if the composition is invalid or
/// if `weights` names a ticker outside `tickers`.
pub fn build_portfolio<S, T>(
    name: &str,
    tickers: &[T],
    weights: &HashMap<String, f64>,
    source: &S,
    params: AnalysisConfig,
) -> Result<Portfolio>
where
    S: PriceSource + ?Sized,
    T: AsRef<str>,
{
    let securities = tickers
        .iter()
        .map(|ticker| Security::new(ticker.as_ref(), source, &params))
        .collect::<Result<Vec<_>>>()?;

    let mut portfolio = Portfolio::new(name, securities, params)?;
    if !weights.is_empty() {
        portfolio.update_weights(weights)?;
    }
    debug!(
        portfolio = name,
        securities = tickers.len(),
        months = portfolio.prices().height(),
        "built portfolio"
    );
    Ok(portfolio)
}

/// Fit CAPM, Fama-French 3 and 5 for a portfolio.
///
/// # Errors
///
/// Fails if the portfolio's returns cannot be joined with `factors`. A model
/// that cannot be fitted is recorded inside the returned [`Comparisons`].
pub fn build_comparisons(portfolio: &Portfolio, factors: FactorTable) -> Result<Comparisons> {
    Comparisons::new(portfolio, factors)
}
