//! Return, wealth and summary-statistic derivation.
//!
//! These functions are shared by [`Security`](crate::Security) and
//! [`Portfolio`](crate::Portfolio): both hold monthly series and derive the same
//! quantities from them.
//!
//! Statistics are annualized from monthly observations:
//! - mean = mean(r) × 12
//! - stdev = sample_std(r) × √12
//! - variance = stdev²
//! - sharpe = mean / stdev
//! - Y* = (mean − r_f) / (A × variance)

use crate::config::AnalysisConfig;
use crate::statistics::Statistics;

/// Observation periods per year for monthly data.
pub const PERIODS_PER_YEAR: f64 = 12.0;

/// Simple period returns of a price series.
///
/// The first return is 0 rather than undefined so that downstream means and
/// cumulative products stay finite.
pub fn simple_returns(closes: &[f64]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return returns;
    }
    returns.push(0.0);
    returns.extend(closes.windows(2).map(|pair| pair[1] / pair[0] - 1.0));
    returns
}

/// Cumulative value of one unit invested at the start of the series.
pub fn terminal_wealth(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0_f64, |wealth, r| {
            *wealth *= 1.0 + r;
            Some(*wealth)
        })
        .collect()
}

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1 denominator).
///
/// Fewer than two observations have no dispersion and return 0.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Risk-aversion-adjusted utility Y* = (mean − r_f) / (A × variance).
///
/// Zero variance gives a non-finite result, which is returned as-is.
pub fn utility(mean: f64, variance: f64, params: &AnalysisConfig) -> f64 {
    (mean - params.risk_free_rate) / (params.risk_aversion * variance)
}

/// Annualized summary statistics of a monthly return series.
pub fn summarize(returns: &[f64], params: &AnalysisConfig) -> Statistics {
    let mean = mean(returns) * PERIODS_PER_YEAR;
    let stdev = sample_std(returns) * PERIODS_PER_YEAR.sqrt();
    let variance = stdev * stdev;
    Statistics {
        mean,
        stdev,
        variance,
        sharpe: mean / stdev,
        utility: utility(mean, variance, params),
    }
}
