//! Return covariance and weighted portfolio variance.
//!
//! Var(R_p) = wᵀ Σ w
//!
//! where Σ is the annualized sample covariance of monthly returns (× 12).

use crate::frame::Frame;
use crate::series::PERIODS_PER_YEAR;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Annualized covariance between named return series.
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceMatrix {
    names: Vec<String>,
    values: Array2<f64>,
}

/// Risk of a weighted combination of the covariance matrix's series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedRisk {
    /// wᵀΣw
    pub variance: f64,
    /// √(wᵀΣw)
    pub stdev: f64,
}

impl CovarianceMatrix {
    /// Series names, matching rows and columns.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The matrix (N × N).
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Covariance between two named series.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == a)?;
        let j = self.names.iter().position(|n| n == b)?;
        Some(self.values[[i, j]])
    }

    /// Variance and volatility of `weights` (same order as [`Self::names`]).
    ///
    /// # Panics
    ///
    /// Panics if `weights` does not have one entry per series.
    pub fn weighted_risk(&self, weights: &Array1<f64>) -> WeightedRisk {
        let variance = weights.dot(&self.values.dot(weights));
        WeightedRisk {
            variance,
            stdev: variance.sqrt(),
        }
    }
}

/// Sample covariance (n − 1) of the named columns of `returns`, times 12.
///
/// Missing columns are skipped. With fewer than two rows every entry is 0.
pub fn annualized_covariance(returns: &Frame, names: &[&str]) -> CovarianceMatrix {
    let columns: Vec<(String, Vec<f64>)> = names
        .iter()
        .filter_map(|name| returns.column_vec(name).map(|c| ((*name).to_string(), c)))
        .collect();

    let n_obs = returns.height();
    let k = columns.len();
    let mut values = Array2::<f64>::zeros((k, k));

    if n_obs >= 2 {
        let means: Vec<f64> = columns
            .iter()
            .map(|(_, c)| c.iter().sum::<f64>() / n_obs as f64)
            .collect();
        for i in 0..k {
            for j in i..k {
                let (ci, cj) = (&columns[i].1, &columns[j].1);
                let cov = ci
                    .iter()
                    .zip(cj)
                    .map(|(a, b)| (a - means[i]) * (b - means[j]))
                    .sum::<f64>()
                    / (n_obs - 1) as f64
                    * PERIODS_PER_YEAR;
                values[[i, j]] = cov;
                values[[j, i]] = cov;
            }
        }
    }

    CovarianceMatrix {
        names: columns.into_iter().map(|(name, _)| name).collect(),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{sample_std, summarize};
    use crate::config::AnalysisConfig;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use ndarray::array;

    fn returns_frame() -> Frame {
        let dates = (1..=5)
            .map(|m| NaiveDate::from_ymd_opt(2020, m, 1).unwrap())
            .collect();
        Frame::from_columns(
            dates,
            vec![
                ("A".to_string(), vec![0.0, 0.01, -0.02, 0.03, 0.01]),
                ("B".to_string(), vec![0.0, 0.02, 0.01, -0.01, 0.04]),
            ],
        )
    }

    #[test]
    fn test_symmetric_with_variance_diagonal() {
        let frame = returns_frame();
        let cov = annualized_covariance(&frame, &["A", "B"]);
        assert_eq!(cov.names(), ["A", "B"]);
        assert_relative_eq!(cov.get("A", "B").unwrap(), cov.get("B", "A").unwrap());

        let a = frame.column_vec("A").unwrap();
        assert_relative_eq!(
            cov.get("A", "A").unwrap(),
            sample_std(&a).powi(2) * 12.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_weighted_variance_matches_combined_series() {
        let frame = returns_frame();
        let cov = annualized_covariance(&frame, &["A", "B"]);
        let weights = array![0.3, 0.7];

        let a = frame.column_vec("A").unwrap();
        let b = frame.column_vec("B").unwrap();
        let combined: Vec<f64> = a.iter().zip(&b).map(|(x, y)| 0.3 * x + 0.7 * y).collect();
        let expected = summarize(&combined, &AnalysisConfig::default()).variance;

        let risk = cov.weighted_risk(&weights);
        assert_relative_eq!(risk.variance, expected, epsilon = 1e-12);
        assert_relative_eq!(risk.stdev, expected.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_missing_columns_skipped() {
        let cov = annualized_covariance(&returns_frame(), &["A", "Z"]);
        assert_eq!(cov.names(), ["A"]);
        assert_eq!(cov.values().dim(), (1, 1));
    }
}
