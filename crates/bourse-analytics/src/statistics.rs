//! Summary statistics and the merged comparison table.

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Annualized statistics of one return series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Annualized mean return
    pub mean: f64,
    /// Annualized standard deviation
    pub stdev: f64,
    /// Annualized variance (stdev²)
    pub variance: f64,
    /// Sharpe ratio (mean / stdev)
    pub sharpe: f64,
    /// Risk-aversion-adjusted utility Y*
    pub utility: f64,
}

impl Statistics {
    /// Value of a single statistic.
    pub const fn get(&self, statistic: Statistic) -> f64 {
        match statistic {
            Statistic::Mean => self.mean,
            Statistic::Stdev => self.stdev,
            Statistic::Var => self.variance,
            Statistic::Sharpe => self.sharpe,
            Statistic::Utility => self.utility,
        }
    }
}

/// Row keys of the statistics table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statistic {
    /// Annualized mean return
    Mean,
    /// Annualized standard deviation
    Stdev,
    /// Annualized variance
    Var,
    /// Sharpe ratio
    Sharpe,
    /// Utility Y*
    Utility,
}

impl Statistic {
    /// All statistics in table order.
    pub const ALL: [Self; 5] = [
        Self::Mean,
        Self::Stdev,
        Self::Var,
        Self::Sharpe,
        Self::Utility,
    ];

    /// Display label used as the row key.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Mean => "Mean",
            Self::Stdev => "Stdev",
            Self::Var => "Var",
            Self::Sharpe => "Sharpe",
            Self::Utility => "Y*",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Mean => 0,
            Self::Stdev => 1,
            Self::Var => 2,
            Self::Sharpe => 3,
            Self::Utility => 4,
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Statistics of the portfolio and every security, side by side.
///
/// Rows are [`Statistic::ALL`]; columns are `"Portfolio"` followed by each
/// security in portfolio order.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsTable {
    entities: Vec<String>,
    values: Array2<f64>,
}

impl StatisticsTable {
    /// Merge per-entity statistics into one table. Column order follows `entries`.
    pub fn merge<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a Statistics)>,
    {
        let entries: Vec<_> = entries.into_iter().collect();
        let mut values = Array2::<f64>::zeros((Statistic::ALL.len(), entries.len()));
        for (j, (_, stats)) in entries.iter().enumerate() {
            for statistic in Statistic::ALL {
                values[[statistic.index(), j]] = stats.get(statistic);
            }
        }
        Self {
            entities: entries.iter().map(|(name, _)| (*name).to_string()).collect(),
            values,
        }
    }

    /// Column names.
    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    /// Value of `statistic` for `entity`.
    pub fn get(&self, statistic: Statistic, entity: &str) -> Option<f64> {
        let j = self.position(entity)?;
        Some(self.values[[statistic.index(), j]])
    }

    /// One statistic across all entities.
    pub fn row(&self, statistic: Statistic) -> ArrayView1<'_, f64> {
        self.values.row(statistic.index())
    }

    /// All statistics of one entity.
    pub fn column(&self, entity: &str) -> Option<Statistics> {
        let j = self.position(entity)?;
        let col = self.values.column(j);
        Some(Statistics {
            mean: col[Statistic::Mean.index()],
            stdev: col[Statistic::Stdev.index()],
            variance: col[Statistic::Var.index()],
            sharpe: col[Statistic::Sharpe.index()],
            utility: col[Statistic::Utility.index()],
        })
    }

    /// Overwrite a single cell. Unknown entities are ignored.
    pub(crate) fn set(&mut self, statistic: Statistic, entity: &str, value: f64) {
        if let Some(j) = self.position(entity) {
            self.values[[statistic.index(), j]] = value;
        }
    }

    /// Underlying matrix, statistics × entities.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    fn position(&self, entity: &str) -> Option<usize> {
        self.entities.iter().position(|e| e == entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(seed: f64) -> Statistics {
        Statistics {
            mean: seed,
            stdev: seed + 1.0,
            variance: seed + 2.0,
            sharpe: seed + 3.0,
            utility: seed + 4.0,
        }
    }

    #[test]
    fn test_merge_keeps_column_order() {
        let p = stats(0.0);
        let a = stats(10.0);
        let b = stats(20.0);
        let table = StatisticsTable::merge([("Portfolio", &p), ("AAPL", &a), ("IBM", &b)]);

        assert_eq!(table.entities(), ["Portfolio", "AAPL", "IBM"]);
        assert_eq!(table.get(Statistic::Mean, "AAPL"), Some(10.0));
        assert_eq!(table.get(Statistic::Utility, "IBM"), Some(24.0));
        assert_eq!(table.get(Statistic::Var, "MSFT"), None);
        assert_eq!(table.row(Statistic::Sharpe).to_vec(), vec![3.0, 13.0, 23.0]);
        assert_eq!(table.column("Portfolio"), Some(p));
    }

    #[test]
    fn test_set_single_cell() {
        let p = stats(0.0);
        let mut table = StatisticsTable::merge([("Portfolio", &p)]);
        table.set(Statistic::Utility, "Portfolio", -1.5);
        table.set(Statistic::Utility, "missing", 9.0);
        assert_eq!(table.get(Statistic::Utility, "Portfolio"), Some(-1.5));
        assert_eq!(table.get(Statistic::Mean, "Portfolio"), Some(0.0));
    }

    #[test]
    fn test_labels() {
        let labels: Vec<_> = Statistic::ALL.iter().map(Statistic::label).collect();
        assert_eq!(labels, ["Mean", "Stdev", "Var", "Sharpe", "Y*"]);
        assert_eq!(Statistic::Utility.to_string(), "Y*");
    }
}
