//! Assembling analysis results into a [`PortfolioExport`].

use crate::export::{PortfolioExport, SkippedTable};
use crate::table::Table;
use bourse_analytics::{Comparisons, FactorModel, Portfolio};
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Nothing to report on.
    #[error("Report needs a portfolio")]
    MissingPortfolio,

    /// The comparisons were computed for a different portfolio.
    #[error("Comparisons belong to portfolio {found}, expected {expected}")]
    PortfolioMismatch {
        /// Name of the portfolio in the report
        expected: String,
        /// Name recorded in the comparisons
        found: String,
    },
}

/// Builder for a [`PortfolioExport`].
///
/// Tables are emitted in the order `weights`, `prices`, `returns`, `wealth`,
/// `stats`, then `capm`, `ff3` and `ff5` when comparisons are given. A factor
/// model that failed is listed in [`PortfolioExport::skipped`] instead.
#[derive(Debug, Default)]
pub struct ReportBuilder<'a> {
    name: Option<String>,
    portfolio: Option<&'a Portfolio>,
    comparisons: Option<&'a Comparisons>,
}

impl<'a> ReportBuilder<'a> {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the report name. Defaults to the portfolio name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the portfolio.
    pub const fn portfolio(mut self, portfolio: &'a Portfolio) -> Self {
        self.portfolio = Some(portfolio);
        self
    }

    /// Add factor comparisons.
    pub const fn comparisons(mut self, comparisons: &'a Comparisons) -> Self {
        self.comparisons = Some(comparisons);
        self
    }

    /// Build the export.
    pub fn build(self) -> Result<PortfolioExport, ReportError> {
        let portfolio = self.portfolio.ok_or(ReportError::MissingPortfolio)?;
        if let Some(comparisons) = self.comparisons
            && comparisons.portfolio_name() != portfolio.name()
        {
            return Err(ReportError::PortfolioMismatch {
                expected: portfolio.name().to_string(),
                found: comparisons.portfolio_name().to_string(),
            });
        }

        let mut export =
            PortfolioExport::new(self.name.unwrap_or_else(|| portfolio.name().to_string()));
        export.tables.extend([
            Table::from_weights("weights", portfolio.weights()),
            Table::from_frame("prices", portfolio.prices()),
            Table::from_frame("returns", portfolio.returns()),
            Table::from_frame("wealth", portfolio.wealth()),
            Table::from_statistics("stats", portfolio.statistics()),
        ]);

        if let Some(comparisons) = self.comparisons {
            for model in FactorModel::ALL {
                match comparisons.model(model) {
                    Ok(table) => export
                        .tables
                        .push(Table::from_regression(model.name(), table)),
                    Err(err) => export.skipped.push(SkippedTable {
                        name: model.name().to_string(),
                        reason: err.to_string(),
                    }),
                }
            }
        }

        Ok(export)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bourse_analytics::{AnalysisConfig, FactorTable, Frame, PricePoint, Security};
    use chrono::NaiveDate;

    fn month(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, i as u32 + 1, 1).unwrap()
    }

    fn portfolio(n: usize) -> Portfolio {
        let params = AnalysisConfig::default();
        let a = (0..n).map(|i| PricePoint::new(month(i), 10.0 + (i * 3 % 5) as f64)).collect();
        let b = (0..n).map(|i| PricePoint::new(month(i), 20.0 - (i * 2 % 3) as f64)).collect();
        Portfolio::new(
            "demo",
            vec![
                Security::from_prices("AAPL", a, &params).unwrap(),
                Security::from_prices("IBM", b, &params).unwrap(),
            ],
            params,
        )
        .unwrap()
    }

    fn factors(n: usize) -> FactorTable {
        let col = |k: usize| -> Vec<f64> {
            (0..n)
                .map(|i| ((i + 1) as f64 * (k as f64 + 1.3)).sin() / 20.0)
                .collect()
        };
        FactorTable::new(Frame::from_columns(
            (0..n).map(month).collect(),
            vec![
                ("Mkt-RF".to_string(), col(0)),
                ("SMB".to_string(), col(1)),
                ("HML".to_string(), col(2)),
                ("RMW".to_string(), col(3)),
                ("CMA".to_string(), col(4)),
                ("RF".to_string(), vec![0.001; n]),
            ],
        ))
        .unwrap()
    }

    #[test]
    fn test_requires_portfolio() {
        assert!(matches!(
            ReportBuilder::new().build(),
            Err(ReportError::MissingPortfolio)
        ));
    }

    #[test]
    fn test_portfolio_tables() {
        let p = portfolio(4);
        let export = ReportBuilder::new().portfolio(&p).build().unwrap();
        assert_eq!(export.name, "demo");
        assert_eq!(
            export.table_names(),
            ["weights", "prices", "returns", "wealth", "stats"]
        );
        assert!(export.skipped.is_empty());
    }

    #[test]
    fn test_failed_model_is_skipped() {
        let p = portfolio(5);
        let comparisons = Comparisons::new(&p, factors(5)).unwrap();
        let export = ReportBuilder::new()
            .name("custom")
            .portfolio(&p)
            .comparisons(&comparisons)
            .build()
            .unwrap();
        assert_eq!(export.name, "custom");
        assert!(export.table("capm").is_some());
        assert!(export.table("ff5").is_none());
        assert_eq!(export.skipped.len(), 1);
        assert_eq!(export.skipped[0].name, "ff5");
    }
}
