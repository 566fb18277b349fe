//! Factor-model regressions of portfolio excess returns.
//!
//! [`Comparisons`] takes a snapshot of a [`Portfolio`]'s returns, subtracts the
//! risk-free rate month by month, and fits one OLS model per entity (every
//! security, then `"Portfolio"`) for each of three factor sets:
//!
//! | model | factors                          |
//! |-------|----------------------------------|
//! | CAPM  | Mkt-RF                           |
//! | FF3   | Mkt-RF, SMB, HML                 |
//! | FF5   | Mkt-RF, SMB, HML, RMW, CMA       |
//!
//! The snapshot does not observe later changes to the portfolio.

use crate::error::{AnalyticsError, Result};
use crate::frame::{Frame, month_start};
use crate::portfolio::Portfolio;
use crate::regression::{self, RegressionError};
use chrono::NaiveDate;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// Name of the mandatory risk-free column.
pub const RISK_FREE_COLUMN: &str = "RF";

/// Monthly factor returns with a risk-free column.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorTable {
    frame: Frame,
}

impl FactorTable {
    /// Wrap a frame of factor returns.
    ///
    /// Dates are moved to the first of their month and sorted; when two rows
    /// fall in the same month the later one wins.
    ///
    /// # Errors
    ///
    /// [`RegressionError::MissingFactor`] if there is no `RF` column.
    pub fn new(frame: Frame) -> Result<Self> {
        if !frame.has_column(RISK_FREE_COLUMN) {
            return Err(RegressionError::MissingFactor(RISK_FREE_COLUMN.to_string()).into());
        }

        let mut rows: Vec<(NaiveDate, usize)> = frame
            .dates()
            .iter()
            .enumerate()
            .map(|(i, d)| (month_start(*d), i))
            .collect();
        rows.sort_by_key(|(d, _)| *d);
        let mut kept: Vec<(NaiveDate, usize)> = Vec::with_capacity(rows.len());
        for row in rows {
            match kept.last_mut() {
                Some(last) if last.0 == row.0 => *last = row,
                _ => kept.push(row),
            }
        }

        let mut values = Array2::<f64>::zeros((kept.len(), frame.width()));
        for (i, (_, src)) in kept.iter().enumerate() {
            values.row_mut(i).assign(&frame.values().row(*src));
        }
        let frame = Frame::new(
            kept.into_iter().map(|(d, _)| d).collect(),
            frame.columns().to_vec(),
            values,
        );
        Ok(Self { frame })
    }

    /// Divide every value by 100, for files published in percent.
    pub fn from_percent(self) -> Self {
        let frame = self.frame.map_columns(|c| c.iter().map(|v| v / 100.0).collect());
        Self { frame }
    }

    /// The underlying frame, `RF` included.
    pub const fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Column names other than `RF`.
    pub fn factor_names(&self) -> Vec<&str> {
        self.frame
            .columns()
            .iter()
            .map(String::as_str)
            .filter(|c| *c != RISK_FREE_COLUMN)
            .collect()
    }
}

/// The three fixed factor sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactorModel {
    /// Market excess return only
    Capm,
    /// Market, size and value
    FamaFrench3,
    /// Market, size, value, profitability and investment
    FamaFrench5,
}

impl FactorModel {
    /// Every model, in reporting order.
    pub const ALL: [Self; 3] = [Self::Capm, Self::FamaFrench3, Self::FamaFrench5];

    /// Factor columns regressed on.
    pub const fn factors(self) -> &'static [&'static str] {
        match self {
            Self::Capm => &["Mkt-RF"],
            Self::FamaFrench3 => &["Mkt-RF", "SMB", "HML"],
            Self::FamaFrench5 => &["Mkt-RF", "SMB", "HML", "RMW", "CMA"],
        }
    }

    /// Short table name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Capm => "capm",
            Self::FamaFrench3 => "ff3",
            Self::FamaFrench5 => "ff5",
        }
    }
}

impl fmt::Display for FactorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Capm => "CAPM",
            Self::FamaFrench3 => "Fama-French 3-Factor",
            Self::FamaFrench5 => "Fama-French 5-Factor",
        };
        f.write_str(label)
    }
}

/// Slope on one factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorLoading {
    /// Factor column
    pub factor: String,
    /// Coefficient
    pub beta: f64,
    /// t-statistic of the coefficient
    pub t_value: f64,
}

/// Regression output for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionRow {
    /// Security name or `"Portfolio"`
    pub entity: String,
    /// Intercept
    pub alpha: f64,
    /// t-statistic of the intercept
    pub alpha_t: f64,
    /// One loading per factor, in factor order
    pub loadings: Vec<FactorLoading>,
    /// Coefficient of determination
    pub r_squared: f64,
    /// Months used in the fit
    pub observations: usize,
}

impl RegressionRow {
    /// Values in [`RegressionTable::columns`] order.
    pub fn values(&self) -> Vec<f64> {
        let mut values = Vec::with_capacity(2 + 2 * self.loadings.len());
        values.push(self.alpha);
        values.push(self.alpha_t);
        for loading in &self.loadings {
            values.push(loading.beta);
            values.push(loading.t_value);
        }
        values
    }

    /// Loading on `factor`.
    pub fn loading(&self, factor: &str) -> Option<&FactorLoading> {
        self.loadings.iter().find(|l| l.factor == factor)
    }
}

/// One regression per entity against a common set of factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTable {
    factors: Vec<String>,
    rows: Vec<RegressionRow>,
}

impl RegressionTable {
    /// Factor columns, in regression order.
    pub fn factors(&self) -> &[String] {
        &self.factors
    }

    /// Rows: every security then `"Portfolio"`.
    pub fn rows(&self) -> &[RegressionRow] {
        &self.rows
    }

    /// Row for an entity.
    pub fn get(&self, entity: &str) -> Option<&RegressionRow> {
        self.rows.iter().find(|r| r.entity == entity)
    }

    /// Entity names in row order.
    pub fn entities(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.entity.as_str()).collect()
    }

    /// `Alpha`, `Alpha T-Score`, then `<factor>_Beta` and `<factor>_T_Value` per factor.
    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec!["Alpha".to_string(), "Alpha T-Score".to_string()];
        for factor in &self.factors {
            columns.push(format!("{factor}_Beta"));
            columns.push(format!("{factor}_T_Value"));
        }
        columns
    }

    /// Months used in each fit.
    pub fn observations(&self) -> usize {
        self.rows.first().map_or(0, |r| r.observations)
    }
}

/// Excess returns and factor regressions for one portfolio snapshot.
#[derive(Debug, Clone)]
pub struct Comparisons {
    portfolio_name: String,
    factors: FactorTable,
    premiums: Frame,
    capm: std::result::Result<RegressionTable, RegressionError>,
    ff3: std::result::Result<RegressionTable, RegressionError>,
    ff5: std::result::Result<RegressionTable, RegressionError>,
}

impl Comparisons {
    /// Compute risk premiums for `portfolio` and fit all three factor models.
    ///
    /// A model that cannot be fitted keeps its error; the others are unaffected.
    ///
    /// # Errors
    ///
    /// [`RegressionError::MissingFactor`] if `factors` has no `RF` column.
    pub fn new(portfolio: &Portfolio, factors: FactorTable) -> Result<Self> {
        let premiums = risk_premiums(portfolio.returns(), &factors)?;
        debug!(
            portfolio = portfolio.name(),
            months = premiums.height(),
            "computed risk premiums"
        );

        let fit = |model: FactorModel| {
            let result = regress(&premiums, &factors, model.factors());
            if let Err(err) = &result {
                warn!(
                    portfolio = portfolio.name(),
                    model = model.name(),
                    error = %err,
                    "regression failed"
                );
            }
            result
        };
        let capm = fit(FactorModel::Capm);
        let ff3 = fit(FactorModel::FamaFrench3);
        let ff5 = fit(FactorModel::FamaFrench5);

        Ok(Self {
            portfolio_name: portfolio.name().to_string(),
            factors,
            premiums,
            capm,
            ff3,
            ff5,
        })
    }

    /// Name of the portfolio this snapshot was taken from.
    pub fn portfolio_name(&self) -> &str {
        &self.portfolio_name
    }

    /// Factor table used.
    pub const fn factors(&self) -> &FactorTable {
        &self.factors
    }

    /// Returns minus RF, on months present in both the portfolio and the factor table.
    pub const fn risk_premiums(&self) -> &Frame {
        &self.premiums
    }

    /// Regress every entity's premium on an intercept plus `factor_names`.
    ///
    /// # Errors
    ///
    /// [`RegressionError::MissingFactor`] for an absent column,
    /// [`RegressionError::InsufficientData`] when fewer than `factors + 1`
    /// months remain and [`RegressionError::SingularMatrix`] for collinear factors.
    pub fn regress(
        &self,
        factor_names: &[&str],
    ) -> std::result::Result<RegressionTable, RegressionError> {
        regress(&self.premiums, &self.factors, factor_names)
    }

    /// Result of a fixed model.
    pub fn model(
        &self,
        model: FactorModel,
    ) -> std::result::Result<&RegressionTable, &RegressionError> {
        match model {
            FactorModel::Capm => self.capm.as_ref(),
            FactorModel::FamaFrench3 => self.ff3.as_ref(),
            FactorModel::FamaFrench5 => self.ff5.as_ref(),
        }
    }

    /// CAPM results.
    pub fn capm(&self) -> std::result::Result<&RegressionTable, &RegressionError> {
        self.model(FactorModel::Capm)
    }

    /// Fama-French 3-factor results.
    pub fn ff3(&self) -> std::result::Result<&RegressionTable, &RegressionError> {
        self.model(FactorModel::FamaFrench3)
    }

    /// Fama-French 5-factor results.
    pub fn ff5(&self) -> std::result::Result<&RegressionTable, &RegressionError> {
        self.model(FactorModel::FamaFrench5)
    }
}

fn risk_premiums(returns: &Frame, factors: &FactorTable) -> Result<Frame> {
    let rf = factors.frame().column(RISK_FREE_COLUMN).ok_or_else(|| {
        AnalyticsError::from(RegressionError::MissingFactor(RISK_FREE_COLUMN.into()))
    })?;
    let factor_dates = factors.frame().dates();

    let shared: Vec<NaiveDate> = returns
        .dates()
        .iter()
        .copied()
        .filter(|d| factor_dates.binary_search(d).is_ok())
        .collect();
    let returns = returns.retain_dates(&shared);

    let mut values = returns.values().clone();
    for (i, date) in shared.iter().enumerate() {
        let Ok(k) = factor_dates.binary_search(date) else {
            continue;
        };
        values.row_mut(i).mapv_inplace(|v| v - rf[k]);
    }

    Ok(Frame::new(shared, returns.columns().to_vec(), values))
}

fn regress(
    premiums: &Frame,
    factors: &FactorTable,
    factor_names: &[&str],
) -> std::result::Result<RegressionTable, RegressionError> {
    let selected = factors
        .frame()
        .select(factor_names)
        .map_err(RegressionError::MissingFactor)?;

    // Months with a complete factor row and a complete premium row. A missing
    // RF value leaves every premium of its month NaN.
    let usable: HashSet<NaiveDate> = selected
        .dates()
        .iter()
        .zip(selected.values().rows())
        .filter(|(_, row)| row.iter().all(|v| v.is_finite()))
        .map(|(d, _)| *d)
        .collect();
    let dates: Vec<NaiveDate> = premiums
        .dates()
        .iter()
        .zip(premiums.values().rows())
        .filter(|(d, row)| usable.contains(*d) && row.iter().all(|v| v.is_finite()))
        .map(|(d, _)| *d)
        .collect();

    let mut x = Array2::<f64>::zeros((dates.len(), factor_names.len()));
    for (i, date) in dates.iter().enumerate() {
        if let Some(row) = selected.row(*date) {
            x.row_mut(i).assign(&row);
        }
    }
    let design = regression::add_constant(x.view());
    let premiums = premiums.retain_dates(&dates);

    let mut rows = Vec::with_capacity(premiums.width());
    for entity in premiums.columns() {
        let y: Array1<f64> = premiums
            .column(entity)
            .map(|c| c.to_owned())
            .unwrap_or_default();
        let fit = regression::ols(y.view(), design.view())?;
        let loadings = factor_names
            .iter()
            .enumerate()
            .map(|(j, factor)| FactorLoading {
                factor: (*factor).to_string(),
                beta: fit.coefficients[j + 1],
                t_value: fit.t_values[j + 1],
            })
            .collect();
        rows.push(RegressionRow {
            entity: entity.clone(),
            alpha: fit.coefficients[0],
            alpha_t: fit.t_values[0],
            loadings,
            r_squared: fit.r_squared,
            observations: fit.observations,
        });
    }

    debug!(
        factors = factor_names.len(),
        observations = dates.len(),
        entities = rows.len(),
        "fitted factor regressions"
    );

    Ok(RegressionTable {
        factors: factor_names.iter().map(|f| (*f).to_string()).collect(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::security::Security;
    use crate::source::PricePoint;
    use approx::assert_relative_eq;

    fn month(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020 + (i / 12) as i32, (i % 12) as u32 + 1, 1).unwrap()
    }

    fn portfolio(n: usize) -> Portfolio {
        let a: Vec<PricePoint> = (0..n)
            .map(|i| {
                let step = 1.0 + 0.01 * ((i * 7 % 5) as f64 - 2.0);
                PricePoint::new(month(i), 100.0 * step.powi(i as i32))
            })
            .collect();
        let b: Vec<PricePoint> = (0..n)
            .map(|i| PricePoint::new(month(i), 50.0 + ((i * 3) % 7) as f64))
            .collect();
        let params = AnalysisConfig::default();
        Portfolio::new(
            "test",
            vec![
                Security::from_prices("AAPL", a, &params).unwrap(),
                Security::from_prices("IBM", b, &params).unwrap(),
            ],
            params,
        )
        .unwrap()
    }

    fn factors(range: std::ops::Range<usize>) -> FactorTable {
        let dates: Vec<NaiveDate> = range.clone().map(month).collect();
        let wave = |seed: usize| -> Vec<f64> {
            range
                .clone()
                .map(|i| ((i + 1) as f64 * (seed as f64 + 1.3)).sin() / 20.0)
                .collect()
        };
        let frame = Frame::from_columns(
            dates.clone(),
            vec![
                ("Mkt-RF".to_string(), wave(0)),
                ("SMB".to_string(), wave(1)),
                ("HML".to_string(), wave(2)),
                ("RMW".to_string(), wave(3)),
                ("CMA".to_string(), wave(4)),
                ("RF".to_string(), vec![0.001; dates.len()]),
            ],
        );
        FactorTable::new(frame).unwrap()
    }

    #[test]
    fn test_factor_table_requires_rf() {
        let frame = Frame::from_columns(vec![month(0)], vec![("Mkt-RF".to_string(), vec![0.01])]);
        let err = FactorTable::new(frame).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::Regression(RegressionError::MissingFactor(ref f)) if f == "RF"
        ));
    }

    #[test]
    fn test_factor_table_normalizes_dates() {
        let frame = Frame::from_columns(
            vec![
                NaiveDate::from_ymd_opt(2020, 2, 29).unwrap(),
                NaiveDate::from_ymd_opt(2020, 1, 31).unwrap(),
            ],
            vec![("RF".to_string(), vec![0.2, 0.1])],
        );
        let table = FactorTable::new(frame).unwrap().from_percent();
        assert_eq!(table.frame().dates(), [month(0), month(1)]);
        assert_relative_eq!(table.frame().get(month(1), "RF").unwrap(), 0.002);
        assert!(table.factor_names().is_empty());
    }

    #[test]
    fn test_risk_premiums_subtract_rf_on_shared_months() {
        let portfolio = portfolio(12);
        let comparisons = Comparisons::new(&portfolio, factors(2..20)).unwrap();
        let premiums = comparisons.risk_premiums();
        assert_eq!(premiums.height(), 10);
        assert_eq!(premiums.columns(), ["AAPL", "IBM", "Portfolio"]);
        let d = month(5);
        assert_relative_eq!(
            premiums.get(d, "IBM").unwrap(),
            portfolio.returns().get(d, "IBM").unwrap() - 0.001,
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_capm_matches_closed_form() {
        let portfolio = portfolio(24);
        let comparisons = Comparisons::new(&portfolio, factors(0..24)).unwrap();
        let capm = comparisons.capm().unwrap();
        assert_eq!(capm.entities(), ["AAPL", "IBM", "Portfolio"]);

        let premiums = comparisons.risk_premiums();
        let y = premiums.column_vec("Portfolio").unwrap();
        let x: Vec<f64> = premiums
            .dates()
            .iter()
            .map(|d| comparisons.factors().frame().get(*d, "Mkt-RF").unwrap())
            .collect();
        let n = x.len() as f64;
        let mx = x.iter().sum::<f64>() / n;
        let my = y.iter().sum::<f64>() / n;
        let sxy: f64 = x.iter().zip(&y).map(|(a, b)| (a - mx) * (b - my)).sum();
        let sxx: f64 = x.iter().map(|a| (a - mx).powi(2)).sum();
        let beta = sxy / sxx;

        let row = capm.get("Portfolio").unwrap();
        assert_relative_eq!(row.alpha, my - beta * mx, epsilon = 1e-9);
        assert_relative_eq!(row.loading("Mkt-RF").unwrap().beta, beta, epsilon = 1e-9);
        assert_eq!(row.observations, 24);
    }

    #[test]
    fn test_missing_rf_month_is_dropped() {
        let base = factors(0..24);
        let frame = base.frame();
        let rf = frame.columns().iter().position(|c| c == "RF").unwrap();
        let mut values = frame.values().clone();
        values[[10, rf]] = f64::NAN;
        let factors =
            FactorTable::new(Frame::new(frame.dates().to_vec(), frame.columns().to_vec(), values))
                .unwrap();

        let comparisons = Comparisons::new(&portfolio(24), factors).unwrap();
        for model in [FactorModel::Capm, FactorModel::FamaFrench3, FactorModel::FamaFrench5] {
            let table = comparisons.model(model).unwrap();
            assert_eq!(table.observations(), 23);
            for row in table.rows() {
                assert!(row.alpha.is_finite());
                assert!(row.loadings.iter().all(|l| l.beta.is_finite()));
            }
        }
    }

    #[test]
    fn test_column_layout() {
        let comparisons = Comparisons::new(&portfolio(24), factors(0..24)).unwrap();
        let ff3 = comparisons.ff3().unwrap();
        assert_eq!(
            ff3.columns(),
            [
                "Alpha",
                "Alpha T-Score",
                "Mkt-RF_Beta",
                "Mkt-RF_T_Value",
                "SMB_Beta",
                "SMB_T_Value",
                "HML_Beta",
                "HML_T_Value"
            ]
        );
        let row = ff3.get("AAPL").unwrap();
        assert_eq!(row.values().len(), ff3.columns().len());
        assert_eq!(row.values()[2], row.loadings[0].beta);
    }

    #[test]
    fn test_failed_model_does_not_abort_others() {
        // Five months: CAPM needs 2, FF3 needs 4, FF5 needs 6.
        let comparisons = Comparisons::new(&portfolio(5), factors(0..5)).unwrap();
        assert!(comparisons.capm().is_ok());
        assert!(comparisons.ff3().is_ok());
        assert_eq!(
            comparisons.ff5().unwrap_err(),
            &RegressionError::InsufficientData {
                required: 6,
                actual: 5
            }
        );
    }

    #[test]
    fn test_regress_missing_factor() {
        let comparisons = Comparisons::new(&portfolio(12), factors(0..12)).unwrap();
        assert_eq!(
            comparisons.regress(&["Mkt-RF", "UMD"]).unwrap_err(),
            RegressionError::MissingFactor("UMD".to_string())
        );
    }

    #[test]
    fn test_collinear_factors_are_singular() {
        let comparisons = Comparisons::new(&portfolio(12), factors(0..12)).unwrap();
        assert_eq!(
            comparisons.regress(&["Mkt-RF", "Mkt-RF"]).unwrap_err(),
            RegressionError::SingularMatrix
        );
    }

    #[test]
    fn test_snapshot_ignores_later_weight_changes() {
        let mut portfolio = portfolio(12);
        let comparisons = Comparisons::new(&portfolio, factors(0..12)).unwrap();
        let before = comparisons.risk_premiums().clone();
        portfolio
            .update_weights(&std::collections::HashMap::from([("AAPL".to_string(), 2.0)]))
            .unwrap();
        assert_eq!(comparisons.risk_premiums(), &before);
    }

    #[test]
    fn test_model_names() {
        assert_eq!(FactorModel::Capm.name(), "capm");
        assert_eq!(FactorModel::FamaFrench5.factors().len(), 5);
        assert_eq!(FactorModel::FamaFrench3.to_string(), "Fama-French 3-Factor");
    }
}
