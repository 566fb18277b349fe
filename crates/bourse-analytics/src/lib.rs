#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/bourse/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod comparisons;
pub mod config;
pub mod covariance;
pub mod error;
pub mod frame;
pub mod portfolio;
pub mod regression;
pub mod security;
pub mod series;
pub mod source;
pub mod statistics;

pub use comparisons::{
    Comparisons, FactorLoading, FactorModel, FactorTable, RISK_FREE_COLUMN, RegressionRow,
    RegressionTable,
};
pub use config::AnalysisConfig;
pub use covariance::{CovarianceMatrix, WeightedRisk};
pub use error::{AnalyticsError, Result};
pub use frame::{DATE_COLUMN, Frame};
pub use portfolio::{PORTFOLIO_COLUMN, Portfolio, Weights};
pub use regression::{OlsFit, RegressionError};
pub use security::Security;
pub use source::{InMemoryPriceSource, PricePoint, PriceSource};
pub use statistics::{Statistic, Statistics, StatisticsTable};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
