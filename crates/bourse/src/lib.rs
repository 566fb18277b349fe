#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/bourse/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod factory;

// Re-export main types from sub-crates
pub use bourse_analytics as analytics;
pub use bourse_data as data;
pub use bourse_output as output;

// Re-export the types most callers touch
pub use bourse_analytics::{
    AnalysisConfig, AnalyticsError, Comparisons, FactorModel, FactorTable, Frame, Portfolio,
    PriceSource, Result, Security, Statistic,
};
pub use factory::{build_comparisons, build_portfolio};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
