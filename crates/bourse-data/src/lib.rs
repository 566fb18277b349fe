#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/bourse/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod alphavantage;
pub mod error;
pub mod french;
pub mod yahoo;

pub use alphavantage::AlphaVantageFileSource;
pub use error::{DataError, Result};
pub use french::{FactorCsvOptions, load_factor_csv, parse_factor_csv};
pub use yahoo::YahooQuoteProvider;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
