//! Risk parameters shared by the statistics pipeline.

use serde::{Deserialize, Serialize};

/// Inputs to the utility statistic Y*.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Annual risk-free rate used by Y* (default: 0.02)
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,

    /// Risk-aversion coefficient A used by Y* (default: 1.0)
    #[serde(default = "default_risk_aversion")]
    pub risk_aversion: f64,
}

const fn default_risk_free_rate() -> f64 {
    0.02
}

const fn default_risk_aversion() -> f64 {
    1.0
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: default_risk_free_rate(),
            risk_aversion: default_risk_aversion(),
        }
    }
}

impl AnalysisConfig {
    /// Create a configuration from explicit values.
    pub const fn new(risk_free_rate: f64, risk_aversion: f64) -> Self {
        Self {
            risk_free_rate,
            risk_aversion,
        }
    }

    /// Replace the risk-aversion coefficient.
    pub const fn with_risk_aversion(mut self, risk_aversion: f64) -> Self {
        self.risk_aversion = risk_aversion;
        self
    }

    /// Replace the risk-free rate.
    pub const fn with_risk_free_rate(mut self, risk_free_rate: f64) -> Self {
        self.risk_free_rate = risk_free_rate;
        self
    }
}
