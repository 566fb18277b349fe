//! CLI configuration.
//!
//! Read from a TOML file given with `--config`, or from
//! `<config dir>/bourse/config.toml` when that file exists. Every field has a
//! default and command-line flags override what the file sets.

use crate::integration::data_pipeline::DEFAULT_CONCURRENCY;
use bourse_analytics::AnalysisConfig;
use bourse_output::ExportFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors reading or writing the configuration file.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    /// File could not be read or written.
    #[error("Config IO error for {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// File is not valid TOML for [`BourseConfig`].
    #[error("Invalid config {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Serialization failed.
    #[error("Could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// No platform config directory.
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct BourseConfig {
    /// Risk-free rate and risk aversion for Y*
    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub factors: FactorConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

/// Where prices come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct DataConfig {
    /// Years of monthly history to request from Yahoo (default: 5)
    #[serde(default = "default_years")]
    pub years: u32,

    /// Delay after each Yahoo request in milliseconds (default: 1000)
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,

    /// Concurrent Yahoo requests (default: 10)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Directory of Alpha Vantage monthly JSON files; replaces Yahoo when set
    pub prices_dir: Option<PathBuf>,
}

const fn default_years() -> u32 {
    5
}

const fn default_rate_limit_ms() -> u64 {
    1000
}

const fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            years: default_years(),
            rate_limit_ms: default_rate_limit_ms(),
            concurrency: default_concurrency(),
            prices_dir: None,
        }
    }
}

/// Factor data for the regressions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct FactorConfig {
    /// Fama-French CSV file
    pub path: Option<PathBuf>,

    /// The file is in percent units
    #[serde(default)]
    pub percent: bool,
}

/// Table export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ExportConfig {
    #[serde(default = "default_format")]
    pub format: ExportFormat,

    /// Directory to write one file per table into
    pub dir: Option<PathBuf>,
}

const fn default_format() -> ExportFormat {
    ExportFormat::Csv
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            dir: None,
        }
    }
}

impl BourseConfig {
    /// Load configuration from a TOML file.
    pub(crate) fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `explicit` if given, else the default file if it exists, else defaults.
    pub(crate) fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Render as TOML.
    pub(crate) fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write to `path`, creating parent directories.
    pub(crate) fn write(&self, path: &Path) -> Result<(), ConfigError> {
        let io = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io)?;
        }
        fs::write(path, self.to_toml()?).map_err(io)
    }
}

/// `<config dir>/bourse/config.toml`.
pub(crate) fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("bourse").join("config.toml"))
}

/// The default path, or an error when the platform has none.
pub(crate) fn require_default_path() -> Result<PathBuf, ConfigError> {
    default_path().ok_or(ConfigError::NoConfigDir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BourseConfig::default();
        assert_eq!(config.analysis, AnalysisConfig::default());
        assert_eq!(config.data.years, 5);
        assert_eq!(config.data.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.export.format, ExportFormat::Csv);
        assert!(config.factors.path.is_none());
    }

    #[test]
    fn test_partial_file() {
        let config: BourseConfig = toml::from_str(
            r#"
            [analysis]
            risk_aversion = 3.0

            [factors]
            path = "ff5.csv"
            percent = true

            [export]
            format = "pretty-json"
            "#,
        )
        .unwrap();
        assert_eq!(config.analysis.risk_aversion, 3.0);
        assert_eq!(config.analysis.risk_free_rate, 0.02);
        assert_eq!(config.factors.path, Some(PathBuf::from("ff5.csv")));
        assert!(config.factors.percent);
        assert_eq!(config.export.format, ExportFormat::PrettyJson);
        assert_eq!(config.data, DataConfig::default());
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = BourseConfig::default();
        config.data.prices_dir = Some(PathBuf::from("/data/av"));
        config.write(&path).unwrap();

        assert_eq!(BourseConfig::load(Some(path.as_path())).unwrap(), config);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[data]\nyears = \"five\"\n").unwrap();
        assert!(matches!(
            BourseConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            BourseConfig::from_file(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
