//! Export functionality for Bourse tables.
//!
//! Tables can be written as CSV, compact JSON or pretty JSON. A
//! [`PortfolioExport`] bundles every table of an analysis; as CSV it becomes one
//! document with a `# table: <name>` marker before each section, and
//! [`PortfolioExport::export_to_dir`] writes one file per table instead.

use crate::table::Table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn table_csv(table: &Table) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let header = std::iter::once(table.index_label.as_str())
        .chain(table.columns.iter().map(String::as_str));
    wtr.write_record(header)?;
    for row in &table.rows {
        let record = std::iter::once(row.label.clone())
            .chain(row.values.iter().map(f64::to_string));
        wtr.write_record(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

impl Exporter for Table {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => table_csv(self),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

/// A table that could not be produced, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTable {
    /// Name the table would have had.
    pub name: String,

    /// Why it is missing.
    pub reason: String,
}

/// Every table of one portfolio analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioExport {
    /// Portfolio name.
    pub name: String,

    /// When the export was assembled.
    pub generated_at: DateTime<Utc>,

    /// Tables in export order.
    pub tables: Vec<Table>,

    /// Tables that were requested but could not be produced.
    pub skipped: Vec<SkippedTable>,
}

impl PortfolioExport {
    /// Create an empty export.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generated_at: Utc::now(),
            tables: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// A table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Table names in export order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// All tables as ASCII, one after another.
    pub fn to_ascii(&self) -> String {
        let mut output = format!("\nPortfolio: {}\n", self.name);
        for table in &self.tables {
            output.push_str(&table.to_ascii_table());
        }
        for skipped in &self.skipped {
            output.push_str(&format!("\n{}: skipped ({})\n", skipped.name, skipped.reason));
        }
        output
    }

    /// Write one file per table into `dir`, named `<table>.<extension>`.
    ///
    /// The directory is created if needed. Returns the written paths.
    ///
    /// # Errors
    ///
    /// Returns an error if a table cannot be serialized or written.
    pub fn export_to_dir(
        &self,
        dir: &Path,
        format: ExportFormat,
    ) -> Result<Vec<PathBuf>, ExportError> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.tables.len());
        for table in &self.tables {
            let path = dir.join(format!("{}.{}", table.name, format.extension()));
            table.export_to_file(&path, format)?;
            written.push(path);
        }
        debug!(dir = %dir.display(), files = written.len(), "exported tables");
        Ok(written)
    }
}

impl Exporter for PortfolioExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut output = String::new();

                // Write header information as comments
                output.push_str(&format!("# Portfolio: {}\n", self.name));
                output.push_str(&format!("# Generated: {}\n", self.generated_at.to_rfc3339()));
                for skipped in &self.skipped {
                    output.push_str(&format!("# Skipped: {} ({})\n", skipped.name, skipped.reason));
                }

                for table in &self.tables {
                    output.push_str(&format!("# table: {}\n", table.name));
                    output.push_str(&table_csv(table)?);
                }
                Ok(output)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}
