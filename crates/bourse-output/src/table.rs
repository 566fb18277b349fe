//! Labelled numeric tables and their text rendering.

use bourse_analytics::{Frame, RegressionTable, Statistic, StatisticsTable, Weights};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Width of a numeric column in ASCII output.
const VALUE_WIDTH: usize = 12;

/// One labelled row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    /// Row label (a date, a statistic or an entity).
    pub label: String,

    /// One value per column. Non-finite values are kept.
    pub values: Vec<f64>,
}

/// A named table with a label column and numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Table name, used as the section or file name on export.
    pub name: String,

    /// Header of the label column.
    pub index_label: String,

    /// Numeric column headers.
    pub columns: Vec<String>,

    /// Rows in display order.
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Create an empty table.
    pub fn new(
        name: impl Into<String>,
        index_label: impl Into<String>,
        columns: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            index_label: index_label.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row.
    pub fn push_row(&mut self, label: impl Into<String>, values: Vec<f64>) {
        self.rows.push(TableRow {
            label: label.into(),
            values,
        });
    }

    /// A date-indexed frame: one row per month.
    pub fn from_frame(name: impl Into<String>, frame: &Frame) -> Self {
        let mut table = Self::new(name, "date", frame.columns().to_vec());
        for (date, row) in frame.dates().iter().zip(frame.values().rows()) {
            table.push_row(date.format("%Y-%m-%d").to_string(), row.to_vec());
        }
        table
    }

    /// The statistics table: one row per statistic, one column per entity.
    pub fn from_statistics(name: impl Into<String>, stats: &StatisticsTable) -> Self {
        let mut table = Self::new(name, "statistic", stats.entities().to_vec());
        for statistic in Statistic::ALL {
            table.push_row(statistic.label(), stats.row(statistic).to_vec());
        }
        table
    }

    /// Weights: one row per security.
    pub fn from_weights(name: impl Into<String>, weights: &Weights) -> Self {
        let mut table = Self::new(name, "security", vec!["weight".to_string()]);
        for (security, weight) in weights.iter() {
            table.push_row(security, vec![weight]);
        }
        table
    }

    /// A regression table: one row per entity.
    pub fn from_regression(name: impl Into<String>, regression: &RegressionTable) -> Self {
        let mut table = Self::new(name, "entity", regression.columns());
        for row in regression.rows() {
            table.push_row(row.entity.clone(), row.values());
        }
        table
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Value at a row label and column.
    pub fn get(&self, label: &str, column: &str) -> Option<f64> {
        let j = self.columns.iter().position(|c| c == column)?;
        self.rows
            .iter()
            .find(|r| r.label == label)
            .and_then(|r| r.values.get(j).copied())
    }

    /// Format as an ASCII table.
    pub fn to_ascii_table(&self) -> String {
        let label_width = self
            .rows
            .iter()
            .map(|r| r.label.len())
            .chain([self.index_label.len(), 12])
            .max()
            .unwrap_or(12);
        let value_width = self
            .columns
            .iter()
            .map(String::len)
            .chain([VALUE_WIDTH])
            .max()
            .unwrap_or(VALUE_WIDTH);
        let rule = label_width + (value_width + 1) * self.columns.len();

        let mut output = String::new();
        let _ = writeln!(output, "\n{}", self.name);
        output.push_str(&"=".repeat(rule));
        output.push('\n');

        let _ = write!(output, "{:<label_width$}", self.index_label);
        for column in &self.columns {
            let _ = write!(output, " {column:>value_width$}");
        }
        output.push('\n');
        output.push_str(&"-".repeat(rule));
        output.push('\n');

        for row in &self.rows {
            let _ = write!(output, "{:<label_width$}", row.label);
            for value in &row.values {
                let _ = write!(output, " {value:>value_width$.4}");
            }
            output.push('\n');
        }

        output.push_str(&"=".repeat(rule));
        output.push('\n');
        output
    }

    /// Format as a Markdown table.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "## {}\n", self.name);

        let _ = write!(output, "| {} |", self.index_label);
        for column in &self.columns {
            let _ = write!(output, " {column} |");
        }
        output.push('\n');
        output.push('|');
        for _ in 0..=self.columns.len() {
            output.push_str("---|");
        }
        output.push('\n');

        for row in &self.rows {
            let _ = write!(output, "| {} |", row.label);
            for value in &row.values {
                let _ = write!(output, " {value:.4} |");
            }
            output.push('\n');
        }
        output
    }
}
