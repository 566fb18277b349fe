//! Integration tests for report assembly and bulk export.

use bourse_analytics::{
    AnalysisConfig, Comparisons, FactorTable, Frame, Portfolio, PricePoint, Security,
};
use bourse_output::{ExportFormat, Exporter, ReportBuilder};
use chrono::NaiveDate;
use std::collections::HashMap;

fn month(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020 + (i / 12) as i32, (i % 12) as u32 + 1, 1).unwrap()
}

fn portfolio() -> Portfolio {
    let params = AnalysisConfig::default();
    let series = |base: f64, drift: f64| -> Vec<PricePoint> {
        (0..24)
            .map(|i| {
                let x = i as f64;
                PricePoint::new(month(i), base * (1.0 + drift * x) + (x * 1.7).sin() * 3.0)
            })
            .collect()
    };
    Portfolio::new(
        "growth",
        vec![
            Security::from_prices("AAPL", series(120.0, 0.02), &params).unwrap(),
            Security::from_prices("MSFT", series(210.0, 0.015), &params).unwrap(),
            Security::from_prices("IBM", series(130.0, -0.002), &params).unwrap(),
        ],
        params,
    )
    .unwrap()
}

fn factors() -> FactorTable {
    let col = |k: f64| -> Vec<f64> {
        (0..24)
            .map(|i| ((i + 1) as f64 * (k + 1.3)).sin() / 20.0)
            .collect()
    };
    FactorTable::new(Frame::from_columns(
        (0..24).map(month).collect(),
        vec![
            ("Mkt-RF".to_string(), col(0.0)),
            ("SMB".to_string(), col(1.0)),
            ("HML".to_string(), col(2.0)),
            ("RMW".to_string(), col(3.0)),
            ("CMA".to_string(), col(4.0)),
            ("RF".to_string(), vec![0.002; 24]),
        ],
    ))
    .unwrap()
}

#[test]
fn test_full_export_workflow() {
    let mut portfolio = portfolio();
    portfolio
        .update_weights(&HashMap::from([("IBM".to_string(), 0.1)]))
        .unwrap();
    let comparisons = Comparisons::new(&portfolio, factors()).unwrap();

    let export = ReportBuilder::new()
        .portfolio(&portfolio)
        .comparisons(&comparisons)
        .build()
        .unwrap();

    assert_eq!(
        export.table_names(),
        ["weights", "prices", "returns", "wealth", "stats", "capm", "ff3", "ff5"]
    );
    assert_eq!(export.table("weights").unwrap().get("IBM", "weight"), Some(0.1));
    let ff5 = export.table("ff5").unwrap();
    assert_eq!(ff5.columns.len(), 12);
    assert_eq!(ff5.rows.last().unwrap().label, "Portfolio");

    let csv = export.export_to_string(ExportFormat::Csv).unwrap();
    assert_eq!(csv.matches("# table: ").count(), 8);
    assert!(csv.contains("# table: stats\nstatistic,Portfolio,AAPL,MSFT,IBM\n"));

    let json = export.export_to_string(ExportFormat::PrettyJson).unwrap();
    assert!(json.contains("\"Alpha T-Score\""));

    let ascii = export.to_ascii();
    assert!(ascii.contains("Portfolio: growth"));
    assert!(ascii.contains("Mkt-RF_Beta"));
}

#[test]
fn test_directory_export_one_file_per_table() {
    let portfolio = portfolio();
    let comparisons = Comparisons::new(&portfolio, factors()).unwrap();
    let export = ReportBuilder::new()
        .portfolio(&portfolio)
        .comparisons(&comparisons)
        .build()
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let written = export
        .export_to_dir(dir.path(), ExportFormat::Json)
        .unwrap();
    assert_eq!(written.len(), 8);
    for name in ["weights", "prices", "capm", "ff5"] {
        assert!(dir.path().join(format!("{name}.json")).exists());
    }
}
