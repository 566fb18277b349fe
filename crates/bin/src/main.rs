//! Bourse CLI binary.
//!
//! Builds a weighted portfolio from monthly prices, prints its statistics and
//! CAPM / Fama-French regressions, and exports the tables.

mod config;
mod integration;

use bourse::output::{ExportFormat, Exporter, PortfolioExport, ReportBuilder};
use bourse::{AnalysisConfig, PriceSource, build_comparisons, build_portfolio};
use bourse_data::{AlphaVantageFileSource, FactorCsvOptions, YahooQuoteProvider, load_factor_csv};
use chrono::{Duration, Utc};
use clap::{Args, Parser, Subcommand};
use config::BourseConfig;
use indicatif::{ProgressBar, ProgressStyle};
use integration::data_pipeline::fetch_prices_with_progress;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration as StdDuration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bourse")]
#[command(about = "Bourse: portfolio statistics and factor regressions", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (default: <config dir>/bourse/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a weighted portfolio
    Analyze(AnalyzeArgs),

    /// Write a default configuration file
    InitConfig {
        /// Where to write (default: <config dir>/bourse/config.toml)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    ShowConfig,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Ticker symbols
    #[arg(required = true)]
    tickers: Vec<String>,

    /// Portfolio name
    #[arg(long, default_value = "portfolio")]
    name: String,

    /// Weight overrides as TICKER=VALUE (repeat or separate with commas)
    #[arg(short, long = "weight", value_parser = parse_weight, value_delimiter = ',')]
    weights: Vec<(String, f64)>,

    /// Fama-French factor CSV
    #[arg(long)]
    factors: Option<PathBuf>,

    /// Factor file is in percent units
    #[arg(long)]
    percent: bool,

    /// Read Alpha Vantage monthly JSON files from this directory instead of Yahoo
    #[arg(long)]
    prices_dir: Option<PathBuf>,

    /// Years of history to fetch from Yahoo
    #[arg(long)]
    years: Option<u32>,

    /// Annual risk-free rate for Y*
    #[arg(long)]
    risk_free: Option<f64>,

    /// Risk-aversion coefficient for Y*
    #[arg(long)]
    risk_aversion: Option<f64>,

    /// Write one file per table into this directory
    #[arg(long)]
    export: Option<PathBuf>,

    /// Write every table into a single file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Export format (csv, json or pretty-json)
    #[arg(long, value_parser = parse_format)]
    format: Option<ExportFormat>,

    /// Print tables as Markdown instead of ASCII
    #[arg(long)]
    markdown: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze(args) => {
            let config = BourseConfig::load(cli.config.as_deref())?;
            analyze(args, &config).await?;
        }
        Commands::InitConfig { path, force } => {
            let path = match path {
                Some(path) => path,
                None => config::require_default_path()?,
            };
            if path.exists() && !force {
                return Err(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )
                .into());
            }
            BourseConfig::default().write(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
        Commands::ShowConfig => {
            let config = BourseConfig::load(cli.config.as_deref())?;
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info,bourse=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn analyze(
    args: AnalyzeArgs,
    config: &BourseConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let tickers: Vec<String> = args
        .tickers
        .iter()
        .map(|t| t.trim().to_uppercase())
        .collect();
    let weights: HashMap<String, f64> = args.weights.iter().cloned().collect();
    let params = analysis_params(config.analysis, args.risk_free, args.risk_aversion);

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║{:^62}║", format!("PORTFOLIO ANALYSIS: {}", args.name));
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("Securities: {}", tickers.join(", "));
    println!(
        "Risk-free rate: {:.4}  Risk aversion: {:.2}",
        params.risk_free_rate, params.risk_aversion
    );

    let prices_dir = args.prices_dir.as_ref().or(config.data.prices_dir.as_ref());
    let source: Box<dyn PriceSource> = match prices_dir {
        Some(dir) => {
            println!("Prices: Alpha Vantage files in {}", dir.display());
            Box::new(AlphaVantageFileSource::from_dir(dir)?)
        }
        None => {
            let years = args.years.unwrap_or(config.data.years);
            println!("Prices: Yahoo Finance, {} year(s) of monthly closes", years);
            fetch_yahoo(&tickers, years, config).await?
        }
    };
    println!();

    let portfolio =
        build_portfolio(&args.name, tickers.as_slice(), &weights, source.as_ref(), params)?;

    let factors_path = args.factors.as_ref().or(config.factors.path.as_ref());
    let comparisons = match factors_path {
        Some(path) => {
            let options = FactorCsvOptions {
                percent: args.percent || config.factors.percent,
            };
            let factors = load_factor_csv(path, options)?;
            debug!(path = %path.display(), months = factors.frame().height(), "loaded factors");
            Some(build_comparisons(&portfolio, factors)?)
        }
        None => None,
    };

    let mut builder = ReportBuilder::new().portfolio(&portfolio);
    if let Some(comparisons) = &comparisons {
        builder = builder.comparisons(comparisons);
    }
    let export = builder.build()?;

    if args.markdown {
        print_markdown(&export);
    } else {
        print!("{}", export.to_ascii());
    }

    let risk = portfolio.weighted_risk();
    println!(
        "\nWeighted risk (annualized): variance {:.6}  volatility {:.6}",
        risk.variance, risk.stdev
    );

    let format = args.format.unwrap_or(config.export.format);
    if let Some(dir) = export_dir(&args, config) {
        let written = export.export_to_dir(dir, format)?;
        println!("Exported {} tables to {}", written.len(), dir.display());
    }
    if let Some(path) = &args.output {
        export.export_to_file(path, format)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

async fn fetch_yahoo(
    tickers: &[String],
    years: u32,
    config: &BourseConfig,
) -> Result<Box<dyn PriceSource>, Box<dyn std::error::Error>> {
    let provider =
        YahooQuoteProvider::with_rate_limit(StdDuration::from_millis(config.data.rate_limit_ms))?;
    let end = Utc::now();
    let start = end - Duration::days(i64::from(years) * 365);

    let pb = ProgressBar::new(tickers.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(StdDuration::from_millis(100));

    match fetch_prices_with_progress(
        &provider,
        tickers,
        start,
        end,
        config.data.concurrency,
        Some(&pb),
    )
    .await
    {
        Ok(source) => {
            pb.finish_with_message(format!(
                "Fetched {} of {} symbols",
                source.len(),
                tickers.len()
            ));
            Ok(Box::new(source))
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            Err(format!("Failed to fetch prices: {}", e).into())
        }
    }
}

fn print_markdown(export: &PortfolioExport) {
    println!("# Portfolio: {}\n", export.name);
    for table in &export.tables {
        println!("{}", table.to_markdown());
    }
    for skipped in &export.skipped {
        println!("_{} skipped: {}_\n", skipped.name, skipped.reason);
    }
}

/// Command-line values override the configured ones.
fn analysis_params(
    base: AnalysisConfig,
    risk_free: Option<f64>,
    risk_aversion: Option<f64>,
) -> AnalysisConfig {
    let params = risk_free.map_or(base, |rf| base.with_risk_free_rate(rf));
    risk_aversion.map_or(params, |a| params.with_risk_aversion(a))
}

fn parse_weight(s: &str) -> Result<(String, f64), String> {
    let (ticker, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TICKER=VALUE, got '{}'", s))?;
    let ticker = ticker.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(format!("missing ticker in '{}'", s));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid weight for {}: {}", ticker, e))?;
    if !value.is_finite() {
        return Err(format!("weight for {} must be finite", ticker));
    }
    Ok((ticker, value))
}

fn parse_format(s: &str) -> Result<ExportFormat, String> {
    s.parse().map_err(|e: bourse::output::ExportError| e.to_string())
}

fn export_dir<'a>(args: &'a AnalyzeArgs, config: &'a BourseConfig) -> Option<&'a Path> {
    args.export.as_deref().or(config.export.dir.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    fn analyze_args(argv: &[&str]) -> AnalyzeArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Analyze(args) => args,
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case("AAPL=0.7", "AAPL", 0.7)]
    #[case("ibm = 0.3", "IBM", 0.3)]
    #[case("MSFT=-0.25", "MSFT", -0.25)]
    fn test_parse_weight(#[case] input: &str, #[case] ticker: &str, #[case] value: f64) {
        assert_eq!(parse_weight(input).unwrap(), (ticker.to_string(), value));
    }

    #[rstest]
    #[case("AAPL")]
    #[case("=0.5")]
    #[case("AAPL=abc")]
    #[case("AAPL=NaN")]
    fn test_parse_weight_rejects(#[case] input: &str) {
        assert!(parse_weight(input).is_err());
    }

    #[test]
    fn test_analyze_args() {
        let args = analyze_args(&[
            "bourse",
            "analyze",
            "aapl",
            "ibm",
            "--weight",
            "AAPL=0.7,IBM=0.3",
            "--factors",
            "ff3.csv",
            "--percent",
            "--format",
            "json",
        ]);
        assert_eq!(args.tickers, ["aapl", "ibm"]);
        assert_eq!(
            args.weights,
            [("AAPL".to_string(), 0.7), ("IBM".to_string(), 0.3)]
        );
        assert_eq!(args.factors, Some(PathBuf::from("ff3.csv")));
        assert!(args.percent);
        assert_eq!(args.format, Some(ExportFormat::Json));
        assert_eq!(args.name, "portfolio");
    }

    #[test]
    fn test_analyze_requires_tickers() {
        assert!(Cli::try_parse_from(["bourse", "analyze"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let base = AnalysisConfig::new(0.02, 1.0);
        assert_eq!(analysis_params(base, None, None), base);
        assert_eq!(
            analysis_params(base, Some(0.05), None),
            AnalysisConfig::new(0.05, 1.0)
        );
        assert_eq!(
            analysis_params(base, None, Some(4.0)),
            AnalysisConfig::new(0.02, 4.0)
        );
    }

    #[test]
    fn test_export_dir_falls_back_to_config() {
        let mut config = BourseConfig::default();
        config.export.dir = Some(PathBuf::from("out"));

        let args = analyze_args(&["bourse", "analyze", "AAPL"]);
        assert_eq!(export_dir(&args, &config), Some(Path::new("out")));

        let args = analyze_args(&["bourse", "analyze", "AAPL", "--export", "reports"]);
        assert_eq!(export_dir(&args, &config), Some(Path::new("reports")));
    }
}
