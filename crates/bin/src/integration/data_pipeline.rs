//! Data pipeline for fetching monthly price histories.
//!
//! Fetches every ticker from Yahoo Finance with bounded concurrency and
//! collects the results into an [`InMemoryPriceSource`] that the analytics
//! core reads synchronously. Tickers that fail are reported and left out.

use bourse_analytics::{InMemoryPriceSource, PricePoint};
use bourse_data::{DataError, YahooQuoteProvider};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use tracing::{debug, warn};

/// Default number of concurrent fetches.
pub(crate) const DEFAULT_CONCURRENCY: usize = 10;

/// Error type for data pipeline operations.
#[derive(Debug, thiserror::Error)]
pub(crate) enum DataPipelineError {
    /// Every ticker failed.
    #[error("No price data fetched for any of: {0}")]
    NoData(String),
}

/// Outcome of fetching one ticker.
pub(crate) type FetchResult = (String, Result<Vec<PricePoint>, DataError>);

/// Fetch monthly closes for `symbols` with optional progress reporting.
pub(crate) async fn fetch_prices_with_progress(
    provider: &YahooQuoteProvider,
    symbols: &[String],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    concurrency: usize,
    progress: Option<&ProgressBar>,
) -> Result<InMemoryPriceSource, DataPipelineError> {
    let concurrency = concurrency.max(1);
    if let Some(pb) = progress {
        pb.set_length(symbols.len() as u64);
        pb.set_message(format!(
            "Fetching {} symbols ({} concurrent)...",
            symbols.len(),
            concurrency
        ));
    }

    let results: Vec<FetchResult> = stream::iter(symbols.iter().cloned())
        .map(|symbol| async move {
            let result = provider.fetch_monthly_closes(&symbol, start, end).await;
            (symbol, result)
        })
        .buffer_unordered(concurrency)
        .inspect(|_| {
            if let Some(pb) = progress {
                pb.inc(1);
            }
        })
        .collect()
        .await;

    collect_source(results, progress)
}

/// Gather fetch outcomes into a price source.
///
/// Failures are logged; inside a progress bar they are printed above it.
pub(crate) fn collect_source(
    results: Vec<FetchResult>,
    progress: Option<&ProgressBar>,
) -> Result<InMemoryPriceSource, DataPipelineError> {
    let mut source = InMemoryPriceSource::new();
    let mut failed = Vec::new();

    for (symbol, result) in results {
        match result {
            Ok(points) => {
                debug!(symbol = %symbol, months = points.len(), "collected price history");
                source.insert(symbol, points);
            }
            Err(e) => {
                match progress {
                    Some(pb) => pb.suspend(|| warn!(symbol = %symbol, error = %e, "fetch failed")),
                    None => warn!(symbol = %symbol, error = %e, "fetch failed"),
                }
                failed.push(symbol);
            }
        }
    }

    if source.is_empty() {
        failed.sort();
        return Err(DataPipelineError::NoData(failed.join(", ")));
    }
    Ok(source)
}
