//! # Fato ou Fake
//!
//! Builds a labeled dataset of the G1 "Fato ou Fake" fact-checking section.
//! Two independent producers collect the same stories, the records are
//! normalized, labeled FATO / FAKE / INDETERMINADO from their headline and
//! summary, merged by canonical link and saved as CSV and/or JSON.
//!
//! ## Usage
//!
//! ```sh
//! fato_ou_fake -m both -p 5 -f both -o ./datasets
//! ```
//!
//! ## Architecture
//!
//! 1. **Collection**: the listing scraper and the API/RSS reader run
//!    concurrently; a failed producer contributes no records
//! 2. **Pipeline**: normalize + classify, deduplicate, assemble
//! 3. **Output**: dataset files stamped with the local run time, plus an
//!    audit of conflicting labels when there was any

use chrono::{Local, Utc};
use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod assembler;
mod classifier;
mod cli;
mod config;
mod dedup;
mod fetch;
mod models;
mod normalizer;
mod outputs;
mod pipeline;
mod scrapers;
mod utils;

use cli::Cli;
use config::Config;
use fetch::{HttpFetch, RetryFetch};
use models::{Method, RawRecord};
use outputs::{csv, json};
use pipeline::{MethodBatch, RunContext};
use scrapers::ProducerError;
use utils::{ensure_writable_dir, file_stamp};

/// Base delay of the fetch retry backoff.
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Turn a producer outcome into its batch; a failed producer yields none.
fn into_batch(
    method: Method,
    outcome: Option<Result<Vec<RawRecord>, ProducerError>>,
) -> Option<MethodBatch> {
    match outcome? {
        Ok(records) => {
            info!(%method, count = records.len(), "Producer finished");
            Some(MethodBatch::new(method, records))
        }
        Err(e) => {
            error!(%method, error = %e, "Producer failed; continuing without its records");
            None
        }
    }
}

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("fato_ou_fake starting up");

    let args = Cli::parse();
    debug!(?args.method, args.pages, ?args.format, %args.output_dir, "Parsed CLI arguments");

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(user_agent) = args.user_agent.clone() {
        config.user_agent = user_agent;
    }

    // Fail before any network work if results could not be saved
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let fetcher = RetryFetch::new(
        HttpFetch::new(&config.user_agent, config.timeout())?,
        config.max_retries,
        RETRY_BASE_DELAY,
    );

    // ---- Collect from both producers concurrently ----
    let scraping = async {
        if args.method.includes(Method::Scraping) {
            Some(scrapers::g1::collect(&fetcher, &config, args.pages).await)
        } else {
            None
        }
    };
    let feed = async {
        if args.method.includes(Method::Feed) {
            Some(scrapers::feed::collect(&fetcher, &config).await)
        } else {
            None
        }
    };
    let (scraping, feed) = tokio::join!(scraping, feed);

    let batches: Vec<MethodBatch> = [
        into_batch(Method::Scraping, scraping),
        into_batch(Method::Feed, feed),
    ]
    .into_iter()
    .flatten()
    .collect();

    // ---- Normalize, classify, deduplicate, assemble ----
    let mut ctx = RunContext::new(Utc::now());
    let dataset = pipeline::run(&mut ctx, batches);

    let stats = dataset.stats();
    info!(
        total = stats.total,
        fato = stats.fato,
        fato_pct = %format!("{:.1}", stats.percent(stats.fato)),
        fake = stats.fake,
        fake_pct = %format!("{:.1}", stats.percent(stats.fake)),
        indeterminado = stats.indeterminado,
        indeterminado_pct = %format!("{:.1}", stats.percent(stats.indeterminado)),
        "Dataset statistics"
    );
    for (method, count) in &stats.by_method {
        info!(%method, count, pct = %format!("{:.1}", stats.percent(*count)), "Rows per method");
    }

    // ---- Output ----
    if dataset.is_empty() {
        info!("Dataset vazio; nothing to save");
    } else {
        let stamp = file_stamp(Local::now());

        if args.format.wants_csv() {
            if let Err(e) = csv::write_dataset(&dataset, &args.output_dir, &stamp).await {
                error!(error = %e, "Failed to write CSV");
            }
        }
        if args.format.wants_json() {
            if let Err(e) = json::write_dataset(&dataset, &args.output_dir, &stamp).await {
                error!(error = %e, "Failed to write JSON");
            }
        }
        if let Err(e) = json::write_ambiguities(&ctx.ambiguities, &args.output_dir, &stamp).await {
            error!(error = %e, "Failed to write ambiguous-classification audit");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        rows = dataset.len(),
        "Execution complete"
    );

    Ok(())
}
