//! # Vuurwerkwacht
//!
//! A keyword-driven news harvester for [Drimble](https://drimble.nl). It
//! crawls the site's search-result pages (and optionally the article links
//! they reveal, breadth-first) and produces one structured record per
//! article that mentions the keyword: bibliographic fields, every keyword
//! occurrence with its surrounding context, nearby numbers and dates, and
//! optional named entities from an external NER service.
//!
//! ## Usage
//!
//! ```sh
//! vuurwerkwacht --max-pages 2 --follow-links -o ./output_scrapers
//! ```
//!
//! ## Architecture
//!
//! A sequential pipeline driven by a budgeted BFS controller:
//! 1. **Fetch**: rate-limited HTTP GET (politeness delay before each call)
//! 2. **Extract**: HTML into an `ArticleRecord` with graceful degradation
//! 3. **Analyze**: keyword occurrences, context windows, nearby signals
//! 4. **Enrich**: optional named entities; no-op when the backend is absent
//! 5. **Persist**: CSV row plus a per-article JSON file

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod analyze;
mod cli;
mod config;
mod crawl;
mod enrich;
mod error;
mod extract;
mod fetch;
mod models;
mod outputs;
mod utils;

use cli::Cli;
use config::CrawlConfig;
use crawl::Crawler;
use enrich::Enricher;
use fetch::HttpFetcher;
use outputs::Sink;

#[tokio::main]
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
    info!("vuurwerkwacht starting up");

    // Parse CLI and assemble the run configuration
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = match &args.config {
        Some(path) => {
            let config = CrawlConfig::from_yaml_file(path)?;
            info!(path = %path, "Loaded configuration file");
            config
        }
        None => CrawlConfig::default(),
    };
    if let Some(keyword) = args.keyword {
        config.keyword = keyword;
    }
    if let Some(max_pages) = args.max_pages {
        config.max_pages = max_pages;
    }
    if args.follow_links {
        config.follow_links = true;
    }
    if let Some(max_total_articles) = args.max_total_articles {
        config.max_total_articles = max_total_articles;
    }
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    if args.nlp_endpoint.is_some() {
        config.nlp_endpoint = args.nlp_endpoint;
    }
    info!(
        keyword = %config.keyword,
        max_pages = config.max_pages,
        follow_links = config.follow_links,
        max_total_articles = config.max_total_articles,
        delay_seconds = config.delay_seconds,
        "Run configuration"
    );

    // Early check: the sink validates both output directories up front, so
    // an unwritable disk fails the run before the first request goes out.
    let sink = match Sink::open(&config.output_dir).await {
        Ok(sink) => sink,
        Err(e) => {
            error!(
                path = %config.output_dir,
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    };

    let fetcher = HttpFetcher::new(Duration::from_secs_f64(config.delay_seconds))?;
    let enricher = Enricher::resolve(config.nlp_endpoint.as_deref()).await;
    info!(ner_available = enricher.available(), "Entity enrichment resolved");

    let mut crawler = Crawler::new(config, fetcher, enricher, sink);
    let report = crawler.run().await?;

    let elapsed = start_time.elapsed();
    info!(
        attempted = report.attempted,
        matched = report.matched,
        persisted = report.persisted,
        skipped_fetch = report.skipped_fetch,
        skipped_persist = report.skipped_persist,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
