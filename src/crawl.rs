//! Budgeted breadth-first crawl over search-result pages and discovered
//! article links.
//!
//! The [`Crawler`] owns the run's only mutable state: the FIFO frontier, the
//! visited set, and the counters in [`RunReport`]. Processing is strictly
//! sequential; each dequeued task goes through fetch → extract → analyze →
//! enrich → persist before the next one starts, so articles land in the
//! sinks in frontier pop order (seeds before the links they spawn).
//!
//! Deduplication happens at enqueue time: a URL enters the visited set the
//! moment it enters the frontier, which both bounds the frontier under link
//! cycles and guarantees no URL is fetched twice in one run.
//!
//! Per-task failures (fetch errors, persist errors for one article) are
//! logged and counted; the run continues. Two conditions abort a run: the
//! sink's directory validation, done before the crawler is built, and a
//! fetch failure on the very first seed page, which means the search
//! endpoint itself is unreachable and nothing can come of the run.

use crate::analyze::Analyzer;
use crate::config::CrawlConfig;
use crate::enrich::Enricher;
use crate::error::FetchError;
use crate::extract::extract;
use crate::fetch::Fetch;
use crate::models::{CrawlTask, OutputArtifact, RunReport, TaskOrigin};
use crate::outputs::Sink;
use crate::utils::normalize_url;
use chrono::Local;
use std::collections::{HashSet, VecDeque};
use std::error::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Sequential BFS crawl controller.
pub struct Crawler<F: Fetch> {
    config: CrawlConfig,
    fetcher: F,
    analyzer: Analyzer,
    enricher: Enricher,
    sink: Sink,
    visited: HashSet<String>,
    frontier: VecDeque<CrawlTask>,
}

impl<F: Fetch> Crawler<F> {
    /// Assemble a crawler from its collaborators. The analyzer is derived
    /// from the configured keyword.
    pub fn new(config: CrawlConfig, fetcher: F, enricher: Enricher, sink: Sink) -> Self {
        let analyzer = Analyzer::new(&config.keyword);
        Self {
            config,
            fetcher,
            analyzer,
            enricher,
            sink,
            visited: HashSet::new(),
            frontier: VecDeque::new(),
        }
    }

    /// Run the crawl to completion and report the counters.
    ///
    /// Terminates when the frontier is empty or `max_total_articles`
    /// qualifying articles have been persisted.
    ///
    /// # Errors
    ///
    /// Fails when the configured base URL is not a valid URL, or when the
    /// very first seed page cannot be fetched (the search endpoint is
    /// unreachable, so the whole run is moot). Every later per-task failure
    /// is absorbed into the report.
    #[instrument(level = "info", skip_all, fields(keyword = %self.config.keyword))]
    pub async fn run(&mut self) -> Result<RunReport, Box<dyn Error>> {
        let base = Url::parse(&self.config.base_url)?;
        for seed in self.config.seed_urls() {
            if let Some(url) = normalize_url(&base, &seed) {
                self.enqueue(url, 0, TaskOrigin::Seed);
            }
        }
        info!(
            seeds = self.frontier.len(),
            max_total_articles = self.config.max_total_articles,
            follow_links = self.config.follow_links,
            "Crawl starting"
        );

        let mut report = RunReport::default();
        while let Some(task) = self.frontier.pop_front() {
            if report.persisted >= self.config.max_total_articles {
                info!(persisted = report.persisted, "Article budget reached; stopping");
                break;
            }
            if task.depth > self.config.max_link_depth {
                debug!(url = %task.url, depth = task.depth, "Depth budget exceeded; skipping");
                continue;
            }
            let first_task = report.attempted == 0;
            if let Err(e) = self.process(task, &mut report).await {
                if first_task {
                    return Err(format!("search endpoint unreachable: {e}").into());
                }
            }
        }

        info!(
            attempted = report.attempted,
            matched = report.matched,
            persisted = report.persisted,
            skipped_fetch = report.skipped_fetch,
            skipped_persist = report.skipped_persist,
            "Crawl finished"
        );
        Ok(report)
    }

    /// Run one task through the whole pipeline. An `Err` means the fetch
    /// itself failed; the task is already counted in the report either way.
    async fn process(&mut self, task: CrawlTask, report: &mut RunReport) -> Result<(), FetchError> {
        report.attempted += 1;
        debug!(url = %task.url, depth = task.depth, origin = ?task.origin, "Processing task");

        let html = match self.fetcher.fetch(&task.url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url = %task.url, error = %e, "Fetch failed; dropping task");
                report.skipped_fetch += 1;
                return Err(e);
            }
        };
        let Ok(page_url) = Url::parse(&task.url) else {
            // tasks are normalized before they enter the frontier
            warn!(url = %task.url, "Task URL no longer parses; dropping");
            report.skipped_fetch += 1;
            return Ok(());
        };

        let record = extract(&html, &page_url);
        let links: Vec<String> = record.outbound_links.iter().cloned().collect();

        match self.analyzer.analyze(&record.full_text) {
            None => {
                debug!(url = %record.url, "No keyword occurrence; discarding");
                if self.config.save_json_all {
                    let artifact = OutputArtifact {
                        record,
                        matches: Vec::new(),
                        signals: Default::default(),
                        entities: Vec::new(),
                        harvested_at: Local::now().to_rfc3339(),
                    };
                    if let Err(e) = self.sink.dump_json(&artifact).await {
                        warn!(url = %artifact.record.url, error = %e, "Debug JSON dump failed");
                    }
                }
            }
            Some(analysis) => {
                report.matched += 1;
                let entities = self.enricher.enrich(&record.full_text).await;
                let artifact = OutputArtifact {
                    record,
                    matches: analysis.matches,
                    signals: analysis.signals,
                    entities,
                    harvested_at: Local::now().to_rfc3339(),
                };
                match self.sink.persist(&artifact).await {
                    Ok(()) => {
                        report.persisted += 1;
                        info!(
                            url = %artifact.record.url,
                            occurrences = artifact.matches.len(),
                            persisted = report.persisted,
                            "Persisted article"
                        );
                    }
                    Err(e) => {
                        warn!(url = %artifact.record.url, error = %e, "Persist failed; skipping article");
                        report.skipped_persist += 1;
                    }
                }
            }
        }

        if self.config.follow_links
            && task.depth < self.config.max_link_depth
            && report.persisted < self.config.max_total_articles
        {
            let mut enqueued = 0;
            for link in links {
                if enqueued >= self.config.max_links_per_article {
                    break;
                }
                if self.enqueue(link, task.depth + 1, TaskOrigin::Discovered) {
                    enqueued += 1;
                }
            }
            debug!(url = %task.url, enqueued, "Enqueued discovered links");
        }
        Ok(())
    }

    /// Put a URL on the frontier unless it was seen before. Returns whether
    /// the URL was actually enqueued.
    fn enqueue(&mut self, url: String, depth: usize, origin: TaskOrigin) -> bool {
        if self.visited.insert(url.clone()) {
            self.frontier.push_back(CrawlTask { url, depth, origin });
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// In-memory fetcher that records every request it sees.
    struct ScriptedFetcher {
        pages: HashMap<String, String>,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedFetcher {
        fn new(pages: &[(&str, String)]) -> (Self, Arc<Mutex<Vec<String>>>) {
            let log = Arc::new(Mutex::new(Vec::new()));
            let fetcher = Self {
                pages: pages
                    .iter()
                    .map(|(url, html)| (url.to_string(), html.clone()))
                    .collect(),
                log: Arc::clone(&log),
            };
            (fetcher, log)
        }
    }

    impl Fetch for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.log.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Status(404, url.to_string()))
        }
    }

    const SEED: &str = "https://drimble.nl/zoeken.html?q=vuurwerk&page=1";

    fn page(text: &str, links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|href| format!(r#"<a href="{href}">link</a>"#))
            .collect();
        format!("<html><body><article><p>{text}</p>{anchors}</article></body></html>")
    }

    async fn build_crawler(
        pages: &[(&str, String)],
        config: CrawlConfig,
    ) -> (Crawler<ScriptedFetcher>, Arc<Mutex<Vec<String>>>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = CrawlConfig {
            output_dir: dir.path().to_string_lossy().to_string(),
            ..config
        };
        let sink = Sink::open(&config.output_dir).await.unwrap();
        let enricher = Enricher::resolve(None).await;
        let (fetcher, log) = ScriptedFetcher::new(pages);
        (Crawler::new(config, fetcher, enricher, sink), log, dir)
    }

    fn follow_config() -> CrawlConfig {
        CrawlConfig {
            follow_links: true,
            max_link_depth: 3,
            delay_seconds: 0.0,
            ..CrawlConfig::default()
        }
    }

    #[tokio::test]
    async fn test_no_url_fetched_twice_despite_cycles() {
        let pages = [
            (SEED, page("zoekresultaten vuurwerk", &["/a.html"])),
            (
                "https://drimble.nl/a.html",
                page("vuurwerk artikel a", &["/b.html", "/zoeken.html?q=vuurwerk&page=1"]),
            ),
            ("https://drimble.nl/b.html", page("vuurwerk artikel b", &["/a.html"])),
        ];
        let (mut crawler, log, _dir) = build_crawler(&pages, follow_config()).await;
        let report = crawler.run().await.unwrap();

        let log = log.lock().unwrap();
        let unique: HashSet<&String> = log.iter().collect();
        assert_eq!(log.len(), unique.len(), "a URL was fetched twice: {log:?}");
        assert_eq!(log.len(), 3);
        assert_eq!(report.persisted, 3);
    }

    #[tokio::test]
    async fn test_zero_article_budget_means_zero_sink_calls() {
        let pages = [(SEED, page("vuurwerk overal", &["/a.html"]))];
        let config = CrawlConfig {
            max_total_articles: 0,
            ..follow_config()
        };
        let (mut crawler, log, dir) = build_crawler(&pages, config).await;
        let report = crawler.run().await.unwrap();

        assert_eq!(report.persisted, 0);
        assert_eq!(report.attempted, 0);
        assert!(log.lock().unwrap().is_empty());

        let csv = std::fs::read_to_string(dir.path().join(crate::outputs::CSV_FILENAME)).unwrap();
        assert!(csv.is_empty());
        assert_eq!(
            std::fs::read_dir(dir.path().join(crate::outputs::ARTICLES_SUBDIR)).unwrap().count(),
            0
        );
    }

    #[tokio::test]
    async fn test_links_not_followed_when_disabled() {
        let pages = [
            (SEED, page("vuurwerk", &["/a.html"])),
            ("https://drimble.nl/a.html", page("vuurwerk a", &[])),
        ];
        let config = CrawlConfig {
            follow_links: false,
            delay_seconds: 0.0,
            ..CrawlConfig::default()
        };
        let (mut crawler, log, _dir) = build_crawler(&pages, config).await;
        let report = crawler.run().await.unwrap();

        assert_eq!(log.lock().unwrap().len(), 1);
        assert_eq!(report.attempted, 1);
    }

    #[tokio::test]
    async fn test_fan_out_capped_per_page() {
        let pages = [
            (
                SEED,
                page("vuurwerk", &["/a.html", "/b.html", "/c.html", "/d.html", "/e.html"]),
            ),
            ("https://drimble.nl/a.html", page("vuurwerk a", &[])),
            ("https://drimble.nl/b.html", page("vuurwerk b", &[])),
            ("https://drimble.nl/c.html", page("vuurwerk c", &[])),
        ];
        let config = CrawlConfig {
            max_links_per_article: 2,
            ..follow_config()
        };
        let (mut crawler, log, _dir) = build_crawler(&pages, config).await;
        crawler.run().await.unwrap();

        // seed plus exactly two discovered links
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_failure_after_first_page_drops_task_and_continues() {
        let pages = [(SEED, page("vuurwerk pagina een", &[]))];
        let config = CrawlConfig {
            max_pages: 2,
            delay_seconds: 0.0,
            ..CrawlConfig::default()
        };
        let (mut crawler, _log, _dir) = build_crawler(&pages, config).await;
        let report = crawler.run().await.unwrap();

        assert_eq!(report.attempted, 2);
        assert_eq!(report.skipped_fetch, 1);
        assert_eq!(report.persisted, 1);
    }

    #[tokio::test]
    async fn test_unreachable_search_endpoint_fails_run() {
        // no pages at all: the very first seed fetch fails, which means the
        // search endpoint itself is down and the run must not report success
        let config = CrawlConfig {
            max_pages: 2,
            delay_seconds: 0.0,
            ..CrawlConfig::default()
        };
        let (mut crawler, log, dir) = build_crawler(&[], config).await;
        let result = crawler.run().await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("unreachable"));
        // failed before touching page 2
        assert_eq!(log.lock().unwrap().len(), 1);
        let csv = std::fs::read_to_string(dir.path().join(crate::outputs::CSV_FILENAME)).unwrap();
        assert!(csv.is_empty());
    }

    #[tokio::test]
    async fn test_non_matching_pages_are_discarded() {
        let pages = [(SEED, page("niets interessants hier", &[]))];
        let (mut crawler, _log, dir) = build_crawler(&pages, follow_config()).await;
        let report = crawler.run().await.unwrap();

        assert_eq!(report.attempted, 1);
        assert_eq!(report.matched, 0);
        assert_eq!(report.persisted, 0);
        assert_eq!(
            std::fs::read_dir(dir.path().join(crate::outputs::ARTICLES_SUBDIR)).unwrap().count(),
            0
        );
    }

    #[tokio::test]
    async fn test_save_json_all_dumps_non_matching_pages() {
        let pages = [(SEED, page("niets interessants hier", &[]))];
        let config = CrawlConfig {
            save_json_all: true,
            ..follow_config()
        };
        let (mut crawler, _log, dir) = build_crawler(&pages, config).await;
        let report = crawler.run().await.unwrap();

        assert_eq!(report.persisted, 0);
        // dumped as JSON for debugging, but never a CSV row
        assert_eq!(
            std::fs::read_dir(dir.path().join(crate::outputs::ARTICLES_SUBDIR)).unwrap().count(),
            1
        );
        let csv = std::fs::read_to_string(dir.path().join(crate::outputs::CSV_FILENAME)).unwrap();
        assert!(csv.is_empty());
    }

    #[tokio::test]
    async fn test_bfs_processes_seeds_before_discovered_links() {
        let pages = [
            (SEED, page("vuurwerk", &["/diep.html"])),
            (
                "https://drimble.nl/zoeken.html?q=vuurwerk&page=2",
                page("vuurwerk twee", &[]),
            ),
            ("https://drimble.nl/diep.html", page("vuurwerk diep", &[])),
        ];
        let config = CrawlConfig {
            max_pages: 2,
            ..follow_config()
        };
        let (mut crawler, log, _dir) = build_crawler(&pages, config).await;
        crawler.run().await.unwrap();

        let log = log.lock().unwrap();
        assert_eq!(log[0], SEED);
        assert_eq!(log[1], "https://drimble.nl/zoeken.html?q=vuurwerk&page=2");
        assert_eq!(log[2], "https://drimble.nl/diep.html");
    }

    #[tokio::test]
    async fn test_article_budget_stops_run() {
        let pages = [
            (SEED, page("vuurwerk", &["/a.html", "/b.html"])),
            ("https://drimble.nl/a.html", page("vuurwerk a", &[])),
            ("https://drimble.nl/b.html", page("vuurwerk b", &[])),
        ];
        let config = CrawlConfig {
            max_total_articles: 2,
            ..follow_config()
        };
        let (mut crawler, _log, _dir) = build_crawler(&pages, config).await;
        let report = crawler.run().await.unwrap();

        assert_eq!(report.persisted, 2);
    }
}
