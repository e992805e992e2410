//! Run configuration for the harvester.
//!
//! All budgets, the politeness delay, and the output locations live here so
//! that a run is fully described by one [`CrawlConfig`] value. The struct can
//! be deserialized from a YAML file; every field has a default so a partial
//! file (or none at all) still yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;

/// Configuration for one harvest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Keyword to search for; matched case-insensitively in article text.
    #[serde(default = "default_keyword")]
    pub keyword: String,

    /// Site root; search pages and relative links resolve against this.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Number of search-result pages to seed the frontier from.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Follow article-internal links breadth-first.
    #[serde(default)]
    pub follow_links: bool,

    /// Maximum link hops from a seed page.
    #[serde(default = "default_max_link_depth")]
    pub max_link_depth: usize,

    /// Fan-out cap: newly discovered links enqueued per page.
    #[serde(default = "default_max_links_per_article")]
    pub max_links_per_article: usize,

    /// Global stop condition: persisted-article cap for the whole run.
    #[serde(default = "default_max_total_articles")]
    pub max_total_articles: usize,

    /// Also dump non-matching pages as JSON for debugging. Debug dumps do
    /// not count toward `max_total_articles` and never reach the CSV.
    #[serde(default)]
    pub save_json_all: bool,

    /// Politeness delay in seconds, applied before every fetch.
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: f64,

    /// Directory receiving the CSV file and the `articles/` JSON directory.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Optional NER service endpoint. When absent, entity enrichment
    /// degrades to a no-op with a single warning.
    #[serde(default)]
    pub nlp_endpoint: Option<String>,
}

fn default_keyword() -> String {
    "vuurwerk".to_string()
}

fn default_base_url() -> String {
    "https://drimble.nl".to_string()
}

fn default_max_pages() -> usize {
    1
}

fn default_max_link_depth() -> usize {
    1
}

fn default_max_links_per_article() -> usize {
    10
}

fn default_max_total_articles() -> usize {
    50
}

fn default_delay_seconds() -> f64 {
    1.0
}

fn default_output_dir() -> String {
    "output_scrapers".to_string()
}

impl Default for CrawlConfig {
    fn default() -> Self {
        // serde defaults and Default must agree; an empty mapping is the
        // canonical source of both.
        serde_yaml::from_str("{}").expect("empty mapping deserializes")
    }
}

impl CrawlConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values a YAML file can express but the run cannot use.
    fn validate(&self) -> Result<(), Box<dyn Error>> {
        if !self.delay_seconds.is_finite() || self.delay_seconds < 0.0 {
            return Err(format!(
                "delay_seconds must be a finite, non-negative number (got {})",
                self.delay_seconds
            )
            .into());
        }
        Ok(())
    }

    /// Search-result page URLs for pages `1..=max_pages`, following the
    /// site's `zoeken.html?q={keyword}&page={n}` convention.
    pub fn seed_urls(&self) -> Vec<String> {
        let query = urlencoding::encode(&self.keyword);
        (1..=self.max_pages)
            .map(|page| {
                format!(
                    "{}/zoeken.html?q={}&page={}",
                    self.base_url.trim_end_matches('/'),
                    query,
                    page
                )
            })
            .collect()
    }
}
