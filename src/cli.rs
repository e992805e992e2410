//! Command-line interface definitions.
//!
//! The CLI is a thin shell over [`CrawlConfig`](crate::config::CrawlConfig):
//! an optional YAML config file plus a handful of flags that override the
//! most commonly tweaked fields. Everything the pipeline needs travels in
//! the config struct, not in ambient CLI state.

use clap::Parser;

/// Command-line arguments for the vuurwerkwacht harvester.
///
/// # Examples
///
/// ```sh
/// # Defaults: one search page, keyword "vuurwerk", output_scrapers/
/// vuurwerkwacht
///
/// # Three search pages, follow article links, custom output directory
/// vuurwerkwacht --max-pages 3 --follow-links -o ./harvest
///
/// # Full control through a config file
/// vuurwerkwacht -c vuurwerkwacht.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Keyword to harvest articles for
    #[arg(short, long)]
    pub keyword: Option<String>,

    /// Number of search-result pages to seed from
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Follow article-internal links breadth-first
    #[arg(long)]
    pub follow_links: bool,

    /// Global cap on persisted articles
    #[arg(long)]
    pub max_total_articles: Option<usize>,

    /// Output directory for the CSV file and article JSONs
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// NER service endpoint (optional)
    #[arg(long, env = "NLP_ENDPOINT")]
    pub nlp_endpoint: Option<String>,
}
