//! Data models for crawl tasks, extracted articles, and persisted artifacts.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`CrawlTask`]: one URL waiting in the crawl frontier
//! - [`ArticleRecord`]: the structured result of extracting one HTML page
//! - [`KeywordMatch`] / [`ContextualSignals`]: evidence produced by the
//!   keyword analyzer
//! - [`Entity`]: a named entity produced by the optional NLP backend
//! - [`OutputArtifact`]: the union of all of the above, persisted as one JSON
//!   file and one CSV row
//! - [`RunReport`]: end-of-run counters
//!
//! Everything except the frontier and visited set lives and dies within the
//! processing of a single URL.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Where a [`CrawlTask`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskOrigin {
    /// Enumerated search-result page.
    Seed,
    /// Internal link discovered while extracting an article.
    Discovered,
}

/// One URL waiting in the crawl frontier.
///
/// Tasks are created when enqueued, consumed exactly once by the crawler,
/// and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// Normalized absolute URL.
    pub url: String,
    /// Number of link hops from a seed search-result page.
    pub depth: usize,
    /// Seed page or discovered article link.
    pub origin: TaskOrigin,
}

/// The structured result of extracting one article page.
///
/// Every bibliographic field is independently optional: absence of one field
/// in the markup never aborts extraction of the others, and is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Normalized URL the page was fetched from.
    pub url: String,
    /// Headline, if the markup carried one.
    pub title: Option<String>,
    /// Publication date exactly as found in the markup (not normalized).
    pub published_date: Option<String>,
    /// Byline, if present.
    pub author: Option<String>,
    /// Tag/category labels, first-seen order, de-duplicated.
    pub tags: Vec<String>,
    /// og:image or first content image, resolved to an absolute URL.
    pub main_image_url: Option<String>,
    /// Concatenated text of the main content region, whitespace collapsed.
    pub full_text: String,
    /// Same-origin links found on the page, used for BFS link following.
    pub outbound_links: BTreeSet<String>,
}

impl ArticleRecord {
    /// Whitespace-separated word count of the body text.
    pub fn word_count(&self) -> usize {
        self.full_text.split_whitespace().count()
    }
}

/// One case-insensitive occurrence of the keyword in an article's body text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordMatch {
    /// 0-based position of this occurrence among all occurrences.
    pub occurrence_index: usize,
    /// Character offset of the occurrence within the body text.
    pub char_offset: usize,
    /// Fixed-radius character window around the occurrence, truncated at
    /// text boundaries and never padded.
    pub context_window: String,
    /// The sentence enclosing the occurrence.
    pub containing_sentence: String,
}

/// Signals derived from the neighbourhood of all keyword occurrences.
///
/// Both lists are de-duplicated while preserving the order of first
/// appearance in the text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextualSignals {
    /// Numeric tokens found within a bounded distance of any occurrence.
    pub nearby_numbers: Vec<String>,
    /// Date-like substrings (`31-12-2024`, `31 december 2024`) found within
    /// a bounded distance of any occurrence.
    pub nearby_dates: Vec<String>,
}

/// A named entity produced by the optional NLP backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Surface text of the entity.
    pub text: String,
    /// Entity category assigned by the backend (e.g. `PER`, `ORG`, `LOC`).
    pub label: String,
    /// Character span of the entity within the body text.
    pub char_span: (usize, usize),
}

/// Everything known about one qualifying article, persisted as a single JSON
/// object and flattened into a single CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputArtifact {
    /// The extracted article.
    pub record: ArticleRecord,
    /// One entry per keyword occurrence, left-to-right.
    pub matches: Vec<KeywordMatch>,
    /// Numbers and dates found near the occurrences.
    pub signals: ContextualSignals,
    /// Named entities; empty when the NLP backend is unavailable.
    pub entities: Vec<Entity>,
    /// RFC 3339 local timestamp of when this artifact was produced.
    pub harvested_at: String,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Tasks dequeued and handed to the fetcher.
    pub attempted: usize,
    /// Pages whose body text contained at least one keyword occurrence.
    pub matched: usize,
    /// Artifacts written to both sinks.
    pub persisted: usize,
    /// Tasks dropped because the fetch failed.
    pub skipped_fetch: usize,
    /// Qualifying articles dropped because persistence failed.
    pub skipped_persist: usize,
}
