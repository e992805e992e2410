//! CSV sink: one header row, then one row per qualifying article.
//!
//! Column order (stable within a run, documented here as the schema):
//!
//! ```text
//! url, title, date, author, tags, main_image, word_count, occurrences,
//! contexts, sentences, nearby_numbers, nearby_dates, entities
//! ```
//!
//! Sequence-valued fields stay inside one cell so the file keeps one row
//! per article: `tags` are joined with `;` (as the original corpus did),
//! all other lists with `" | "`, and entities render as `text:label`.

use crate::error::PersistError;
use crate::models::OutputArtifact;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

/// Delimiter for list-valued cells other than tags.
const LIST_SEP: &str = " | ";

#[derive(Debug, Serialize)]
struct CsvRow {
    url: String,
    title: String,
    date: String,
    author: String,
    tags: String,
    main_image: String,
    word_count: usize,
    occurrences: usize,
    contexts: String,
    sentences: String,
    nearby_numbers: String,
    nearby_dates: String,
    entities: String,
}

impl From<&OutputArtifact> for CsvRow {
    fn from(artifact: &OutputArtifact) -> Self {
        let record = &artifact.record;
        Self {
            url: record.url.clone(),
            title: record.title.clone().unwrap_or_default(),
            date: record.published_date.clone().unwrap_or_default(),
            author: record.author.clone().unwrap_or_default(),
            tags: record.tags.join(";"),
            main_image: record.main_image_url.clone().unwrap_or_default(),
            word_count: record.word_count(),
            occurrences: artifact.matches.len(),
            contexts: artifact
                .matches
                .iter()
                .map(|m| m.context_window.as_str())
                .collect::<Vec<_>>()
                .join(LIST_SEP),
            sentences: artifact
                .matches
                .iter()
                .map(|m| m.containing_sentence.as_str())
                .collect::<Vec<_>>()
                .join(LIST_SEP),
            nearby_numbers: artifact.signals.nearby_numbers.join(LIST_SEP),
            nearby_dates: artifact.signals.nearby_dates.join(LIST_SEP),
            entities: artifact
                .entities
                .iter()
                .map(|e| format!("{}:{}", e.text, e.label))
                .collect::<Vec<_>>()
                .join(LIST_SEP),
        }
    }
}

/// Append-only writer over the run-scoped CSV file.
pub struct CsvSink {
    writer: csv::Writer<File>,
}

impl CsvSink {
    /// Create a fresh CSV file for this run. The header row is emitted with
    /// the first appended record.
    pub fn create(path: &Path) -> Result<Self, PersistError> {
        Ok(Self {
            writer: csv::Writer::from_path(path)?,
        })
    }

    /// Append one artifact as a single row and flush it to disk.
    pub fn append(&mut self, artifact: &OutputArtifact) -> Result<(), PersistError> {
        self.writer.serialize(CsvRow::from(artifact))?;
        self.writer.flush()?;
        Ok(())
    }
}
