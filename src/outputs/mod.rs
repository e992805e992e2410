//! Dual-sink persistence: a run-scoped CSV file plus one JSON file per
//! qualifying article.
//!
//! # Output structure
//!
//! ```text
//! output_dir/
//! ├── drimble_vuurwerk.csv        # one header row, one row per article
//! └── articles/
//!     ├── 0001_Grote_partij_vuurwerk_gevonden_3f2a9c01.json
//!     └── 0002_page_bc41d7e2.json
//! ```
//!
//! Both output directories are validated (created, write-probed) when the
//! sink is opened; a failure there is fatal to the run. A failure writing
//! one artifact is a per-article [`PersistError`] that the crawler logs and
//! counts without stopping.

pub mod csv;
pub mod json;

use crate::error::PersistError;
use crate::models::OutputArtifact;
use crate::utils::ensure_writable_dir;
use std::error::Error;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Name of the run-scoped CSV file inside the output directory.
pub const CSV_FILENAME: &str = "drimble_vuurwerk.csv";

/// Subdirectory receiving the per-article JSON files.
pub const ARTICLES_SUBDIR: &str = "articles";

/// Run-scoped persistence for qualifying articles.
pub struct Sink {
    csv: csv::CsvSink,
    articles_dir: PathBuf,
    next_index: usize,
}

impl Sink {
    /// Open the sink for one run: validate both directories and create a
    /// fresh CSV file.
    ///
    /// # Errors
    ///
    /// Fails when the output directory cannot be created or written to.
    /// This is the fatal filesystem condition that halts the run before it
    /// starts.
    #[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
    pub async fn open(output_dir: &str) -> Result<Self, Box<dyn Error>> {
        ensure_writable_dir(output_dir).await?;
        let articles_dir = PathBuf::from(output_dir).join(ARTICLES_SUBDIR);
        ensure_writable_dir(&articles_dir.to_string_lossy()).await?;

        let csv_path = PathBuf::from(output_dir).join(CSV_FILENAME);
        let csv = csv::CsvSink::create(&csv_path)?;
        info!(csv = %csv_path.display(), "Sink opened");

        Ok(Self {
            csv,
            articles_dir,
            next_index: 0,
        })
    }

    /// Persist one qualifying article to both sinks.
    ///
    /// The JSON file is written first; the CSV row is only appended once it
    /// exists, so a failed article leaves no row behind and both sinks agree
    /// on which articles made it.
    pub async fn persist(&mut self, artifact: &OutputArtifact) -> Result<(), PersistError> {
        self.next_index += 1;
        json::write_artifact(&self.articles_dir, self.next_index, artifact).await?;
        self.csv.append(artifact)?;
        Ok(())
    }

    /// Dump a non-qualifying page as JSON only, for debugging
    /// (`save_json_all`). Never touches the CSV.
    pub async fn dump_json(&mut self, artifact: &OutputArtifact) -> Result<PathBuf, PersistError> {
        self.next_index += 1;
        json::write_artifact(&self.articles_dir, self.next_index, artifact).await
    }
}
