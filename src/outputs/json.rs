//! Per-article JSON output.
//!
//! Each qualifying article becomes one pretty-printed JSON file holding the
//! full [`OutputArtifact`]. Filenames are derived deterministically from the
//! running index, a sanitized slug of the title, and a short hash of the
//! URL, so duplicate titles can never collide:
//!
//! ```text
//! {index:04}_{slug}_{hash8}.json
//! 0001_Grote_partij_vuurwerk_gevonden_3f2a9c01.json
//! ```

use crate::error::PersistError;
use crate::models::OutputArtifact;
use crate::utils::{sanitize_slug, short_hash};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// File name for one artifact.
pub fn artifact_filename(index: usize, artifact: &OutputArtifact) -> String {
    let slug = sanitize_slug(artifact.record.title.as_deref().unwrap_or(""));
    format!(
        "{:04}_{}_{}.json",
        index,
        slug,
        short_hash(&artifact.record.url)
    )
}

/// Write one artifact into `dir` and return the path written.
pub async fn write_artifact(
    dir: &Path,
    index: usize,
    artifact: &OutputArtifact,
) -> Result<PathBuf, PersistError> {
    let path = dir.join(artifact_filename(index, artifact));
    let json = serde_json::to_string_pretty(artifact)?;
    fs::write(&path, json).await?;
    debug!(path = %path.display(), "Wrote article JSON");
    Ok(path)
}
