//! Error taxonomy for the harvest pipeline.
//!
//! Failures are deliberately split by blast radius:
//! - [`FetchError`]: one task's network request failed; the task is dropped
//!   and the run continues.
//! - [`PersistError`]: writing one artifact failed; the article is skipped
//!   and the run continues. Directory-level failures are surfaced once at
//!   sink construction and abort the run.
//!
//! A malformed field during extraction is not an error at all (the field is
//! left absent), and a page without a keyword occurrence is the normal
//! "not relevant" outcome, signalled by `analyze` returning `None`.

use thiserror::Error;

/// A network request for one crawl task failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure: DNS, connect, TLS, or timeout.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("unexpected status {0} for {1}")]
    Status(u16, String),
}

/// Writing one artifact to disk failed.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
