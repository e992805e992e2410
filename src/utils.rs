//! Utility functions for URL normalization, filename parts, and file system
//! validation.

use sha2::{Digest, Sha256};
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Normalize a URL for dedup purposes: resolve against a base, drop the
/// fragment, and keep only http(s) schemes.
///
/// Fragment-only differences must not cause a page to be fetched twice,
/// which is why the fragment is stripped before the URL enters the visited
/// set.
///
/// # Returns
///
/// The normalized absolute URL as a string, or `None` when the href does not
/// resolve to an http(s) URL.
pub fn normalize_url(base: &Url, href: &str) -> Option<String> {
    let mut resolved = base.join(href).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    resolved.set_fragment(None);
    Some(resolved.to_string())
}

/// Sanitize a title into a filename-safe slug of at most 40 characters.
///
/// Characters outside `[0-9a-zA-Z_-]` become underscores. An empty or
/// all-invalid title degrades to `"page"` so the filename always has a slug
/// part.
pub fn sanitize_slug(title: &str) -> String {
    let slug: String = title
        .chars()
        .take(40)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if slug.chars().all(|c| c == '_') {
        "page".to_string()
    } else {
        slug
    }
}

/// First 8 hex characters of the SHA-256 of `input`.
///
/// Used as the collision-avoidance part of per-article JSON filenames, so
/// two articles with identical titles still get distinct files.
pub fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(digest)[..8].to_string()
}

/// Collapse all runs of whitespace in `s` into single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file. A failure here is a
/// run-level failure: there is no point crawling if nothing can be saved.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
