//! Optional named-entity enrichment.
//!
//! Entity extraction is delegated to an external NER service. Its presence
//! is checked exactly once, when [`Enricher::resolve`] probes the configured
//! endpoint at startup; it is never re-probed mid-run. When the backend is
//! absent the enricher degrades to a no-op: one process-wide warning on
//! first use, then an empty entity list for every article. Enrichment can
//! never fail the pipeline and never blocks persistence.
//!
//! # Wire contract
//!
//! The backend accepts `POST {endpoint}` with body `{"text": "..."}` and
//! answers with a JSON array of `{"text", "label", "start", "end"}` spans,
//! offsets in characters.

use crate::models::Entity;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Serialize)]
struct NerRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct NerSpan {
    text: String,
    label: String,
    start: usize,
    end: usize,
}

/// Capability-checked entity extraction collaborator.
#[derive(Debug)]
pub struct Enricher {
    backend: Option<NerBackend>,
    warned: AtomicBool,
}

#[derive(Debug)]
struct NerBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl Enricher {
    /// Resolve the NER backend once.
    ///
    /// Probes the configured endpoint with a GET request; any transport
    /// error or non-2xx answer means the backend is treated as unavailable
    /// for the rest of the run.
    #[instrument(level = "info", skip_all, fields(endpoint = endpoint.unwrap_or("<none>")))]
    pub async fn resolve(endpoint: Option<&str>) -> Self {
        let backend = match endpoint {
            None => None,
            Some(endpoint) => {
                let client = reqwest::Client::new();
                match client.get(endpoint).send().await {
                    Ok(response) if response.status().is_success() => {
                        info!("NER backend available");
                        Some(NerBackend {
                            client,
                            endpoint: endpoint.to_string(),
                        })
                    }
                    Ok(response) => {
                        warn!(status = %response.status(), "NER backend probe rejected; continuing without entities");
                        None
                    }
                    Err(e) => {
                        warn!(error = %e, "NER backend unreachable; continuing without entities");
                        None
                    }
                }
            }
        };
        Self {
            backend,
            warned: AtomicBool::new(false),
        }
    }

    /// Extract named entities from a body text.
    ///
    /// Returns an empty list when the backend is unavailable (with a single
    /// warning on first use) or when a backend call fails for this article.
    pub async fn enrich(&self, text: &str) -> Vec<Entity> {
        let Some(backend) = &self.backend else {
            if self.should_warn() {
                warn!("NER backend unavailable; articles will be persisted without entities");
            }
            return Vec::new();
        };

        match backend.entities(text).await {
            Ok(entities) => entities,
            Err(e) => {
                debug!(error = %e, "NER call failed for this article; persisting without entities");
                Vec::new()
            }
        }
    }

    /// Whether the backend is available for this run.
    pub fn available(&self) -> bool {
        self.backend.is_some()
    }

    /// True exactly once per enricher when the backend is absent.
    fn should_warn(&self) -> bool {
        !self.warned.swap(true, Ordering::Relaxed)
    }
}

impl NerBackend {
    async fn entities(&self, text: &str) -> Result<Vec<Entity>, reqwest::Error> {
        let spans: Vec<NerSpan> = self
            .client
            .post(&self.endpoint)
            .json(&NerRequest { text })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(spans
            .into_iter()
            .map(|span| Entity {
                text: span.text,
                label: span.label,
                char_span: (span.start, span.end),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_unavailable_backend_returns_empty_and_warns_once() {
        let enricher = Enricher::resolve(None).await;
        assert!(!enricher.available());

        assert!(enricher.enrich("vuurwerk in Amsterdam").await.is_empty());
        assert!(enricher.enrich("nog een artikel").await.is_empty());

        // warn-once latch is spent after the first call
        assert!(enricher.warned.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn test_should_warn_fires_exactly_once() {
        let enricher = Enricher::resolve(None).await;
        assert!(enricher.should_warn());
        assert!(!enricher.should_warn());
        assert!(!enricher.should_warn());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_degrades_to_unavailable() {
        let enricher = Enricher::resolve(Some("http://127.0.0.1:1/ner")).await;
        assert!(!enricher.available());
        assert!(enricher.enrich("tekst").await.is_empty());
    }

    #[tokio::test]
    async fn test_available_backend_maps_spans() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"text": "Amsterdam", "label": "LOC", "start": 12, "end": 21}
            ])))
            .mount(&server)
            .await;

        let enricher = Enricher::resolve(Some(&server.uri())).await;
        assert!(enricher.available());

        let entities = enricher.enrich("vuurwerk in Amsterdam").await;
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "Amsterdam");
        assert_eq!(entities[0].label, "LOC");
        assert_eq!(entities[0].char_span, (12, 21));
    }

    #[tokio::test]
    async fn test_mid_run_backend_failure_yields_empty_not_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let enricher = Enricher::resolve(Some(&server.uri())).await;
        assert!(enricher.available());
        assert!(enricher.enrich("tekst").await.is_empty());
    }
}
