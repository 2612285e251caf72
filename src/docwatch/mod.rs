use crate::recognition::transport_error;
use crate::utils::{DocumentWatchConfig, Result};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

/// A regulatory-document source whose fingerprint changed since last poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpdate {
    pub url: String,
    pub fingerprint: String,
}

/// Polls document sources and reports changes using HTTP validators: ETag
/// when the server sends one, otherwise Last-Modified, otherwise the content
/// length.
pub struct DocumentWatcher {
    client: Client,
    sources: Vec<String>,
    seen: HashMap<String, String>,
}

impl DocumentWatcher {
    pub fn new(config: &DocumentWatchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            sources: config.sources.clone(),
            seen: HashMap::new(),
        })
    }

    pub async fn poll_once(&mut self) -> Vec<DocumentUpdate> {
        let mut updates = Vec::new();

        for url in self.sources.clone() {
            match self.fetch_fingerprint(&url).await {
                Ok(fingerprint) => {
                    let changed = self
                        .seen
                        .get(&url)
                        .map(|old| old != &fingerprint)
                        .unwrap_or(false);
                    let first_seen = !self.seen.contains_key(&url);
                    self.seen.insert(url.clone(), fingerprint.clone());

                    if changed {
                        info!(url = %url, "document source changed");
                        updates.push(DocumentUpdate { url, fingerprint });
                    } else if first_seen {
                        info!(url = %url, "document source registered");
                    }
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "document source poll failed");
                }
            }
        }

        updates
    }

    async fn fetch_fingerprint(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(transport_error)?;

        let headers = response.headers();
        let fingerprint = headers
            .get(reqwest::header::ETAG)
            .or_else(|| headers.get(reqwest::header::LAST_MODIFIED))
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
            .unwrap_or_else(|| format!("len:{}", response.content_length().unwrap_or(0)));

        Ok(fingerprint)
    }

    /// Run the poll loop on an interval for the lifetime of the process.
    pub fn start_background(mut self, poll_interval_hours: u64) {
        let interval_duration = Duration::from_secs(poll_interval_hours.max(1) * 60 * 60);

        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval_duration);

            loop {
                timer.tick().await;

                let updates = self.poll_once().await;
                if !updates.is_empty() {
                    info!(changed = updates.len(), "regulatory documents updated");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_sources_are_skipped_not_fatal() {
        let config = DocumentWatchConfig {
            sources: vec!["http://127.0.0.1:1/doc".to_string()],
            poll_interval_hours: 1,
            timeout_seconds: 1,
        };
        let mut watcher = DocumentWatcher::new(&config).unwrap();
        let updates = watcher.poll_once().await;
        assert!(updates.is_empty());
    }

    #[tokio::test]
    async fn empty_source_list_is_a_noop() {
        let config = DocumentWatchConfig {
            sources: Vec::new(),
            poll_interval_hours: 1,
            timeout_seconds: 1,
        };
        let mut watcher = DocumentWatcher::new(&config).unwrap();
        assert!(watcher.poll_once().await.is_empty());
    }
}
