// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Object store reached over plain HTTP GET.
//!
//! Works with any bucket that serves objects publicly at `{base_url}/{key}`
//! (S3-compatible storage, a CDN, a static file server).

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use commbot_core::CommbotError;
use commbot_core::traits::adapter::PluginAdapter;
use commbot_core::traits::object_store::ObjectStoreAdapter;
use commbot_core::types::{AdapterType, HealthStatus};

/// HTTP object store with one retry on transient status codes.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpObjectStore {
    /// Creates a store rooted at `base_url`. A trailing slash is ignored.
    pub fn new(base_url: impl Into<String>) -> Result<Self, CommbotError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CommbotError::ObjectStore {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Sets the pause before a retry.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// URL of the object stored under `key`.
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key.trim_start_matches('/'))
    }
}

#[async_trait]
impl PluginAdapter for HttpObjectStore {
    fn name(&self) -> &str {
        "http-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ObjectStore
    }

    async fn health_check(&self) -> Result<HealthStatus, CommbotError> {
        match self.client.head(&self.base_url).send().await {
            Ok(response) if response.status().is_server_error() => Ok(HealthStatus::Degraded(
                format!("store answered {}", response.status()),
            )),
            // Buckets commonly refuse listing the root; any answer means reachable.
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("store unreachable: {e}"))),
        }
    }
}

#[async_trait]
impl ObjectStoreAdapter for HttpObjectStore {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, CommbotError> {
        let url = self.object_url(key);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, key, "retrying object fetch after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| CommbotError::ObjectStore {
                    message: format!("GET {url} failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, key, "object store response received");

            if status.is_success() {
                let bytes = response.bytes().await.map_err(|e| CommbotError::ObjectStore {
                    message: format!("failed to read body of {url}: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return Ok(bytes.to_vec());
            }

            let error = CommbotError::ObjectStore {
                message: format!("GET {url} returned {status}"),
                source: None,
            };
            if is_transient_error(status) && attempt < self.max_retries {
                last_error = Some(error);
                continue;
            }
            return Err(error);
        }

        Err(last_error.unwrap_or_else(|| CommbotError::ObjectStore {
            message: format!("GET {url} failed after retries"),
            source: None,
        }))
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer) -> HttpObjectStore {
        HttpObjectStore::new(format!("{}/bucket/", server.uri()))
            .unwrap()
            .with_retry_delay(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn fetches_object_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bucket/phrases.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("phrase_id\n1\n"))
            .mount(&server)
            .await;

        let body = store(&server).fetch("phrases.csv").await.unwrap();
        assert_eq!(body, b"phrase_id\n1\n");
    }

    #[tokio::test]
    async fn retries_once_on_transient_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bucket/commands.csv"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bucket/commands.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("id\n"))
            .mount(&server)
            .await;

        let body = store(&server).fetch("commands.csv").await.unwrap();
        assert_eq!(body, b"id\n");
    }

    #[tokio::test]
    async fn gives_up_after_second_transient_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let err = store(&server).fetch("commands.csv").await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn missing_object_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = store(&server).fetch("nope.csv").await.unwrap_err();
        assert!(matches!(err, CommbotError::ObjectStore { .. }));
    }

    #[test]
    fn object_url_joins_cleanly() {
        let store = HttpObjectStore::new("https://storage.example.net/commbot/").unwrap();
        assert_eq!(
            store.object_url("/phrases.csv"),
            "https://storage.example.net/commbot/phrases.csv"
        );
    }
}
