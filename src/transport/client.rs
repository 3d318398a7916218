//! Retrying transport
//!
//! One logical request = up to `retry_count` sequential attempts, each bounded
//! by `timeout_ms`, separated by a linear backoff (`backoff_step_ms * n`
//! after attempt n). A 2xx reply whose body parses as JSON ends the loop even
//! if the body reports an application failure.

use reqwest::{Method, Url};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use super::backend::{HttpBackend, HttpReply, HttpRequest};
use super::error::{AttemptFailure, TransportError};
use crate::config::ApiConfig;

/// Path (as raw segments) plus query pairs, relative to the base URL.
///
/// Segments are percent-encoded when the URL is built, so ids containing
/// `/` or spaces cannot escape their segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl Endpoint {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))?;
        for (i, (k, v)) in self.query.iter().enumerate() {
            write!(f, "{}{}={}", if i == 0 { '?' } else { '&' }, k, v)?;
        }
        Ok(())
    }
}

pub struct Transport {
    config: ApiConfig,
    base_url: Url,
    backend: Arc<dyn HttpBackend>,
}

impl Transport {
    pub fn new(config: ApiConfig, backend: Arc<dyn HttpBackend>) -> Result<Self, TransportError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| TransportError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason: "url cannot be used as a base".to_string(),
            });
        }

        info!(
            "Transport ready: base={}, timeout={}ms, attempts={}, backend={}",
            base_url,
            config.timeout_ms,
            config.retry_count,
            backend.name()
        );

        Ok(Self {
            config,
            base_url,
            backend,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn url_for(&self, endpoint: &Endpoint) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(endpoint.segments.iter());
        }
        if !endpoint.query.is_empty() {
            url.query_pairs_mut().extend_pairs(endpoint.query.iter());
        }
        url
    }

    pub async fn get(&self, endpoint: &Endpoint) -> Result<Value, TransportError> {
        self.request(Method::GET, endpoint, None).await
    }

    pub async fn post(
        &self,
        endpoint: &Endpoint,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        self.request(Method::POST, endpoint, body).await
    }

    /// Issue one logical request with timeout and bounded retries
    pub async fn request(
        &self,
        method: Method,
        endpoint: &Endpoint,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        let request = HttpRequest {
            method,
            url: self.url_for(endpoint),
            body,
        };
        let max_attempts = self.config.retry_count.max(1);
        let mut attempt = 1u32;

        loop {
            debug!(
                method = %request.method,
                url = %request.url,
                attempt,
                max_attempts,
                "API request"
            );

            match self.attempt_once(&request).await {
                Ok(value) => {
                    info!(
                        method = %request.method,
                        url = %request.url,
                        attempt,
                        "API request succeeded"
                    );
                    return Ok(value);
                }
                Err(cause) => {
                    warn!(
                        method = %request.method,
                        url = %request.url,
                        attempt,
                        max_attempts,
                        error = %cause,
                        "API request failed"
                    );

                    if attempt >= max_attempts {
                        return Err(TransportError::Exhausted {
                            method: request.method.to_string(),
                            url: request.url.to_string(),
                            attempts: attempt,
                            cause,
                        });
                    }

                    sleep(self.config.backoff_after(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt_once(&self, request: &HttpRequest) -> Result<Value, AttemptFailure> {
        match timeout(self.config.timeout(), self.backend.send(request)).await {
            Ok(Ok(reply)) => interpret_reply(reply),
            Ok(Err(failure)) => Err(failure),
            Err(_) => Err(AttemptFailure::Timeout(self.config.timeout_ms)),
        }
    }
}

/// Non-2xx is a failure (with the body's `detail` when present); a 2xx body
/// must parse as JSON.
fn interpret_reply(reply: HttpReply) -> Result<Value, AttemptFailure> {
    if !(200..300).contains(&reply.status) {
        let detail = serde_json::from_str::<Value>(&reply.body)
            .ok()
            .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string));
        return Err(AttemptFailure::Status {
            status: reply.status,
            reason: detail.unwrap_or(reply.reason),
        });
    }

    serde_json::from_str(&reply.body).map_err(|e| AttemptFailure::Decode(e.to_string()))
}
