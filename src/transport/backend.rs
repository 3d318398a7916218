use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde_json::Value;
use std::time::Duration;

use super::error::AttemptFailure;

/// One HTTP exchange as seen by the retry loop
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<Value>,
}

/// Raw reply; status is not interpreted here
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

/// Pluggable HTTP engine underneath `Transport`.
///
/// Implementations perform exactly one attempt and must not retry; the
/// per-attempt timeout is enforced by the caller.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    async fn send(&self, request: &HttpRequest) -> Result<HttpReply, AttemptFailure>;
}

/// Production backend on top of `reqwest`
pub struct ReqwestBackend {
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(connect_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    fn name(&self) -> &'static str {
        "reqwest"
    }

    async fn send(&self, request: &HttpRequest) -> Result<HttpReply, AttemptFailure> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AttemptFailure::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AttemptFailure::Network(format!("failed to read body: {}", e)))?;

        Ok(HttpReply {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            body,
        })
    }
}
