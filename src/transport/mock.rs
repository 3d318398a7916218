//! Scripted HTTP backend for tests
//!
//! Replies are queued per `METHOD /path` (query string ignored). Once a
//! route's queue is drained its `always` reply is used, and unknown routes
//! answer 404.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use super::backend::{HttpBackend, HttpReply, HttpRequest};
use super::error::AttemptFailure;

#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Reply { status: u16, body: String },
    Fail(AttemptFailure),
    /// Never completes; only the transport timeout ends it
    Hang,
    /// `reply` after waiting `after`
    Delayed {
        after: Duration,
        reply: Box<ScriptedReply>,
    },
}

impl ScriptedReply {
    pub fn ok(body: Value) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: Value) -> Self {
        ScriptedReply::Reply {
            status,
            body: body.to_string(),
        }
    }

    pub fn raw(status: u16, body: &str) -> Self {
        ScriptedReply::Reply {
            status,
            body: body.to_string(),
        }
    }

    pub fn network(msg: &str) -> Self {
        ScriptedReply::Fail(AttemptFailure::Network(msg.to_string()))
    }

    pub fn delayed(self, after: Duration) -> Self {
        ScriptedReply::Delayed {
            after,
            reply: Box::new(self),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
pub struct ScriptedBackend {
    queued: Mutex<HashMap<String, VecDeque<ScriptedReply>>>,
    sticky: Mutex<HashMap<String, ScriptedReply>>,
    log: Mutex<Vec<RecordedRequest>>,
}

fn route_key(method: &str, path: &str) -> String {
    format!("{} {}", method.to_uppercase(), path)
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-shot reply
    pub fn push(&self, method: &str, path: &str, reply: ScriptedReply) {
        self.queued
            .lock()
            .unwrap()
            .entry(route_key(method, path))
            .or_default()
            .push_back(reply);
    }

    /// Reply used whenever the route's queue is empty
    pub fn always(&self, method: &str, path: &str, reply: ScriptedReply) {
        self.sticky
            .lock()
            .unwrap()
            .insert(route_key(method, path), reply);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        let method = method.to_uppercase();
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    fn next_reply(&self, key: &str) -> ScriptedReply {
        if let Some(reply) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(key)
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }
        self.sticky
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_else(|| ScriptedReply::status(404, json!({"detail": "Not Found"})))
    }
}

#[async_trait]
impl HttpBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn send(&self, request: &HttpRequest) -> Result<HttpReply, AttemptFailure> {
        let path = request.url.path().to_string();
        let key = route_key(request.method.as_str(), &path);
        self.log.lock().unwrap().push(RecordedRequest {
            method: request.method.to_string(),
            path,
            query: request.url.query().map(str::to_string),
            body: request.body.clone(),
        });

        let mut reply = self.next_reply(&key);
        loop {
            match reply {
                ScriptedReply::Reply { status, body } => {
                    return Ok(HttpReply {
                        status,
                        reason: reqwest::StatusCode::from_u16(status)
                            .ok()
                            .and_then(|s| s.canonical_reason())
                            .unwrap_or("")
                            .to_string(),
                        body,
                    });
                }
                ScriptedReply::Fail(failure) => return Err(failure),
                ScriptedReply::Hang => return std::future::pending().await,
                ScriptedReply::Delayed { after, reply: next } => {
                    tokio::time::sleep(after).await;
                    reply = *next;
                }
            }
        }
    }
}
