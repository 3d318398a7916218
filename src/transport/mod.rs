//! Transport Module
//!
//! Issues one logical HTTP request with a per-attempt timeout and a bounded,
//! linearly backed-off retry budget. Network failures, timeouts, non-2xx
//! statuses and unparseable bodies are all retried; application-level
//! failure markers inside a 2xx body are not.

pub mod backend;
pub mod client;
pub mod error;
#[cfg(any(test, feature = "mock-api"))]
pub mod mock;

pub use backend::{HttpBackend, HttpReply, HttpRequest, ReqwestBackend};
pub use client::{Endpoint, Transport};
pub use error::{AttemptFailure, TransportError};
