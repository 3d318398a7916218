//! Presentation seam
//!
//! The dashboard pushes everything it wants shown through `DashboardView`.
//! Implementations use interior mutability so one view can be shared behind
//! an `Arc` by concurrent commands.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::core_types::UserId;
use crate::models::{Ad, DashboardStats, RecommendationSet, UserProfile};
use crate::session::Dataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Error,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transient operator notification
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }
}

pub trait DashboardView: Send + Sync {
    /// Raised while any network-backed command is running
    fn set_busy(&self, busy: bool);

    fn notify(&self, notice: Notice);

    fn render_stats(&self, stats: &DashboardStats);

    fn render_user_selector(&self, users: &[UserId], selected: Option<&str>);

    /// `None` renders the "select a user" empty state
    fn render_recommendations(&self, recommendations: Option<&RecommendationSet>);

    fn render_management(&self, users: &Dataset<UserId>, ads: &Dataset<Ad>);

    fn render_profile(&self, user_id: &str, profile: &UserProfile);
}
