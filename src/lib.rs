//! AdPulse - Ad-Recommendation Dashboard Client
//!
//! Client side of the recommendation dashboard: resilient API access,
//! page-lifetime session state and the refresh that follows a recorded
//! interaction.
//!
//! # Modules
//!
//! - [`core_types`] - Identifier aliases and `InteractionAction`
//! - [`models`] - Ads, recommendations, profiles, stats
//! - [`config`] - YAML configuration (`config/{env}.yaml`)
//! - [`logging`] - tracing subscriber setup
//! - [`transport`] - Timeout + retry + linear backoff over an `HttpBackend`
//! - [`repository`] - Typed API facade with the users/ads fallback policy
//! - [`session`] - Snapshot-swapping session store
//! - [`coordinator`] - Interaction submit + dependent refresh
//! - [`dashboard`] - Commands, dispatch and views
//!
//! ```text
//! Command ─▶ Dashboard ─▶ Coordinator ─▶ Repository ─▶ Transport ─▶ HttpBackend
//!               │                            │
//!               ▼                            ▼
//!         DashboardView               SessionStore
//! ```

// Core types - must be first!
pub mod core_types;

pub mod config;
pub mod logging;
pub mod models;

// Service access
pub mod repository;
pub mod transport;

// State and orchestration
pub mod coordinator;
pub mod dashboard;
pub mod session;

// Convenient re-exports at crate root
pub use config::{ApiConfig, ClientConfig, ConfigError, DashboardConfig, FallbackConfig};
pub use coordinator::{InteractionCoordinator, InteractionOutcome, RefreshOutcome};
pub use core_types::{AdId, InteractionAction, TopK, UserId};
pub use dashboard::{Command, ConsoleView, Dashboard, DashboardView, Notice, Severity};
pub use models::{
    Ad, DashboardStats, HealthReport, InteractionAck, Recommendation, RecommendationSet,
    StatCounts, UserProfile,
};
pub use repository::{DashboardRepository, FailureCause, RepositoryError};
pub use session::{Dataset, Provenance, SessionSnapshot, SessionStore};
pub use transport::{
    AttemptFailure, Endpoint, HttpBackend, ReqwestBackend, Transport, TransportError,
};
