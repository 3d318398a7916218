//! Domain Repository
//!
//! Typed operations over the recommendation service: users, ads,
//! recommendations, profiles, interactions and the health probe. Maps wire
//! payloads into domain records and applies the users/ads fallback policy.

pub mod api;
pub mod error;
pub mod wire;

pub use api::DashboardRepository;
pub use error::{FailureCause, RepositoryError};
