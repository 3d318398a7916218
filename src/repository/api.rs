//! Dashboard Repository
//!
//! Typed facade over `Transport`, one method per server capability.
//! `fetch_users` / `fetch_ads` also own the session write: live data on
//! success, the configured placeholder on failure (written before the error
//! is returned). Recommendations are never substituted.

use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::error::{FailureCause, RepositoryError};
use super::wire::{
    self, AdsPayload, InteractionPayload, ProfilePayload, RecommendationsPayload, UsersPayload,
};
use crate::config::FallbackConfig;
use crate::core_types::{InteractionAction, TopK, UserId};
use crate::models::{
    Ad, HealthReport, InteractionAck, Recommendation, RecommendationSet, UserProfile,
};
use crate::session::{Dataset, SessionStore};
use crate::transport::{Endpoint, Transport};

const MSG_USERS: &str = "Failed to load users";
const MSG_ADS: &str = "Failed to load ads";
const MSG_RECOMMEND: &str = "Failed to get recommendations";
const MSG_PROFILE: &str = "Failed to get user profile";
const MSG_INTERACTION: &str = "Failed to record interaction";

fn require_id(field: &str, value: &str) -> Result<(), FailureCause> {
    if value.trim().is_empty() {
        return Err(FailureCause::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

pub struct DashboardRepository {
    transport: Transport,
    session: Arc<SessionStore>,
    fallback: FallbackConfig,
}

impl DashboardRepository {
    pub fn new(transport: Transport, session: Arc<SessionStore>, fallback: FallbackConfig) -> Self {
        Self {
            transport,
            session,
            fallback,
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn fallback(&self) -> &FallbackConfig {
        &self.fallback
    }

    /// GET an endpoint and require `status == "success"`
    async fn get_success(&self, endpoint: &Endpoint, generic: &str) -> Result<Value, FailureCause> {
        let body = self.transport.get(endpoint).await?;
        wire::ensure_success(&body, generic)?;
        Ok(body)
    }

    // ------------------------------------------------------------------
    // Users / Ads (with fallback)
    // ------------------------------------------------------------------

    pub async fn fetch_users(&self) -> Result<Vec<UserId>, RepositoryError> {
        match self.try_users().await {
            Ok(users) => {
                info!("Loaded {} users", users.len());
                self.session.set_users(Dataset::live(users.clone()));
                Ok(users)
            }
            Err(cause) => {
                error!(
                    error = %cause,
                    "User load failed, writing {} placeholder users",
                    self.fallback.users.len()
                );
                self.session
                    .set_users(Dataset::fallback(self.fallback.users.clone()));
                Err(RepositoryError::UserFetch(cause))
            }
        }
    }

    pub async fn fetch_ads(&self) -> Result<Vec<Ad>, RepositoryError> {
        match self.try_ads().await {
            Ok(ads) => {
                info!("Loaded {} ads", ads.len());
                self.session.set_ads(Dataset::live(ads.clone()));
                Ok(ads)
            }
            Err(cause) => {
                error!(
                    error = %cause,
                    "Ad load failed, writing {} placeholder ads",
                    self.fallback.ads.len()
                );
                self.session.set_ads(Dataset::fallback(self.fallback.ads.clone()));
                Err(RepositoryError::AdFetch(cause))
            }
        }
    }

    async fn try_users(&self) -> Result<Vec<UserId>, FailureCause> {
        let body = self.get_success(&Endpoint::new(["users"]), MSG_USERS).await?;
        Ok(wire::map_users(wire::decode::<UsersPayload>(body)?))
    }

    async fn try_ads(&self) -> Result<Vec<Ad>, FailureCause> {
        let body = self.get_success(&Endpoint::new(["ads"]), MSG_ADS).await?;
        wire::map_ads(wire::decode::<AdsPayload>(body)?)
    }

    // ------------------------------------------------------------------
    // Per-user reads
    // ------------------------------------------------------------------

    /// Recommendations in server order. Does not touch session state.
    pub async fn fetch_recommendations(
        &self,
        user_id: &str,
        top_k: TopK,
    ) -> Result<RecommendationSet, RepositoryError> {
        match self.try_recommendations(user_id, top_k).await {
            Ok(items) => {
                info!(user = user_id, count = items.len(), "Fetched recommendations");
                Ok(RecommendationSet::new(user_id, items))
            }
            Err(cause) => {
                warn!(user = user_id, error = %cause, "Recommendation fetch failed");
                Err(RepositoryError::RecommendationFetch(cause))
            }
        }
    }

    async fn try_recommendations(
        &self,
        user_id: &str,
        top_k: TopK,
    ) -> Result<Vec<Recommendation>, FailureCause> {
        require_id("user id", user_id)?;
        let endpoint = Endpoint::new(["recommend", user_id]).query("top_k", top_k);
        let body = self.get_success(&endpoint, MSG_RECOMMEND).await?;
        wire::map_recommendations(wire::decode::<RecommendationsPayload>(body)?)
    }

    pub async fn fetch_user_profile(&self, user_id: &str) -> Result<UserProfile, RepositoryError> {
        self.try_profile(user_id)
            .await
            .map_err(RepositoryError::ProfileFetch)
    }

    async fn try_profile(&self, user_id: &str) -> Result<UserProfile, FailureCause> {
        require_id("user id", user_id)?;
        let endpoint = Endpoint::new(["user", user_id, "profile"]);
        let body = self.get_success(&endpoint, MSG_PROFILE).await?;
        Ok(wire::map_profile(wire::decode::<ProfilePayload>(body)?))
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// The ack never carries refreshed recommendations
    pub async fn record_interaction(
        &self,
        user_id: &str,
        ad_id: &str,
        action: InteractionAction,
    ) -> Result<InteractionAck, RepositoryError> {
        match self.try_interaction(user_id, ad_id, action).await {
            Ok(ack) => {
                info!(user = user_id, ad = ad_id, action = %action, "Interaction recorded");
                Ok(ack)
            }
            Err(cause) => {
                warn!(
                    user = user_id,
                    ad = ad_id,
                    action = %action,
                    error = %cause,
                    "Interaction failed"
                );
                Err(RepositoryError::Interaction(cause))
            }
        }
    }

    async fn try_interaction(
        &self,
        user_id: &str,
        ad_id: &str,
        action: InteractionAction,
    ) -> Result<InteractionAck, FailureCause> {
        require_id("user id", user_id)?;
        require_id("ad id", ad_id)?;
        let endpoint = Endpoint::new(["interaction", user_id, ad_id, action.as_str()]);
        let body = self.transport.post(&endpoint, None).await?;
        wire::ensure_success(&body, MSG_INTERACTION)?;
        Ok(wire::map_ack(wire::decode::<InteractionPayload>(body)?))
    }

    /// Best-effort `/health` read; no `status` check since the health
    /// endpoint reports "healthy"/"degraded" rather than "success"
    pub async fn probe_health(&self) -> Result<HealthReport, RepositoryError> {
        let body = self
            .transport
            .get(&Endpoint::new(["health"]))
            .await
            .map_err(|e| RepositoryError::HealthProbe(e.into()))?;
        wire::decode::<HealthReport>(body).map_err(RepositoryError::HealthProbe)
    }
}
