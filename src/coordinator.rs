//! Interaction-Refresh Coordinator
//!
//! The one place where a write (recording an interaction) feeds back into a
//! read (re-fetching recommendations). Per submission:
//!
//! ```text
//! Submit ──fail──▶ error, state untouched
//!    │ ack
//!    ▼
//! ┌─ refresh stats (derive counts + health probe)
//! └─ user == current_user (at ack) ──▶ re-fetch ──ok──▶ replace set
//!                                              └─fail─▶ keep stale set, report
//! ```
//!
//! The two branches run concurrently, so a slow `/health` never delays the
//! recommendation refresh.
//!
//! Submissions are independent (no dedup). A refresh racing a manual fetch
//! for the same user resolves as last-write-wins.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core_types::{InteractionAction, TopK};
use crate::models::{DashboardStats, InteractionAck, RecommendationSet};
use crate::repository::{DashboardRepository, RepositoryError};

/// What happened to the recommendation set after an acknowledged interaction
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Interacting user is not the selected one; nothing refreshed
    NotCurrentUser,
    /// New set fetched and stored
    Refreshed(RecommendationSet),
    /// Selection moved to another user while the refresh was in flight;
    /// result dropped
    Superseded,
    /// Re-fetch failed; the previous (stale) set is still stored
    Failed(RepositoryError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionOutcome {
    pub ack: InteractionAck,
    pub stats: DashboardStats,
    pub refresh: RefreshOutcome,
}

pub struct InteractionCoordinator {
    repo: Arc<DashboardRepository>,
    top_k: TopK,
}

impl InteractionCoordinator {
    pub fn new(repo: Arc<DashboardRepository>, top_k: TopK) -> Self {
        Self { repo, top_k }
    }

    pub fn top_k(&self) -> TopK {
        self.top_k
    }

    /// Counts from session state plus the best-effort health probe
    pub async fn refresh_stats(&self) -> DashboardStats {
        let counts = self.repo.session().derive_stats();
        let probe = match self.repo.probe_health().await {
            Ok(report) => Some(report),
            Err(e) => {
                debug!("Health probe unavailable, using default stats: {}", e);
                None
            }
        };
        let stats = DashboardStats::resolve(counts, probe.as_ref());
        debug!(
            users = stats.user_count,
            ads = stats.ad_count,
            interactions = stats.interactions,
            avg_score = stats.avg_score,
            "Stats refreshed"
        );
        stats
    }

    /// Record an interaction and bring dependent state up to date.
    ///
    /// `settle` is waited before the recommendation re-fetch (zero for none).
    /// Errors only when the interaction itself was not recorded.
    pub async fn submit(
        &self,
        user_id: &str,
        ad_id: &str,
        action: InteractionAction,
        settle: Duration,
    ) -> Result<InteractionOutcome, RepositoryError> {
        let ack = self.repo.record_interaction(user_id, ad_id, action).await?;

        // Selection is judged at ack time; a slow /health must not hold up the re-fetch
        let is_current = self.repo.session().snapshot().is_current_user(user_id);
        let refresh = async {
            if !is_current {
                debug!(user = user_id, "Interaction user is not selected, skipping refresh");
                return RefreshOutcome::NotCurrentUser;
            }
            if !settle.is_zero() {
                tokio::time::sleep(settle).await;
            }
            self.refresh_recommendations(user_id).await
        };
        let (stats, refresh) = tokio::join!(self.refresh_stats(), refresh);

        Ok(InteractionOutcome {
            ack,
            stats,
            refresh,
        })
    }

    async fn refresh_recommendations(&self, user_id: &str) -> RefreshOutcome {
        let session = self.repo.session();
        match self.repo.fetch_recommendations(user_id, self.top_k).await {
            Ok(set) => {
                if !session.snapshot().is_current_user(user_id) {
                    info!(user = user_id, "Selection changed during refresh, dropping result");
                    return RefreshOutcome::Superseded;
                }
                info!(user = user_id, count = set.len(), "Recommendations refreshed after interaction");
                session.set_recommendations(Some(set.clone()));
                RefreshOutcome::Refreshed(set)
            }
            Err(e) => {
                warn!(user = user_id, "Keeping stale recommendations: {}", e);
                RefreshOutcome::Failed(e)
            }
        }
    }
}
