//! Session State
//!
//! Page-lifetime record of what the dashboard last fetched plus the operator's
//! user selection. The store holds one immutable `SessionSnapshot` behind a
//! lock; every setter builds a new snapshot with exactly one field replaced
//! and swaps it in. There is no field-level mutation and no merge.
//!
//! Operations are not serialized against each other: two overlapping writers
//! (e.g. a manual recommendation fetch and an interaction-triggered refresh)
//! resolve as last-write-wins.

use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::core_types::UserId;
use crate::models::{Ad, RecommendationSet, StatCounts};

/// Where a dataset came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Returned by the server (may legitimately be empty)
    Live,
    /// Placeholder written after a fetch exhausted its retries
    Fallback,
}

/// A list that is always replaced as a whole
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset<T> {
    pub items: Vec<T>,
    pub provenance: Provenance,
}

impl<T> Dataset<T> {
    pub fn live(items: Vec<T>) -> Self {
        Self {
            items,
            provenance: Provenance::Live,
        }
    }

    pub fn fallback(items: Vec<T>) -> Self {
        Self {
            items,
            provenance: Provenance::Fallback,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.provenance == Provenance::Fallback
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for Dataset<T> {
    fn default() -> Self {
        Self::live(Vec::new())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub users: Dataset<UserId>,
    pub ads: Dataset<Ad>,
    pub recommendations: Option<RecommendationSet>,
    pub current_user: Option<UserId>,
}

impl SessionSnapshot {
    /// Recommendations only when they belong to the selected user
    pub fn current_recommendations(&self) -> Option<&RecommendationSet> {
        match (&self.recommendations, &self.current_user) {
            (Some(set), Some(user)) if &set.user_id == user => Some(set),
            _ => None,
        }
    }

    pub fn is_current_user(&self, user_id: &str) -> bool {
        self.current_user.as_deref() == Some(user_id)
    }

    pub fn counts(&self) -> StatCounts {
        StatCounts {
            user_count: self.users.len(),
            ad_count: self.ads.len(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionStore {
    inner: RwLock<Arc<SessionSnapshot>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cheap handle to the current snapshot
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    fn replace<F>(&self, f: F)
    where
        F: FnOnce(&mut SessionSnapshot),
    {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let mut next = SessionSnapshot::clone(&**guard);
        f(&mut next);
        *guard = Arc::new(next);
    }

    pub fn set_users(&self, users: Dataset<UserId>) {
        debug!(
            count = users.len(),
            degraded = users.is_degraded(),
            "session: users replaced"
        );
        self.replace(|s| s.users = users);
    }

    pub fn set_ads(&self, ads: Dataset<Ad>) {
        debug!(
            count = ads.len(),
            degraded = ads.is_degraded(),
            "session: ads replaced"
        );
        self.replace(|s| s.ads = ads);
    }

    pub fn set_recommendations(&self, recommendations: Option<RecommendationSet>) {
        debug!(
            user = recommendations.as_ref().map(|r| r.user_id.as_str()),
            count = recommendations.as_ref().map_or(0, RecommendationSet::len),
            "session: recommendations replaced"
        );
        self.replace(|s| s.recommendations = recommendations);
    }

    /// Select a user. Switching to a different user drops recommendations
    /// that belong to someone else.
    pub fn set_current_user(&self, user: Option<UserId>) {
        debug!(user = user.as_deref(), "session: current user changed");
        self.replace(|s| {
            let owned_by_new = matches!(
                (&s.recommendations, &user),
                (Some(set), Some(u)) if &set.user_id == u
            );
            if !owned_by_new {
                s.recommendations = None;
            }
            s.current_user = user;
        });
    }

    pub fn current_user(&self) -> Option<UserId> {
        self.snapshot().current_user.clone()
    }

    /// User/ad counts, computed from the current snapshot without I/O
    pub fn derive_stats(&self) -> StatCounts {
        self.snapshot().counts()
    }
}
