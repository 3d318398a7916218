// models.rs - Domain records held by the dashboard client

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core_types::{AdId, UserId};

/// Default interaction-count multiplier when the health probe has no figure
pub const DEFAULT_INTERACTIONS_PER_USER: u64 = 2;

/// Default average score when the health probe has no figure
pub const DEFAULT_AVG_SCORE: f64 = 0.75;

// ============================================================
// ADS & RECOMMENDATIONS
// ============================================================

/// An ad in the inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ad {
    pub ad_id: AdId,
    pub title: String,
    pub category: String,
    /// Always >= 0 (payloads with negative prices are rejected)
    pub bid_price: Decimal,
}

impl Ad {
    pub fn new(
        ad_id: impl Into<AdId>,
        title: impl Into<String>,
        category: impl Into<String>,
        bid_price: Decimal,
    ) -> Self {
        Self {
            ad_id: ad_id.into(),
            title: title.into(),
            category: category.into(),
            bid_price,
        }
    }
}

/// One ranked recommendation. Read-only projection, lives for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub ad_id: AdId,
    pub ad_info: Ad,
    /// In [0, 1]
    pub click_probability: f64,
    pub similarity: f64,
    pub combined_score: f64,
    pub from_collaborative_filtering: bool,
}

/// Recommendations together with the user they were computed for.
///
/// Order is the server's (descending `combined_score`); the client never
/// re-sorts.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationSet {
    pub user_id: UserId,
    pub items: Vec<Recommendation>,
}

impl RecommendationSet {
    pub fn new(user_id: impl Into<UserId>, items: Vec<Recommendation>) -> Self {
        Self {
            user_id: user_id.into(),
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ad_ids(&self) -> Vec<&str> {
        self.items.iter().map(|r| r.ad_id.as_str()).collect()
    }
}

// ============================================================
// PROFILE / ACK / HEALTH
// ============================================================

/// User profile. Every field is optional; absent ones render as "unknown".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub interests: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Acknowledgement of a recorded interaction (never carries recommendations)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionAck {
    pub message: Option<String>,
}

/// Best-effort figures from `GET /health`.
///
/// Each figure is read on its own: a malformed one becomes `None` without
/// discarding the others.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HealthReport {
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub interactions: Option<u64>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub avg_score: Option<f64>,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| v.as_str().map(str::to_string)))
}

/// Non-negative integers, or whole non-negative floats (`12.0`)
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| {
        v.as_u64().or_else(|| {
            v.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        })
    }))
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| v.as_f64()).filter(|f| f.is_finite()))
}

// ============================================================
// STATS
// ============================================================

/// Counts derived synchronously from session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatCounts {
    pub user_count: usize,
    pub ad_count: usize,
}

/// Figures shown on the stat cards
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardStats {
    pub user_count: usize,
    pub ad_count: usize,
    pub interactions: u64,
    pub avg_score: f64,
    /// True when `interactions`/`avg_score` came from the probe
    pub probed: bool,
}

impl DashboardStats {
    /// Combine session counts with an optional health report.
    ///
    /// Missing or zero probe figures fall back to `user_count * 2`
    /// interactions and a 0.75 average score.
    pub fn resolve(counts: StatCounts, probe: Option<&HealthReport>) -> Self {
        let interactions = probe
            .and_then(|h| h.interactions)
            .filter(|n| *n > 0)
            .unwrap_or(counts.user_count as u64 * DEFAULT_INTERACTIONS_PER_USER);
        let avg_score = probe
            .and_then(|h| h.avg_score)
            .filter(|s| *s > 0.0 && s.is_finite())
            .unwrap_or(DEFAULT_AVG_SCORE);

        Self {
            user_count: counts.user_count,
            ad_count: counts.ad_count,
            interactions,
            avg_score,
            probed: probe.is_some(),
        }
    }
}
