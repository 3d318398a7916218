//! Wire payloads of the recommendation service and their mapping into
//! domain records.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use super::error::FailureCause;
use crate::core_types::UserId;
use crate::models::{Ad, InteractionAck, Recommendation, UserProfile};

pub const STATUS_SUCCESS: &str = "success";

/// Fail with the body's `detail` (or `generic`) unless `status == "success"`
pub fn ensure_success(body: &Value, generic: &str) -> Result<(), FailureCause> {
    if body.get("status").and_then(Value::as_str) == Some(STATUS_SUCCESS) {
        return Ok(());
    }
    let message = body
        .get("detail")
        .and_then(Value::as_str)
        .filter(|d| !d.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| generic.to_string());
    Err(FailureCause::Application(message))
}

pub fn decode<T: DeserializeOwned>(body: Value) -> Result<T, FailureCause> {
    serde_json::from_value(body).map_err(|e| FailureCause::Decode(e.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct UsersPayload {
    pub users: Vec<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct AdsPayload {
    pub ads: Vec<Ad>,
}

/// `ad_info` as sent inside a recommendation: no id, extra targeting fields
/// are ignored
#[derive(Debug, Deserialize)]
pub struct WireAdInfo {
    pub title: String,
    pub category: String,
    pub bid_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct WireRecommendation {
    pub ad_id: String,
    pub ad_info: WireAdInfo,
    pub click_probability: f64,
    pub similarity: f64,
    pub combined_score: f64,
    #[serde(default)]
    pub from_collaborative_filtering: bool,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationsPayload {
    #[serde(default)]
    pub recommendations: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ProfilePayload {
    #[serde(default)]
    pub profile: Option<UserProfile>,
}

#[derive(Debug, Deserialize)]
pub struct InteractionPayload {
    #[serde(default)]
    pub message: Option<String>,
}

pub fn map_users(payload: UsersPayload) -> Vec<UserId> {
    let total = payload.users.len();
    let users: Vec<UserId> = payload
        .users
        .into_iter()
        .filter(|u| !u.trim().is_empty())
        .collect();
    if users.len() != total {
        warn!("Dropped {} empty user id(s) from /users", total - users.len());
    }
    users
}

pub fn map_ads(payload: AdsPayload) -> Result<Vec<Ad>, FailureCause> {
    if let Some(ad) = payload.ads.iter().find(|a| a.bid_price < Decimal::ZERO) {
        return Err(FailureCause::Decode(format!(
            "ad {} has negative bid_price {}",
            ad.ad_id, ad.bid_price
        )));
    }
    Ok(payload.ads)
}

/// Keep server order. An item of the form `{"error": "..."}` (unknown user)
/// turns the whole reply into an application failure.
pub fn map_recommendations(payload: RecommendationsPayload) -> Result<Vec<Recommendation>, FailureCause> {
    let mut items = Vec::with_capacity(payload.recommendations.len());

    for raw in payload.recommendations {
        if let Some(message) = raw.get("error").and_then(Value::as_str) {
            return Err(FailureCause::Application(message.to_string()));
        }

        let wire: WireRecommendation = decode(raw)?;
        items.push(Recommendation {
            ad_info: Ad {
                ad_id: wire.ad_id.clone(),
                title: wire.ad_info.title,
                category: wire.ad_info.category,
                bid_price: wire.ad_info.bid_price,
            },
            ad_id: wire.ad_id,
            click_probability: wire.click_probability.clamp(0.0, 1.0),
            similarity: wire.similarity,
            combined_score: wire.combined_score,
            from_collaborative_filtering: wire.from_collaborative_filtering,
        });
    }

    Ok(items)
}

pub fn map_profile(payload: ProfilePayload) -> UserProfile {
    payload.profile.unwrap_or_default()
}

pub fn map_ack(payload: InteractionPayload) -> InteractionAck {
    InteractionAck {
        message: payload.message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ensure_success_accepts_success() {
        assert!(ensure_success(&json!({"status": "success"}), "generic").is_ok());
    }

    #[test]
    fn test_ensure_success_uses_detail() {
        let err = ensure_success(&json!({"status": "error", "detail": "db down"}), "generic")
            .unwrap_err();
        assert_eq!(err, FailureCause::Application("db down".into()));
    }

    #[test]
    fn test_ensure_success_generic_message_when_detail_absent() {
        let err = ensure_success(&json!({"status": "degraded"}), "Failed to load ads").unwrap_err();
        assert_eq!(err, FailureCause::Application("Failed to load ads".into()));

        let err = ensure_success(&json!([1, 2, 3]), "Failed to load ads").unwrap_err();
        assert_eq!(err, FailureCause::Application("Failed to load ads".into()));
    }

    #[test]
    fn test_map_recommendations_fills_ad_id_and_keeps_order() {
        let payload: RecommendationsPayload = decode(json!({
            "recommendations": [
                {
                    "ad_id": "ad_3",
                    "ad_info": {"title": "Trip", "category": "travel", "bid_price": 3.2,
                                "keywords": ["travel"], "target_age": [25, 50]},
                    "click_probability": 0.8, "similarity": 0.7, "combined_score": 0.56,
                    "from_collaborative_filtering": true
                },
                {
                    "ad_id": "ad_1",
                    "ad_info": {"title": "Phone", "category": "electronics", "bid_price": 2.5},
                    "click_probability": 1.4, "similarity": 0.2, "combined_score": 0.9
                }
            ]
        }))
        .unwrap();

        let recs = map_recommendations(payload).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].ad_id, "ad_3");
        assert_eq!(recs[0].ad_info.ad_id, "ad_3");
        assert!(recs[0].from_collaborative_filtering);
        // server order kept even though scores are not descending here
        assert_eq!(recs[1].ad_id, "ad_1");
        assert_eq!(recs[1].click_probability, 1.0);
        assert!(!recs[1].from_collaborative_filtering);
    }

    #[test]
    fn test_map_recommendations_error_item() {
        let payload: RecommendationsPayload =
            decode(json!({"recommendations": [{"error": "user ghost does not exist"}]})).unwrap();
        let err = map_recommendations(payload).unwrap_err();
        assert_eq!(
            err,
            FailureCause::Application("user ghost does not exist".into())
        );
    }

    #[test]
    fn test_map_ads_rejects_negative_price() {
        let payload: AdsPayload = decode(json!({"ads": [
            {"ad_id": "ad_1", "title": "A", "category": "c", "bid_price": -1.0}
        ]}))
        .unwrap();
        assert!(matches!(map_ads(payload), Err(FailureCause::Decode(_))));
    }

    #[test]
    fn test_map_users_drops_blank_ids() {
        let users = map_users(UsersPayload {
            users: vec!["u1".into(), " ".into(), "u2".into()],
        });
        assert_eq!(users, vec!["u1".to_string(), "u2".to_string()]);
    }

    #[test]
    fn test_map_profile_missing() {
        let payload: ProfilePayload = decode(json!({"status": "success"})).unwrap();
        assert_eq!(map_profile(payload), UserProfile::default());
    }
}
