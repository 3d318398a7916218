//! End-to-end dashboard flows over the scripted backend
#![cfg(feature = "mock-api")]

use std::sync::Arc;
use std::time::Duration;

use adpulse::dashboard::recording::{RecordingView, ViewEvent};
use adpulse::transport::mock::{ScriptedBackend, ScriptedReply};
use adpulse::{
    ApiConfig, Command, Dashboard, DashboardConfig, DashboardRepository, FailureCause,
    FallbackConfig, InteractionAction, InteractionCoordinator, RefreshOutcome, RepositoryError,
    SessionStore, Severity, Transport,
};
use serde_json::{Value, json};

struct Harness {
    backend: Arc<ScriptedBackend>,
    view: Arc<RecordingView>,
    dashboard: Dashboard,
}

fn harness_with(api: ApiConfig, dashboard: DashboardConfig) -> Harness {
    let backend = Arc::new(ScriptedBackend::new());
    let transport = Transport::new(api, backend.clone()).unwrap();
    let repo = DashboardRepository::new(
        transport,
        Arc::new(SessionStore::new()),
        FallbackConfig::default(),
    );
    let view = Arc::new(RecordingView::new());
    let dashboard = Dashboard::new(Arc::new(repo), view.clone(), dashboard);
    Harness {
        backend,
        view,
        dashboard,
    }
}

fn harness() -> Harness {
    harness_with(ApiConfig::default(), DashboardConfig::default())
}

fn rec(ad_id: &str, score: f64, cf: bool) -> Value {
    json!({
        "ad_id": ad_id,
        "ad_info": {
            "title": format!("Title {}", ad_id),
            "category": "electronics",
            "bid_price": 1.5,
            "keywords": ["tech"]
        },
        "click_probability": 0.25,
        "similarity": 0.4,
        "combined_score": score,
        "from_collaborative_filtering": cf
    })
}

fn recs(items: Vec<Value>) -> ScriptedReply {
    ScriptedReply::ok(json!({"status": "success", "user_id": "u1", "recommendations": items}))
}

fn ok() -> ScriptedReply {
    ScriptedReply::ok(json!({"status": "success", "message": "Interaction recorded"}))
}

#[tokio::test(start_paused = true)]
async fn test_users_ok_ads_down_gives_placeholder_catalog() {
    let h = harness();
    h.backend.push("GET", "/users", ScriptedReply::ok(json!({"status": "success", "users": ["u1", "u2"]})));
    h.backend.always("GET", "/ads", ScriptedReply::Hang);
    h.backend.always("GET", "/health", ScriptedReply::network("refused"));

    let start = tokio::time::Instant::now();
    let err = h.dashboard.dispatch(Command::Initialize).await.unwrap_err();

    assert!(matches!(err, RepositoryError::AdFetch(FailureCause::Transport(_))));
    // 3 x 10s timeouts + 1s + 2s backoff for ads, then 1s + 2s for the health probe
    assert_eq!(start.elapsed(), Duration::from_secs(36));

    let counts = h.dashboard.session().derive_stats();
    assert_eq!((counts.user_count, counts.ad_count), (2, 3));
    let errors = h.view.notices_of(Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("Failed to load ads"));

    let stats = h.view.last_stats().unwrap();
    assert_eq!(stats.interactions, 4);
    assert_eq!(stats.avg_score, 0.75);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_recover_within_budget() {
    let h = harness();
    h.backend.push("GET", "/users", ScriptedReply::network("reset"));
    h.backend.push("GET", "/users", ScriptedReply::status(502, json!({"detail": "bad gateway"})));
    h.backend.push("GET", "/users", ScriptedReply::ok(json!({"status": "success", "users": ["a"]})));
    h.backend.push("GET", "/ads", ScriptedReply::ok(json!({"status": "success", "ads": []})));
    h.backend.push("GET", "/health", ScriptedReply::ok(json!({"status": "healthy"})));

    let start = tokio::time::Instant::now();
    h.dashboard.dispatch(Command::Initialize).await.unwrap();

    assert_eq!(start.elapsed(), Duration::from_millis(3000));
    let snap = h.dashboard.session().snapshot();
    assert_eq!(snap.users.items, vec!["a".to_string()]);
    assert!(!snap.users.is_degraded());
    assert!(!snap.ads.is_degraded());
    assert!(h.view.notices_of(Severity::Error).is_empty());
}

#[tokio::test]
async fn test_six_recommendations_keep_server_order() {
    let h = harness();
    let order = ["ad_4", "ad_1", "ad_6", "ad_2", "ad_5", "ad_3"];
    let items = order
        .iter()
        .enumerate()
        .map(|(i, id)| rec(id, 0.9 - i as f64 * 0.1, i % 2 == 0))
        .collect();
    h.backend.push("GET", "/recommend/u1", recs(items));

    h.dashboard
        .dispatch(Command::ShowUserRecommendations("u1".into()))
        .await
        .unwrap();

    let rendered = h.view.last_recommendations().unwrap().unwrap();
    assert_eq!(rendered.ad_ids(), order.to_vec());
    assert!(rendered.items[0].from_collaborative_filtering);
    assert_eq!(rendered.items[0].ad_info.ad_id, "ad_4");
    let text = adpulse::dashboard::console::format_recommendations(Some(&rendered));
    assert_eq!(text.lines().count(), 7);
}

#[tokio::test(start_paused = true)]
async fn test_interaction_for_selected_user_triggers_one_refresh() {
    let h = harness();
    h.backend.push("GET", "/recommend/u1", recs(vec![rec("ad_1", 0.9, false), rec("ad_2", 0.8, false)]));
    h.backend.push("POST", "/interaction/u1/ad_1/click", ok());
    h.backend.push("GET", "/recommend/u1", recs(vec![rec("ad_2", 0.95, true)]));

    h.dashboard
        .dispatch(Command::ShowUserRecommendations("u1".into()))
        .await
        .unwrap();
    h.dashboard
        .dispatch(Command::RecordInteraction {
            user_id: "u1".into(),
            ad_id: "ad_1".into(),
            action: InteractionAction::Click,
        })
        .await
        .unwrap();

    assert_eq!(h.backend.count("GET", "/recommend/u1"), 2);
    let stored = h.dashboard.session().snapshot();
    assert_eq!(stored.current_recommendations().unwrap().ad_ids(), vec!["ad_2"]);
}

#[tokio::test(start_paused = true)]
async fn test_interaction_for_other_user_keeps_display() {
    let h = harness();
    h.backend.push("GET", "/recommend/u1", recs(vec![rec("ad_1", 0.9, false)]));
    h.backend.push("POST", "/interaction/u2/ad_1/view", ok());

    h.dashboard
        .dispatch(Command::ShowUserRecommendations("u1".into()))
        .await
        .unwrap();
    let before = h.dashboard.session().snapshot();
    h.view.clear();

    h.dashboard
        .dispatch(Command::RecordInteraction {
            user_id: "u2".into(),
            ad_id: "ad_1".into(),
            action: InteractionAction::View,
        })
        .await
        .unwrap();

    assert_eq!(
        h.dashboard.session().snapshot().recommendations,
        before.recommendations
    );
    assert_eq!(h.backend.count("GET", "/recommend/u2"), 0);
    assert!(h.view.last_recommendations().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_refresh_failure_after_ack_keeps_stale_and_reports() {
    let h = harness();
    h.backend.push("GET", "/recommend/u1", recs(vec![rec("ad_1", 0.9, false)]));
    h.backend.push("POST", "/interaction/u1/ad_1/purchase", ok());
    h.backend.always("GET", "/recommend/u1", ScriptedReply::raw(200, "<html>oops</html>"));

    h.dashboard
        .dispatch(Command::ShowUserRecommendations("u1".into()))
        .await
        .unwrap();
    h.view.clear();

    h.dashboard
        .dispatch(Command::RecordInteraction {
            user_id: "u1".into(),
            ad_id: "ad_1".into(),
            action: InteractionAction::Purchase,
        })
        .await
        .unwrap();

    // first fetch + 3 refresh attempts
    assert_eq!(h.backend.count("GET", "/recommend/u1"), 4);
    assert_eq!(
        h.dashboard.session().snapshot().current_recommendations().unwrap().ad_ids(),
        vec!["ad_1"]
    );
    assert_eq!(h.view.notices_of(Severity::Success).len(), 1);
    let errors = h.view.notices_of(Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.starts_with("Failed to get recommendations"));
}

#[tokio::test]
async fn test_unknown_user_error_item_is_not_rendered_as_recommendation() {
    let h = harness();
    h.backend.push(
        "GET",
        "/recommend/ghost",
        ScriptedReply::ok(json!({"status": "success", "recommendations": [{"error": "User ghost not found"}]})),
    );

    let err = h
        .dashboard
        .dispatch(Command::ShowUserRecommendations("ghost".into()))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        RepositoryError::RecommendationFetch(FailureCause::Application("User ghost not found".into()))
    );
    assert!(h.dashboard.session().snapshot().recommendations.is_none());
    // only the selection-change render, never a populated one
    assert_eq!(h.view.last_recommendations(), Some(None));
}

#[tokio::test]
async fn test_ids_with_reserved_characters_are_encoded() {
    let h = harness();
    h.backend.push("GET", "/user/a%2Fb%20c/profile", ScriptedReply::ok(json!({"status": "success", "profile": {}})));

    h.dashboard
        .dispatch(Command::ViewProfile("a/b c".into()))
        .await
        .unwrap();

    assert_eq!(h.backend.count("GET", "/user/a%2Fb%20c/profile"), 1);
    assert!(h.view.events().iter().any(|e| matches!(e, ViewEvent::Profile { user_id, .. } if user_id == "a/b c")));
}

#[tokio::test(start_paused = true)]
async fn test_single_attempt_config() {
    let api = ApiConfig {
        retry_count: 1,
        ..ApiConfig::default()
    };
    let h = harness_with(api, DashboardConfig::default());
    h.backend.always("GET", "/users", ScriptedReply::network("down"));

    let start = tokio::time::Instant::now();
    h.dashboard.dispatch(Command::ReloadManagement).await.unwrap_err();

    assert_eq!(h.backend.count("GET", "/users"), 1);
    assert_eq!(h.backend.count("GET", "/ads"), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
    // both failed: one notice each
    assert_eq!(h.view.notices_of(Severity::Error).len(), 2);
    let snap = h.dashboard.session().snapshot();
    assert!(snap.users.is_degraded());
    assert!(snap.ads.is_degraded());
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_fetches_for_same_user_last_completed_wins() {
    let h = harness();
    h.backend.push("GET", "/health", ScriptedReply::ok(json!({"status": "healthy"})));
    // manual fetch asks first but answers last
    h.backend.push(
        "GET",
        "/recommend/u1",
        recs(vec![rec("ad_slow", 0.9, false)]).delayed(Duration::from_secs(5)),
    );
    h.backend.push("POST", "/interaction/u1/ad_1/click", ok());
    h.backend.push("GET", "/recommend/u1", recs(vec![rec("ad_fast", 0.8, false)]));
    h.dashboard
        .dispatch(Command::SelectUser(Some("u1".into())))
        .await
        .unwrap();

    let (manual, interaction) = tokio::join!(
        h.dashboard.dispatch(Command::GetRecommendations),
        h.dashboard.dispatch(Command::RecordInteraction {
            user_id: "u1".into(),
            ad_id: "ad_1".into(),
            action: InteractionAction::Click,
        })
    );
    manual.unwrap();
    interaction.unwrap();

    assert_eq!(h.backend.count("GET", "/recommend/u1"), 2);
    let snap = h.dashboard.session().snapshot();
    assert_eq!(snap.current_recommendations().unwrap().ad_ids(), vec!["ad_slow"]);
    assert_eq!(
        h.view.last_recommendations().unwrap().unwrap().ad_ids(),
        vec!["ad_slow"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_refresh_dropped_when_selection_moves_mid_flight() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push("POST", "/interaction/u1/ad_1/view", ok());
    backend.push("GET", "/health", ScriptedReply::ok(json!({"status": "healthy"})));
    backend.push(
        "GET",
        "/recommend/u1",
        recs(vec![rec("ad_1", 0.9, false)]).delayed(Duration::from_secs(5)),
    );
    let session = Arc::new(SessionStore::new());
    let transport = Transport::new(ApiConfig::default(), backend.clone()).unwrap();
    let repo = Arc::new(DashboardRepository::new(
        transport,
        session.clone(),
        FallbackConfig::default(),
    ));
    let coordinator = InteractionCoordinator::new(repo, 6);
    session.set_current_user(Some("u1".into()));

    let switch = async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        session.set_current_user(Some("u2".into()));
    };
    let (outcome, _) = tokio::join!(
        coordinator.submit("u1", "ad_1", InteractionAction::View, Duration::ZERO),
        switch
    );

    assert_eq!(outcome.unwrap().refresh, RefreshOutcome::Superseded);
    assert_eq!(backend.count("GET", "/recommend/u1"), 1);
    let snap = session.snapshot();
    assert_eq!(snap.current_user.as_deref(), Some("u2"));
    assert!(snap.recommendations.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_manual_fetch_dropped_when_selection_moves_mid_flight() {
    let h = harness();
    h.backend.push(
        "GET",
        "/recommend/u1",
        recs(vec![rec("ad_1", 0.9, false)]).delayed(Duration::from_secs(5)),
    );
    h.dashboard
        .dispatch(Command::SelectUser(Some("u1".into())))
        .await
        .unwrap();

    let switch = async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        h.dashboard
            .dispatch(Command::SelectUser(Some("u2".into())))
            .await
    };
    let (fetched, switched) = tokio::join!(h.dashboard.dispatch(Command::GetRecommendations), switch);
    fetched.unwrap();
    switched.unwrap();

    let snap = h.dashboard.session().snapshot();
    assert_eq!(snap.current_user.as_deref(), Some("u2"));
    assert!(snap.recommendations.is_none());
    assert!(h.view.notices_of(Severity::Success).is_empty());
    assert_eq!(h.view.last_recommendations(), Some(None));
}
