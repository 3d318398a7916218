//! View that records every call, for assertions in tests

use std::sync::Mutex;

use super::view::{DashboardView, Notice, Severity};
use crate::core_types::UserId;
use crate::models::{Ad, DashboardStats, RecommendationSet, UserProfile};
use crate::session::Dataset;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Busy(bool),
    Notice(Notice),
    Stats(DashboardStats),
    UserSelector {
        users: Vec<UserId>,
        selected: Option<UserId>,
    },
    Recommendations(Option<RecommendationSet>),
    Management {
        users: Dataset<UserId>,
        ads: Dataset<Ad>,
    },
    Profile {
        user_id: UserId,
        profile: UserProfile,
    },
}

#[derive(Debug, Default)]
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: ViewEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Notice(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    pub fn notices_of(&self, severity: Severity) -> Vec<Notice> {
        self.notices()
            .into_iter()
            .filter(|n| n.severity == severity)
            .collect()
    }

    pub fn last_stats(&self) -> Option<DashboardStats> {
        self.events().into_iter().rev().find_map(|e| match e {
            ViewEvent::Stats(s) => Some(s),
            _ => None,
        })
    }

    /// Latest recommendations render; outer `None` if nothing was rendered
    pub fn last_recommendations(&self) -> Option<Option<RecommendationSet>> {
        self.events().into_iter().rev().find_map(|e| match e {
            ViewEvent::Recommendations(r) => Some(r),
            _ => None,
        })
    }

    pub fn busy_transitions(&self) -> Vec<bool> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Busy(b) => Some(b),
                _ => None,
            })
            .collect()
    }
}

impl DashboardView for RecordingView {
    fn set_busy(&self, busy: bool) {
        self.push(ViewEvent::Busy(busy));
    }

    fn notify(&self, notice: Notice) {
        self.push(ViewEvent::Notice(notice));
    }

    fn render_stats(&self, stats: &DashboardStats) {
        self.push(ViewEvent::Stats(*stats));
    }

    fn render_user_selector(&self, users: &[UserId], selected: Option<&str>) {
        self.push(ViewEvent::UserSelector {
            users: users.to_vec(),
            selected: selected.map(str::to_string),
        });
    }

    fn render_recommendations(&self, recommendations: Option<&RecommendationSet>) {
        self.push(ViewEvent::Recommendations(recommendations.cloned()));
    }

    fn render_management(&self, users: &Dataset<UserId>, ads: &Dataset<Ad>) {
        self.push(ViewEvent::Management {
            users: users.clone(),
            ads: ads.clone(),
        });
    }

    fn render_profile(&self, user_id: &str, profile: &UserProfile) {
        self.push(ViewEvent::Profile {
            user_id: user_id.to_string(),
            profile: profile.clone(),
        });
    }
}
