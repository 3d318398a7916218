//! Plain-text rendering of the dashboard for terminals.
//!
//! Formatting lives in free functions so it can be checked without
//! capturing stdout. Logs go to stderr, leaving stdout to this view.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use super::view::{DashboardView, Notice, Severity};
use crate::core_types::UserId;
use crate::models::{Ad, DashboardStats, Recommendation, RecommendationSet, UserProfile};
use crate::session::Dataset;

pub const EMPTY_RECOMMENDATIONS: &str = "Select a user and click \"Get Recommendations\" to see personalized ad recommendations";
pub const NO_RECOMMENDATIONS: &str = "No recommendations available for this user";
pub const CF_BADGE: &str = "[CF]";

const UNKNOWN: &str = "unknown";

pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

pub fn format_score(value: f64) -> String {
    format!("{:.3}", value)
}

pub fn format_stats(stats: &DashboardStats) -> String {
    format!(
        "Users: {} | Ads: {} | Interactions: {} | Avg score: {}",
        stats.user_count,
        stats.ad_count,
        stats.interactions,
        format_score(stats.avg_score)
    )
}

pub fn format_recommendation(rank: usize, rec: &Recommendation) -> String {
    let mut line = format!(
        "{:>2}. {} ({}) ${} | click {} | similarity {} | score {}",
        rank,
        rec.ad_info.title,
        rec.ad_info.category,
        rec.ad_info.bid_price,
        format_percent(rec.click_probability),
        format_score(rec.similarity),
        format_score(rec.combined_score)
    );
    if rec.from_collaborative_filtering {
        line.push(' ');
        line.push_str(CF_BADGE);
    }
    line
}

/// Server order is kept; ranks start at 1
pub fn format_recommendations(recommendations: Option<&RecommendationSet>) -> String {
    match recommendations {
        None => EMPTY_RECOMMENDATIONS.to_string(),
        Some(set) if set.is_empty() => NO_RECOMMENDATIONS.to_string(),
        Some(set) => {
            let mut out = format!("Recommendations for {}:", set.user_id);
            for (i, rec) in set.items.iter().enumerate() {
                out.push('\n');
                out.push_str(&format_recommendation(i + 1, rec));
            }
            out
        }
    }
}

fn or_unknown(value: Option<&str>) -> &str {
    value.unwrap_or(UNKNOWN)
}

pub fn format_profile(user_id: &str, profile: &UserProfile) -> String {
    let age = profile
        .age
        .map(|a| a.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());
    let interests = if profile.interests.is_empty() {
        "none".to_string()
    } else {
        profile.interests.join(", ")
    };
    format!(
        "Profile: {}\n  age: {}\n  gender: {}\n  location: {}\n  device: {}\n  interests: {}",
        user_id,
        age,
        or_unknown(profile.gender.as_deref()),
        or_unknown(profile.location.as_deref()),
        or_unknown(profile.device.as_deref()),
        interests
    )
}

fn degraded_marker<T>(dataset: &Dataset<T>) -> &'static str {
    if dataset.is_degraded() { " (placeholder)" } else { "" }
}

pub fn format_management(users: &Dataset<UserId>, ads: &Dataset<Ad>) -> String {
    let mut out = format!("Users ({}){}:", users.len(), degraded_marker(users));
    for user in &users.items {
        out.push_str(&format!("\n  - {}", user));
    }
    out.push_str(&format!("\nAds ({}){}:", ads.len(), degraded_marker(ads)));
    for ad in &ads.items {
        out.push_str(&format!(
            "\n  - {} | {} | {} | ${}",
            ad.ad_id, ad.title, ad.category, ad.bid_price
        ));
    }
    out
}

pub fn format_notice(notice: &Notice) -> String {
    let tag = match notice.severity {
        Severity::Success => "OK",
        Severity::Error => "ERROR",
        Severity::Info => "INFO",
    };
    format!("[{}] {} {}", notice.at.format("%H:%M:%S"), tag, notice.message)
}

/// Writes every render to stdout
#[derive(Debug, Default)]
pub struct ConsoleView {
    busy: AtomicBool,
}

impl ConsoleView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Relaxed)
    }

    fn emit(&self, text: &str) {
        let mut out = std::io::stdout().lock();
        // Broken pipe on stdout is not worth failing a command over
        let _ = writeln!(out, "{}", text);
    }
}

impl DashboardView for ConsoleView {
    fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::Relaxed);
    }

    fn notify(&self, notice: Notice) {
        self.emit(&format_notice(&notice));
    }

    fn render_stats(&self, stats: &DashboardStats) {
        self.emit(&format_stats(stats));
    }

    fn render_user_selector(&self, users: &[UserId], selected: Option<&str>) {
        let entries: Vec<String> = users
            .iter()
            .map(|u| {
                if Some(u.as_str()) == selected {
                    format!("*{}", u)
                } else {
                    u.clone()
                }
            })
            .collect();
        self.emit(&format!("Users: {}", entries.join(" ")));
    }

    fn render_recommendations(&self, recommendations: Option<&RecommendationSet>) {
        self.emit(&format_recommendations(recommendations));
    }

    fn render_management(&self, users: &Dataset<UserId>, ads: &Dataset<Ad>) {
        self.emit(&format_management(users, ads));
    }

    fn render_profile(&self, user_id: &str, profile: &UserProfile) {
        self.emit(&format_profile(user_id, profile));
    }
}
