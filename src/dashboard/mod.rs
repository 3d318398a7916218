//! Dashboard command layer
//!
//! Every operator action is a `Command`; `Dashboard::dispatch` is the single
//! handler table. Handlers talk to the repository/coordinator, update
//! Session State through them, and push results to a `DashboardView`.
//! Every failure reaches the view as exactly one error notice.

pub mod console;
pub mod view;

#[cfg(any(test, feature = "mock-api"))]
pub mod recording;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::coordinator::{InteractionCoordinator, RefreshOutcome};
use crate::core_types::{AdId, InteractionAction, UserId};
use crate::repository::{DashboardRepository, FailureCause, RepositoryError};
use crate::session::SessionStore;

pub use console::ConsoleView;
pub use view::{DashboardView, Notice, Severity};

pub const MSG_INIT_OK: &str = "Dashboard initialized successfully";
pub const MSG_INIT_DEGRADED: &str =
    "Dashboard started with placeholder data, some features may be limited";
pub const MSG_SELECT_USER: &str = "Please select a user first";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Initial load: users, ads, stats, user selector
    Initialize,
    SelectUser(Option<UserId>),
    /// Fetch recommendations for the selected user
    GetRecommendations,
    /// Select `user` and fetch their recommendations
    ShowUserRecommendations(UserId),
    ReloadManagement,
    ViewProfile(UserId),
    RecordInteraction {
        user_id: UserId,
        ad_id: AdId,
        action: InteractionAction,
    },
    /// Like `RecordInteraction`, with the configured settle delay before
    /// the recommendation refresh
    SimulateInteraction {
        user_id: UserId,
        ad_id: AdId,
        action: InteractionAction,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Initialize => "initialize",
            Command::SelectUser(_) => "select_user",
            Command::GetRecommendations => "get_recommendations",
            Command::ShowUserRecommendations(_) => "show_user_recommendations",
            Command::ReloadManagement => "reload_management",
            Command::ViewProfile(_) => "view_profile",
            Command::RecordInteraction { .. } => "record_interaction",
            Command::SimulateInteraction { .. } => "simulate_interaction",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raises the busy indicator on first entry, lowers it when the last
/// overlapping command finishes
struct BusyGuard<'a> {
    depth: &'a AtomicUsize,
    view: &'a dyn DashboardView,
}

impl<'a> BusyGuard<'a> {
    fn enter(depth: &'a AtomicUsize, view: &'a dyn DashboardView) -> Self {
        if depth.fetch_add(1, Ordering::SeqCst) == 0 {
            view.set_busy(true);
        }
        Self { depth, view }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if self.depth.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.view.set_busy(false);
        }
    }
}

pub struct Dashboard {
    repo: Arc<DashboardRepository>,
    coordinator: InteractionCoordinator,
    view: Arc<dyn DashboardView>,
    config: DashboardConfig,
    busy_depth: AtomicUsize,
}

impl Dashboard {
    pub fn new(
        repo: Arc<DashboardRepository>,
        view: Arc<dyn DashboardView>,
        config: DashboardConfig,
    ) -> Self {
        let coordinator = InteractionCoordinator::new(repo.clone(), config.top_k);
        Self {
            repo,
            coordinator,
            view,
            config,
            busy_depth: AtomicUsize::new(0),
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        self.repo.session()
    }

    pub fn repository(&self) -> &Arc<DashboardRepository> {
        &self.repo
    }

    /// Run one command. Failures have already been shown as a notice when
    /// this returns `Err`; the error is handed back for logging/exit codes.
    pub async fn dispatch(&self, command: Command) -> Result<(), RepositoryError> {
        debug!(command = command.name(), "Dispatching command");
        let result = match command {
            Command::Initialize => self.initialize().await,
            Command::SelectUser(user) => {
                self.select_user(user);
                Ok(())
            }
            Command::GetRecommendations => self.get_recommendations().await,
            Command::ShowUserRecommendations(user) => {
                self.select_user(Some(user));
                self.get_recommendations().await
            }
            Command::ReloadManagement => self.reload_management().await,
            Command::ViewProfile(user) => self.view_profile(&user).await,
            Command::RecordInteraction {
                user_id,
                ad_id,
                action,
            } => {
                self.interact(&user_id, &ad_id, action, Duration::ZERO, "Interaction recorded")
                    .await
            }
            Command::SimulateInteraction {
                user_id,
                ad_id,
                action,
            } => {
                let settle = Duration::from_millis(self.config.simulate_refresh_delay_ms);
                self.interact(&user_id, &ad_id, action, settle, "Simulated interaction")
                    .await
            }
        };
        if let Err(e) = &result {
            debug!(code = e.code(), "Command finished with error");
        }
        result
    }

    fn busy(&self) -> BusyGuard<'_> {
        BusyGuard::enter(&self.busy_depth, self.view.as_ref())
    }

    fn fail(&self, error: RepositoryError) -> RepositoryError {
        self.view.notify(Notice::error(error.to_string()));
        error
    }

    // ------------------------------------------------------------------
    // Handlers
    // ------------------------------------------------------------------

    async fn initialize(&self) -> Result<(), RepositoryError> {
        let _busy = self.busy();
        info!("Initializing dashboard");

        let mut first_error = None;
        // Sequential and isolated: an ads failure must not hide a users success
        if let Err(e) = self.repo.fetch_users().await {
            let e = self.fail(e);
            first_error.get_or_insert(e);
        }
        if let Err(e) = self.repo.fetch_ads().await {
            let e = self.fail(e);
            first_error.get_or_insert(e);
        }

        let stats = self.coordinator.refresh_stats().await;
        self.view.render_stats(&stats);

        let snapshot = self.session().snapshot();
        self.view
            .render_user_selector(&snapshot.users.items, snapshot.current_user.as_deref());

        match first_error {
            None => {
                self.view.notify(Notice::success(MSG_INIT_OK));
                Ok(())
            }
            Some(e) => {
                warn!("Dashboard initialized in degraded mode");
                self.view.notify(Notice::info(MSG_INIT_DEGRADED));
                Err(e)
            }
        }
    }

    fn select_user(&self, user: Option<UserId>) {
        let user = user.filter(|u| !u.trim().is_empty());
        self.session().set_current_user(user);
        let snapshot = self.session().snapshot();
        self.view
            .render_recommendations(snapshot.current_recommendations());
    }

    async fn get_recommendations(&self) -> Result<(), RepositoryError> {
        let Some(user_id) = self.session().current_user() else {
            return Err(self.fail(RepositoryError::RecommendationFetch(
                FailureCause::Validation(MSG_SELECT_USER.to_string()),
            )));
        };

        let _busy = self.busy();
        let set = self
            .repo
            .fetch_recommendations(&user_id, self.config.top_k)
            .await
            .map_err(|e| self.fail(e))?;

        if !self.session().snapshot().is_current_user(&user_id) {
            info!(user = %user_id, "Selection changed while fetching, dropping result");
            return Ok(());
        }

        let count = set.len();
        self.session().set_recommendations(Some(set));
        let snapshot = self.session().snapshot();
        self.view
            .render_recommendations(snapshot.current_recommendations());
        self.view.notify(Notice::success(format!(
            "Generated {} recommendations for {}",
            count, user_id
        )));
        Ok(())
    }

    async fn reload_management(&self) -> Result<(), RepositoryError> {
        let _busy = self.busy();
        let (users, ads) = tokio::join!(self.repo.fetch_users(), self.repo.fetch_ads());

        // Counts changed either way (live data or placeholders)
        let stats = self.coordinator.refresh_stats().await;
        self.view.render_stats(&stats);

        // Both lists render regardless; failures already wrote placeholders
        let snapshot = self.session().snapshot();
        self.view.render_management(&snapshot.users, &snapshot.ads);

        let mut first_error = None;
        for result in [users.map(|_| ()), ads.map(|_| ())] {
            if let Err(e) = result {
                let e = self.fail(e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn view_profile(&self, user_id: &str) -> Result<(), RepositoryError> {
        let _busy = self.busy();
        let profile = self
            .repo
            .fetch_user_profile(user_id)
            .await
            .map_err(|e| self.fail(e))?;
        self.view.render_profile(user_id, &profile);
        Ok(())
    }

    async fn interact(
        &self,
        user_id: &str,
        ad_id: &str,
        action: InteractionAction,
        settle: Duration,
        headline: &str,
    ) -> Result<(), RepositoryError> {
        let _busy = self.busy();
        let outcome = self
            .coordinator
            .submit(user_id, ad_id, action, settle)
            .await
            .map_err(|e| self.fail(e))?;

        self.view.notify(Notice::success(format!(
            "{}: {} {} {}",
            headline,
            user_id,
            action.label(),
            ad_id
        )));
        self.view.render_stats(&outcome.stats);

        match outcome.refresh {
            RefreshOutcome::Refreshed(_) => {
                let snapshot = self.session().snapshot();
                self.view
                    .render_recommendations(snapshot.current_recommendations());
            }
            RefreshOutcome::Failed(e) => {
                // The interaction itself succeeded; only the refresh is reported
                self.fail(e);
            }
            RefreshOutcome::NotCurrentUser | RefreshOutcome::Superseded => {}
        }
        Ok(())
    }
}
