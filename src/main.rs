//! AdPulse dashboard client
//!
//! Loads the environment config, initializes the dashboard against the live
//! recommendation service and runs the commands given on the command line.
//!
//! ```text
//! adpulse [-e dev] [--base-url URL]
//!         [--recommend USER] [--profile USER] [--manage]
//!         [--interact USER AD ACTION] [--simulate USER AD]
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use tracing::{error, info, warn};

use adpulse::config::{ClientConfig, ConfigError};
use adpulse::dashboard::{Command, ConsoleView, Dashboard};
use adpulse::repository::DashboardRepository;
use adpulse::session::SessionStore;
use adpulse::transport::{ReqwestBackend, Transport};
use adpulse::InteractionAction;

const GIT_HASH: &str = env!("ADPULSE_GIT_HASH");

// ============================================================
// ARGUMENTS
// ============================================================

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

/// Values following `flag`, `None` unless all `n` are present
fn get_values(args: &[String], flag: &str, n: usize) -> Option<Vec<String>> {
    let pos = args.iter().position(|a| a == flag)?;
    let values = args.get(pos + 1..pos + 1 + n)?;
    Some(values.to_vec())
}

fn get_value(args: &[String], flag: &str) -> Option<String> {
    get_values(args, flag, 1).map(|mut v| v.remove(0))
}

fn get_env(args: &[String]) -> String {
    get_value(args, "--env")
        .or_else(|| get_value(args, "-e"))
        .unwrap_or_else(|| "dev".to_string())
}

/// Commands requested on the command line, in a fixed order
fn requested_commands(args: &[String]) -> anyhow::Result<Vec<Command>> {
    let mut commands = Vec::new();

    if has_flag(args, "--manage") {
        commands.push(Command::ReloadManagement);
    }
    if let Some(user) = get_value(args, "--recommend") {
        commands.push(Command::ShowUserRecommendations(user));
    }
    if let Some(user) = get_value(args, "--profile") {
        commands.push(Command::ViewProfile(user));
    }
    if has_flag(args, "--interact") {
        let Some(v) = get_values(args, "--interact", 3) else {
            bail!("--interact needs <user> <ad> <action>");
        };
        let action: InteractionAction = v[2].parse().map_err(anyhow::Error::msg)?;
        commands.push(Command::RecordInteraction {
            user_id: v[0].clone(),
            ad_id: v[1].clone(),
            action,
        });
    }
    if has_flag(args, "--simulate") {
        let Some(v) = get_values(args, "--simulate", 2) else {
            bail!("--simulate needs <user> <ad>");
        };
        commands.push(Command::SimulateInteraction {
            user_id: v[0].clone(),
            ad_id: v[1].clone(),
            action: InteractionAction::Click,
        });
    }

    Ok(commands)
}

fn load_config(env: &str) -> anyhow::Result<ClientConfig> {
    match ClientConfig::load(env) {
        Ok(config) => Ok(config),
        // No file for this env: run on built-in defaults
        Err(ConfigError::Read { path, .. }) => {
            eprintln!("Config {} not found, using defaults", path);
            Ok(ClientConfig::default())
        }
        Err(e) => Err(anyhow::Error::new(e).context("loading configuration")),
    }
}

// ============================================================
// MAIN
// ============================================================

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if has_flag(&args, "--version") {
        println!("adpulse {} ({})", env!("CARGO_PKG_VERSION"), GIT_HASH);
        return Ok(());
    }

    let env = get_env(&args);
    let mut config = load_config(&env)?;
    if let Some(url) = get_value(&args, "--base-url") {
        config.api.base_url = url;
    }
    config.api.validate()?;
    let commands = requested_commands(&args)?;

    let _log_guard = adpulse::logging::init_logging(&config);
    info!(
        "Starting AdPulse dashboard client {} in {} mode against {}",
        GIT_HASH, env, config.api.base_url
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    runtime.block_on(run(config, commands))
}

async fn run(config: ClientConfig, commands: Vec<Command>) -> anyhow::Result<()> {
    let backend = ReqwestBackend::new(Duration::from_millis(config.api.timeout_ms))
        .context("creating HTTP client")?;
    let transport = Transport::new(config.api.clone(), Arc::new(backend))?;
    let session = Arc::new(SessionStore::new());
    let repo = Arc::new(DashboardRepository::new(
        transport,
        session,
        config.fallback.clone(),
    ));
    let dashboard = Dashboard::new(repo, Arc::new(ConsoleView::new()), config.dashboard.clone());

    if let Err(e) = dashboard.dispatch(Command::Initialize).await {
        warn!(code = e.code(), "Running with placeholder data");
    }

    let mut failed = 0usize;
    for command in commands {
        let name = command.name();
        if let Err(e) = dashboard.dispatch(command).await {
            error!(command = name, code = e.code(), "Command failed: {}", e);
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{} command(s) failed", failed);
    }
    info!("Done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_env_flag() {
        assert_eq!(get_env(&args("adpulse -e prod")), "prod");
        assert_eq!(get_env(&args("adpulse --env staging")), "staging");
        assert_eq!(get_env(&args("adpulse")), "dev");
    }

    #[test]
    fn test_requested_commands_order_and_parsing() {
        let cmds = requested_commands(&args(
            "adpulse --interact u1 ad_2 purchase --recommend u1 --manage",
        ))
        .unwrap();
        assert_eq!(
            cmds,
            vec![
                Command::ReloadManagement,
                Command::ShowUserRecommendations("u1".into()),
                Command::RecordInteraction {
                    user_id: "u1".into(),
                    ad_id: "ad_2".into(),
                    action: InteractionAction::Purchase,
                },
            ]
        );
    }

    #[test]
    fn test_interact_requires_three_values() {
        assert!(requested_commands(&args("adpulse --interact u1 ad_2")).is_err());
        assert!(requested_commands(&args("adpulse --interact u1 ad_2 like")).is_err());
    }

    #[test]
    fn test_simulate_defaults_to_click() {
        let cmds = requested_commands(&args("adpulse --simulate u3 ad_1")).unwrap();
        assert_eq!(
            cmds,
            vec![Command::SimulateInteraction {
                user_id: "u3".into(),
                ad_id: "ad_1".into(),
                action: InteractionAction::Click,
            }]
        );
    }
}
