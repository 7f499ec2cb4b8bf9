//! Operator harness for the session coordinator.
//!
//! Drives a live coordinator from stdin for manual verification: a blank
//! line counts as user activity, `extend` dismisses a running warning,
//! `token <value>` swaps the bearer token, `status` prints a snapshot,
//! `quit` stops. Deterministic coverage lives in the test suite; this
//! binary exists to watch the timers behave against the wall clock.

use activity_signal::{ActivityKind, PulseBus};
use clap::Parser;
use session_coordinator::{ConfigResult, SessionCallbacks, SessionConfig, SessionCoordinator};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Notify;
use tracing::{info, warn};

/// Interactive harness for the session-lifecycle coordinator.
#[derive(Parser, Debug)]
#[command(name = "session-sentinel")]
#[command(about = "Interactive harness for the session-lifecycle coordinator")]
struct Args {
    /// Bearer token to arm the token branch with (omit for an
    /// inactivity-only session).
    #[arg(long, env = "SESSION_TOKEN")]
    token: Option<String>,

    /// Idle seconds before logout.
    #[arg(long, env = "SESSION_INACTIVITY_TIMEOUT_SECS", default_value = "1200")]
    inactivity_secs: u64,

    /// Warning window in seconds.
    #[arg(long, env = "SESSION_INACTIVITY_WARNING_SECS", default_value = "180")]
    warning_secs: u64,

    /// Token re-validation period in seconds.
    #[arg(long, env = "SESSION_TOKEN_REVALIDATE_SECS", default_value = "30")]
    revalidate_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ConfigResult<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    let config = SessionConfig::new(
        Duration::from_secs(args.inactivity_secs),
        Duration::from_secs(args.warning_secs),
        Duration::from_secs(args.revalidate_secs),
    )?;
    info!(
        inactivity_secs = args.inactivity_secs,
        warning_secs = args.warning_secs,
        revalidate_secs = args.revalidate_secs,
        "Configuration loaded"
    );

    let logged_out = Arc::new(Notify::new());
    let on_logout = Arc::clone(&logged_out);
    let callbacks = SessionCallbacks::new()
        .on_warning(|active| {
            if active {
                warn!("Session about to expire; send `extend` to keep it");
            } else {
                info!("Warning dismissed");
            }
        })
        .on_countdown_tick(|seconds| {
            if seconds % 15 == 0 {
                info!(seconds, "Logout countdown");
            }
        })
        .on_timeout(move |cause| {
            warn!(%cause, "Logged out");
            on_logout.notify_one();
        });

    let bus = Arc::new(PulseBus::new());
    let coordinator = SessionCoordinator::new(config, callbacks, bus.clone());
    coordinator.start(args.token.as_deref());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Ok(Some(line)) = line else { break };
                match line.trim() {
                    "" => bus.emit(ActivityKind::Keyboard),
                    "extend" => coordinator.extend(),
                    "status" => {
                        let status = coordinator.status();
                        info!(
                            running = status.running,
                            phase = ?status.phase,
                            remaining_idle_secs = status.remaining_idle.as_secs(),
                            token_expires_at = ?status.token_expires_at,
                            "Session status"
                        );
                    }
                    "quit" => break,
                    other => {
                        if let Some(token) = other.strip_prefix("token ") {
                            coordinator.update_token(token);
                        } else {
                            warn!(input = %other, "Unrecognized command");
                        }
                    }
                }
            }
            _ = logged_out.notified() => break,
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    coordinator.stop();
    info!("Session sentinel exiting");
    Ok(())
}
