//! Analog clock daemon entry point.
//!
//! Runs the tick loop, publishes snapshots to the web surface and an
//! optional JSON file, and accepts commands over HTTP, WebSocket, and a
//! mailbox directory.

mod gateway;
mod signals;
mod ticker;

use anyhow::{Context, Result};
use clap::Parser;
use clock_common::config::ClockConfig;
use clock_common::mailbox::CommandMailbox;
use clock_core::SystemWallClock;
use clock_web::WebServer;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::gateway::{MailboxDir, SnapshotFile};
use crate::signals::SignalHandler;
use crate::ticker::TickLoop;

/// Clock daemon command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "clock-daemon",
    about = "Analog clock daemon - ticking clock state with hand angles and an alarm",
    version,
    long_about = None
)]
struct Args {
    /// Path to a configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// HTTP bind address (overrides config file).
    #[arg(long, value_name = "ADDR")]
    bind: Option<SocketAddr>,

    /// Write every snapshot to this JSON file (overrides config file).
    #[arg(long, value_name = "FILE")]
    snapshot_path: Option<PathBuf>,

    /// Poll this directory for command files (overrides config file).
    #[arg(long, value_name = "DIR")]
    mailbox_dir: Option<PathBuf>,

    /// Disable the HTTP server.
    #[arg(long)]
    no_web: bool,

    /// Maximum ticks to run (0 = infinite).
    #[arg(long, default_value = "0")]
    max_ticks: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting clock daemon");

    let mut config = load_config(&args)?;
    apply_overrides(&mut config, &args);
    config.validate().context("Invalid configuration")?;

    info!(
        tick_interval = ?config.tick_interval,
        start_mode = ?config.start_mode,
        web = config.web.enabled,
        "Configuration loaded"
    );

    let signal_handler = SignalHandler::new().context("Failed to set up signal handlers")?;

    run_daemon(&config, &signal_handler, args.max_ticks).await
}

/// Initialize logging with the specified log level.
fn init_logging(level: &str) {
    let filter = format!(
        "clock_daemon={level},clock_core={level},clock_web={level},clock_common={level}"
    );

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Resolution priority (first existing file wins):
/// 1. Command-line `--config` argument
/// 2. `CLOCK_CONFIG_PATH` environment variable
/// 3. `/etc/analog-clock/config.toml` (system path)
/// 4. `config/default.toml` (local development)
/// 5. Built-in defaults
fn load_config(args: &Args) -> Result<ClockConfig> {
    if let Some(config_path) = &args.config {
        info!(?config_path, "Loading config from command-line argument");
        return ClockConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"));
    }

    if let Ok(env_path) = std::env::var("CLOCK_CONFIG_PATH") {
        let config_path = PathBuf::from(&env_path);
        if config_path.exists() {
            info!(?config_path, "Loading config from CLOCK_CONFIG_PATH");
            return ClockConfig::from_file(&config_path).with_context(|| {
                format!("Failed to load config from CLOCK_CONFIG_PATH={env_path:?}")
            });
        }
        warn!(
            path = %env_path,
            "CLOCK_CONFIG_PATH set but file does not exist, checking other locations"
        );
    }

    for path in ["/etc/analog-clock/config.toml", "config/default.toml"] {
        let config_path = PathBuf::from(path);
        if config_path.exists() {
            info!(?config_path, "Loading config file");
            return ClockConfig::from_file(&config_path)
                .with_context(|| format!("Failed to load config from {config_path:?}"));
        }
    }

    info!("No config file found, using built-in defaults");
    Ok(ClockConfig::default())
}

/// Apply command-line overrides on top of the loaded configuration.
fn apply_overrides(config: &mut ClockConfig, args: &Args) {
    if let Some(bind) = args.bind {
        config.web.bind_addr = bind;
    }
    if let Some(path) = &args.snapshot_path {
        config.publish.snapshot_path = Some(path.clone());
    }
    if let Some(dir) = &args.mailbox_dir {
        config.mailbox.dir = Some(dir.clone());
    }
    if args.no_web {
        config.web.enabled = false;
    }
}

/// Wire up publishers and command sources, then run the tick loop.
async fn run_daemon(config: &ClockConfig, signals: &SignalHandler, max_ticks: u64) -> Result<()> {
    let mailbox = Arc::new(CommandMailbox::new());
    let mut tick_loop = TickLoop::new(config.start_mode, SystemWallClock, Arc::clone(&mailbox));

    let web_task = if config.web.enabled {
        let server = WebServer::new(config.web.clone(), Arc::clone(&mailbox));
        tick_loop = tick_loop.with_publisher(server.state_updater());
        let shutdown = signals.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = server.start().await {
                error!(error = %e, "Web server failed");
                shutdown.request_shutdown();
            }
        }))
    } else {
        info!("Web server disabled");
        None
    };

    if let Some(path) = &config.publish.snapshot_path {
        let file = SnapshotFile::new(path);
        info!(path = %file.path().display(), "Publishing snapshots to file");
        tick_loop = tick_loop.with_publisher(file);
    }

    if let Some(dir) = &config.mailbox.dir {
        info!(dir = %dir.display(), "Polling mailbox directory");
        tick_loop = tick_loop.with_mailbox_dir(MailboxDir::new(dir));
    }

    tick_loop
        .run(config.tick_interval, signals, max_ticks)
        .await;

    info!("Shutting down...");
    if let Some(task) = web_task {
        task.abort();
    }

    let (hour, minute, second) = tick_loop.clock().time();
    info!(
        total_ticks = tick_loop.tick_count(),
        signals = signals.state().signal_count(),
        final_time = %format!("{hour:02}:{minute:02}:{second:02}"),
        "Daemon shutdown complete"
    );

    Ok(())
}
