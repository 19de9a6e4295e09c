//! sky-send - Background daemon announcing fresh feed entries to Bluesky
//!
//! Polls the configured feeds, announces entries published within the
//! publication window that have not been announced before, and sleeps
//! between cycles. The timer is rerun-after-completion: a new cycle only
//! starts once the previous one has finished, so cycles never overlap.

use clap::Parser;
use libskycast::platforms::bluesky::BlueskyBackend;
use libskycast::{logging, Config, Credentials, Orchestrator, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "sky-send")]
#[command(version)]
#[command(about = "Background daemon announcing fresh feed entries to Bluesky")]
#[command(long_about = "\
sky-send - Background daemon announcing fresh feed entries to Bluesky

DESCRIPTION:
    sky-send polls a configured list of RSS/Atom feeds, announces entries
    published within the last hour that have not been announced before,
    and attaches a link-preview card to each announcement.

    Already-announced links are kept in a small JSON ledger so restarts
    never cause duplicate announcements. All calls to Bluesky are paced
    to stay under the service's published rate limits.

USAGE:
    # Run in foreground (logs to stderr)
    sky-send

    # Run with custom poll interval
    sky-send --poll-interval 300

    # Enable verbose logging
    sky-send --verbose

SIGNALS:
    SIGTERM, SIGINT - Graceful shutdown (finishes the current cycle)

CONFIGURATION:
    Configuration file: ~/.config/skycast/config.toml (or SKYCAST_CONFIG)
    Credentials: SKYCAST_IDENTIFIER / SKYCAST_PASSWORD environment variables
    Ledger location: ~/.local/share/skycast/posted.json

EXIT CODES:
    0 - Clean shutdown
    1 - Configuration or runtime error
    2 - Authentication error
")]
struct Cli {
    /// Config file path (overrides SKYCAST_CONFIG and the default location)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Poll interval in seconds (overrides config)
    #[arg(long, value_name = "SECONDS")]
    #[arg(help = "Seconds to sleep after each cycle completes (default: 60)")]
    poll_interval: Option<u64>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Run one cycle and exit (for testing)
    #[arg(long, hide = true)]
    once: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init(cli.verbose);

    if let Err(err) = run(cli).await {
        error!("{}", err);
        eprintln!("sky-send: {}", err);
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    let credentials = Credentials::from_env()?;

    info!(feeds = config.feeds.len(), "sky-send daemon starting");

    let shutdown = Arc::new(AtomicBool::new(false));
    setup_signal_handlers(shutdown.clone());

    let poll_interval = cli.poll_interval.unwrap_or(config.poll.interval_secs);
    info!("Poll interval: {}s", poll_interval);

    let backend = BlueskyBackend::new().await?;
    let mut orchestrator = Orchestrator::new(&config, credentials, Box::new(backend))?;

    if cli.once {
        orchestrator.run_cycle().await;
        info!("sky-send: ran one cycle, exiting");
    } else {
        run_daemon_loop(&mut orchestrator, poll_interval, shutdown).await;
    }

    info!("sky-send daemon stopped");
    Ok(())
}

/// Set up signal handlers for graceful shutdown
#[cfg(unix)]
fn setup_signal_handlers(shutdown: Arc<AtomicBool>) {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = match Signals::new([SIGINT, SIGTERM]) {
        Ok(signals) => signals,
        Err(err) => {
            error!("Signal setup failed: {}", err);
            return;
        }
    };

    // Spawn thread to handle signals
    std::thread::spawn(move || {
        for sig in signals.forever() {
            match sig {
                SIGTERM | SIGINT => {
                    info!("Received shutdown signal, stopping gracefully...");
                    shutdown.store(true, Ordering::Relaxed);
                    break;
                }
                _ => {}
            }
        }
    });
}

#[cfg(not(unix))]
fn setup_signal_handlers(_shutdown: Arc<AtomicBool>) {}

/// Main daemon loop: cycle immediately at startup, then sleep the poll
/// interval after each cycle completes (checking shutdown every second).
async fn run_daemon_loop(
    orchestrator: &mut Orchestrator,
    poll_interval: u64,
    shutdown: Arc<AtomicBool>,
) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            info!("Shutdown requested, stopping daemon loop");
            break;
        }

        orchestrator.run_cycle().await;

        for _ in 0..poll_interval {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            sleep(Duration::from_secs(1)).await;
        }
    }
}
