use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use runnerd::allowlist::Allowlist;
use runnerd::config::{ServerConfig, DEFAULT_CONCURRENT_JOBS};
use runnerd::scheduler::Scheduler;
use runnerd::server::{self, AppState};
use runnerd::shutdown::install_shutdown_handler;
use runnerd::worker::LocalExecutor;

#[derive(Parser, Debug)]
#[command(name = "runnerd")]
#[command(version)]
#[command(about = "A single-node runner for allow-listed commands")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8090")]
    listen: SocketAddr,

    /// Number of commands to run concurrently. 0 for unlimited.
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENT_JOBS)]
    concurrency: usize,

    /// Commands that may be executed (repeatable or comma-separated)
    #[arg(long = "allow", value_delimiter = ',')]
    allow: Vec<String>,

    /// Seconds to wait for in-flight work after a shutdown signal
    #[arg(long, default_value = "15")]
    shutdown_grace_secs: u64,
}

#[tokio::main]
async fn main() -> runnerd::error::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ServerConfig {
        listen_addr: args.listen,
        concurrent_jobs: args.concurrency,
        allowed_commands: if args.allow.is_empty() {
            ServerConfig::default().allowed_commands
        } else {
            args.allow
        },
        shutdown_grace: Duration::from_secs(args.shutdown_grace_secs),
    };

    tracing::info!(
        listen_addr = %config.listen_addr,
        concurrent_jobs = config.concurrent_jobs,
        allowed_commands = ?config.allowed_commands,
        "Starting runnerd"
    );

    let scheduler = Scheduler::new(config.concurrent_jobs, Arc::new(LocalExecutor::new()));
    let allowlist = Arc::new(Allowlist::new(config.allowed_commands.clone()));
    let state = AppState {
        scheduler,
        allowlist,
    };

    let shutdown = install_shutdown_handler();

    // In-flight jobs get a bounded window after the signal; the
    // watchdog ends the process if draining takes longer.
    let watchdog = shutdown.clone();
    let grace = config.shutdown_grace;
    tokio::spawn(async move {
        watchdog.cancelled().await;
        tokio::time::sleep(grace).await;
        tracing::warn!("Shutdown grace period elapsed, exiting");
        std::process::exit(0);
    });

    server::serve(config.listen_addr, state, shutdown).await?;

    tracing::info!("Shut down");
    Ok(())
}
