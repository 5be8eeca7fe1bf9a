//! monitor-sync binary entry point.
//!
//! Usage:
//! ```bash
//! # On the machine whose monitor is watched
//! monitor-sync server --rate 2
//!
//! # On every machine that should follow it
//! monitor-sync client
//!
//! # Multicast instead of broadcast, non-default display
//! monitor-sync --ip 239.255.0.1 --display :1 client
//! ```

use clap::{Parser, Subcommand};
use std::net::Ipv4Addr;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use monitor_sync::core::{
    PollRate, ReconcileConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_RATE_HZ, DEFAULT_PORT,
    DEFAULT_SETTLE_DELAY_MS,
};
use monitor_sync::network::{destination, UdpTransport};
use monitor_sync::power::{fmt_power, PowerSource, XsetDpms};
use monitor_sync::sync::{ClientLoop, Reconciler, ServerLoop};
use monitor_sync::util::shutdown_on_signal;
use monitor_sync::{Error, Result, SyncConfig};

/// Client/server for syncing DPMS (monitor power) states.
#[derive(Parser, Debug)]
#[command(name = "monitor-sync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// The X display to use (e.g. `:0`), omit for the default display
    #[arg(short, long, global = true)]
    display: Option<String>,

    /// The UDP port to use for sending/receiving sync messages
    #[arg(short, long, global = true, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// The multicast address (224.0.0.0/4, not a host address) to use,
    /// defaults to broadcast
    #[arg(short = 'i', long = "ip", global = true, value_name = "IP")]
    multicast: Option<Ipv4Addr>,

    /// Enable debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the server, use this on the machine whose DPMS state is monitored
    Server {
        /// The rate in hertz at which the DPMS state is polled
        #[arg(short, long, value_name = "RATE", default_value_t = DEFAULT_POLL_RATE_HZ)]
        rate: f64,
    },

    /// Start the client, use this on machines that need the server's DPMS state
    Client {
        /// Attempts to force the local state before giving up
        #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
        max_attempts: u32,

        /// Milliseconds to wait after each attempt before checking it
        #[arg(long, default_value_t = DEFAULT_SETTLE_DELAY_MS)]
        settle_ms: u64,
    },
}

impl Cli {
    /// Builds and validates the configuration for the selected role
    fn config(&self) -> Result<SyncConfig> {
        let mut config = SyncConfig {
            port: self.port,
            multicast: self.multicast,
            display: self.display.clone(),
            ..Default::default()
        };

        match self.command {
            Commands::Server { rate } => {
                config.poll_rate = PollRate::new(rate)?;
            }
            Commands::Client { max_attempts, settle_ms } => {
                config.reconcile = ReconcileConfig {
                    max_attempts,
                    settle_delay: Duration::from_millis(settle_ms),
                };
            }
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "info" })
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.config()?;

    let mut dpms = XsetDpms::open(config.display.clone()).await?;
    let display_name = dpms.display_name();
    match dpms.get_power().await {
        Some(power) => info!("DPMS available, power={}", fmt_power(power)),
        None => return Err(Error::display(format!("DPMS not supported on {}", display_name))),
    }

    let shutdown = CancellationToken::new();
    let signals = shutdown_on_signal(shutdown.clone())?;

    match cli.command {
        Commands::Server { .. } => {
            let transport = UdpTransport::sender()?;
            info!(
                "Polling DPMS state ({}Hz) on display {} and broadcasting on {}",
                config.poll_rate.hz(),
                display_name,
                config.describe_address()
            );

            let dest = destination(config.multicast, config.port);
            let mut server = ServerLoop::new(dpms, transport, dest, config.poll_rate);
            server.run(shutdown.clone()).await;
        }
        Commands::Client { .. } => {
            let transport = UdpTransport::listener(config.port, config.multicast)?;
            info!(
                "Listening for DPMS state from {} using display {}",
                config.describe_address(),
                display_name
            );

            if let Err(e) = dpms.reset().await {
                warn!("Failed to reset DPMS timeouts: {}", e);
            }

            let reconciler = Reconciler::new(config.reconcile.clone());
            let mut client = ClientLoop::new(dpms, transport, reconciler);
            client.run(shutdown.clone()).await;
        }
    }

    info!("Stopping...");
    shutdown.cancel();
    if let Err(e) = signals.await {
        warn!("Signal task failed: {}", e);
    }
    info!("Display {} released", display_name);
    Ok(())
}
