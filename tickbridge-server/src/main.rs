//! tickbridge-server: run the bridge against a simulated host
//!
//! The host is a dedicated thread ticking the drain scheduler at the
//! configured cadence with the built-in handlers registered.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, warn};

use tickbridge_server::builtin::builtin_registry;
use tickbridge_server::{Bridge, ConfigLoader, HostThread, TickExit};
use tickbridge_utils::{init_logging_with_config, BridgeError, LogConfig, Result};

/// Loopback command bridge into a tick-driven host
#[derive(Parser, Debug)]
#[command(name = "tickbridge-server")]
#[command(version)]
struct Args {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, env = "TICKBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory that receives the port file
    #[arg(long)]
    project_dir: Option<PathBuf>,

    /// First port of the negotiation range
    #[arg(long)]
    base_port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging_with_config(LogConfig::server()) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run(args).await {
        error!("{}", e);
        eprintln!("tickbridge-server: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = ConfigLoader::load_and_validate(args.config.as_deref())?;

    if let Some(dir) = args.project_dir {
        config.discovery.project_dir = Some(dir);
    }
    if let Some(port) = args.base_port {
        config.network.base_port = port;
        if config.network.max_port < port {
            config.network.max_port = port;
        }
    }
    ConfigLoader::validate(&config)?;

    let scheduler_config = config.scheduler.clone();
    let (mut bridge, receiver) = Bridge::new(config);
    let port = bridge.start().await?;

    let mut host = HostThread::spawn(receiver, &scheduler_config, move || builtin_registry(port))?;
    info!(port, "tickbridge-server ready");

    let outcome = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown requested");
            None
        }
        exit = host.exited() => exit,
    };

    bridge.stop().await;
    let report = host.stop()?;
    if report.answered_on_close > 0 {
        info!(count = report.answered_on_close, "Pending requests cancelled");
    }

    match outcome {
        Some(TickExit::GaveUp { restarts }) => Err(BridgeError::internal(format!(
            "host tick loop gave up after {} restarts",
            restarts
        ))),
        _ => {
            info!("tickbridge-server stopped");
            Ok(())
        }
    }
}
