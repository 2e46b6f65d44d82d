mod error;

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use doorsync_api::{GarageClient, TransportConfig};
use doorsync_core::Bridge;

use crate::error::DaemonError;

/// Bridge a cloud-connected garage door to a local door-state surface.
#[derive(Debug, Parser)]
#[command(name = "doorsyncd", version, about)]
struct Cli {
    /// Path to the config file (defaults to the platform config dir).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn,doorsyncd=info,doorsync_core=info",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), DaemonError> {
    let config = doorsync_config::load(cli.config.as_deref())?;
    let password = doorsync_config::resolve_password(&config)?;
    let bridge_config = config.to_bridge_config()?;

    let client = GarageClient::new(config.service_url()?, &TransportConfig::default())
        .map_err(DaemonError::from_api)?;

    info!("connecting to garage door service");
    client
        .login(&config.username, &password)
        .await
        .map_err(DaemonError::from_api)?;
    info!("connected");

    // Resolve the configured door against the account, once, at
    // startup. Not finding it is fatal.
    let devices = client.devices().await.map_err(DaemonError::from_api)?;
    let door = devices
        .iter()
        .find(|d| d.serial_number == config.device_serial)
        .ok_or_else(|| DaemonError::DeviceNotFound {
            serial: config.device_serial.clone(),
            available: devices
                .iter()
                .filter(|d| d.is_door())
                .map(|d| d.serial_number.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })?;
    info!(
        serial = %door.serial_number,
        name = %door.name,
        model = door.device_model.as_deref().unwrap_or("unknown"),
        "found door"
    );

    let bridge = Bridge::new(bridge_config, client);
    bridge.start().await?;

    // Minimal presentation layer: log every observed state change under
    // the door's display name. A real accessory server would subscribe
    // to the same watch channels.
    let mut current = bridge.watch_current();
    let door_name = config.door_name.clone();
    tokio::spawn(async move {
        while current.changed().await.is_ok() {
            let state = *current.borrow_and_update();
            info!(door = %door_name, state = %state, "door state");
        }
    });

    shutdown_signal().await;
    info!("shutting down");
    bridge.shutdown().await;
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
