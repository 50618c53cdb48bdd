//! Vireo Session - headless driver for the playback session coordinator.
//!
//! Wires the session to in-process collaborators (a catalog seeded from the
//! configuration file, a software media engine, a static receiver registry)
//! and reads commands from stdin, one per line, printing the published
//! session state as JSON after each one.

mod commands;
mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use vireo_core::{
    bootstrap_session, DeviceHandle, InMemoryCatalog, LoggingEventEmitter, SessionCollaborators,
    SessionCommand, SessionCoordinator, StaticDeviceRegistry, WatchMediaEngine,
};

use crate::commands::{parse_line, DriverCommand};
use crate::config::SessionConfig;

/// Vireo Session - drive a playback session from the command line.
#[derive(Parser, Debug)]
#[command(name = "vireo-session")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "VIREO_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Picker searching grace delay in milliseconds (overrides config file).
    #[arg(short = 'g', long)]
    searching_grace_ms: Option<u64>,

    /// Log every session event at debug level.
    #[arg(long)]
    trace_events: bool,

    /// Print state as indented JSON.
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries state snapshots only
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .target(env_logger::Target::Stderr)
        .init();

    log::info!("Vireo Session v{}", env!("CARGO_PKG_VERSION"));

    let mut config =
        SessionConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(grace) = args.searching_grace_ms {
        config.searching_grace_ms = grace;
    }
    log::info!(
        "Configuration: {} item(s), {} container(s), {} device(s), grace={}ms",
        config.items.len(),
        config.containers.len(),
        config.devices.len(),
        config.searching_grace_ms
    );

    let catalog = Arc::new(InMemoryCatalog::new());
    for container in config.containers.iter().cloned() {
        catalog.insert_container(container);
    }
    for item in config.items.iter().cloned() {
        catalog.insert_item(item);
    }

    let session = bootstrap_session(
        &config.to_core_config(),
        SessionCollaborators {
            catalog,
            media: Arc::new(WatchMediaEngine::new()),
            registry: Arc::new(StaticDeviceRegistry::new(config.devices.clone())),
        },
    )
    .context("Failed to bootstrap session")?;

    if args.trace_events {
        session
            .event_bridge
            .set_external_emitter(Arc::new(LoggingEventEmitter));
    }
    session.start_background_tasks();

    tokio::select! {
        result = run_commands(&session.coordinator, &config, args.pretty) => {
            if let Err(e) = result {
                log::error!("Command loop failed: {:#}", e);
            }
        }
        _ = shutdown_signal() => {
            log::info!("Shutdown signal received, cleaning up...");
        }
    }

    session.shutdown().await;
    Ok(())
}

/// Reads commands from stdin until `quit` or end of input.
async fn run_commands(
    coordinator: &SessionCoordinator,
    config: &SessionConfig,
    pretty: bool,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                log::warn!("{}", e);
                continue;
            }
        };

        match command {
            DriverCommand::Quit => break,
            DriverCommand::State => {}
            DriverCommand::Session(command) => coordinator.dispatch(command).await,
            DriverCommand::Connect(id) => {
                let device = resolve_device(coordinator, config, &id);
                coordinator
                    .dispatch(SessionCommand::ConnectDevice(device))
                    .await;
            }
            DriverCommand::Disconnect(id) => {
                let device = resolve_device(coordinator, config, &id);
                coordinator
                    .dispatch(SessionCommand::DisconnectDevice(device))
                    .await;
            }
        }

        // Let spawned session tasks catch up before reporting
        tokio::time::sleep(Duration::from_millis(20)).await;
        print_state(coordinator, pretty)?;
    }
    Ok(())
}

/// Discovered devices first, then configured ones, else a bare handle.
fn resolve_device(
    coordinator: &SessionCoordinator,
    config: &SessionConfig,
    id: &str,
) -> DeviceHandle {
    coordinator
        .device(id)
        .or_else(|| config.device(id).cloned())
        .unwrap_or_else(|| DeviceHandle::new(id, id))
}

fn print_state(coordinator: &SessionCoordinator, pretty: bool) -> Result<()> {
    let state = coordinator.state();
    let json = if pretty {
        serde_json::to_string_pretty(&state)
    } else {
        serde_json::to_string(&state)
    }
    .context("Failed to serialize session state")?;
    println!("{json}");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
