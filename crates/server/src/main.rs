//! spacenav-bridge
//!
//! Reads reports from every connected 3D navigation controller and streams
//! one textual snapshot per report to a single TCP consumer.

mod bridge;
mod config;
mod sink;
mod supervisor;
mod usb;

use anyhow::{Context, Result, bail};
use bridge::Bridge;
use clap::Parser;
use common::setup_logging;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use usb::DeviceManager;

#[derive(Parser, Debug)]
#[command(name = "spacenav-bridge")]
#[command(
    author,
    version,
    about = "Stream 3D navigation controller input to a TCP consumer"
)]
#[command(long_about = "
Bridges one or more USB 3D navigation controllers to a single TCP consumer.
Every decoded report is written to the consumer as one line holding the
8-element snapshot [tx, ty, tz, rx, ry, rz, button1, button2].

EXAMPLES:
    # Run with default config (listens on 127.0.0.1:12345)
    spacenav-bridge

    # Listen on another address
    spacenav-bridge --bind 0.0.0.0:12345

    # List USB devices without starting the bridge
    spacenav-bridge --list-devices

    # Run with debug logging (logs every raw report)
    spacenav-bridge --log-level debug

CONFIGURATION:
    The bridge looks for configuration files in the following order:
    1. Path specified with --config
    2. ~/.config/spacenav-bridge/server.toml
    3. /etc/spacenav-bridge/server.toml
    4. Built-in defaults
")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<std::path::PathBuf>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// List USB devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Address to accept the consumer on (overrides config)
    #[arg(short, long, value_name = "ADDR")]
    bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --save-config flag early (before loading config)
    if args.save_config {
        let config = config::ServerConfig::default();
        let path = config::ServerConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let mut config = if let Some(ref path) = args.config {
        config::ServerConfig::load(Some(path.clone())).context("Failed to load configuration")?
    } else {
        config::ServerConfig::load_or_default()
    };

    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }
    if let Some(level) = args.log_level {
        config::validate_log_level(&level)?;
        config.server.log_level = level;
    }
    config.validate().context("Invalid configuration")?;

    setup_logging(&config.server.log_level).context("Failed to setup logging")?;

    info!("spacenav-bridge v{}", env!("CARGO_PKG_VERSION"));
    info!("Log level: {}", config.server.log_level);

    let manager = DeviceManager::new().context("Failed to initialize USB context")?;

    if args.list_devices {
        return list_devices_mode(&manager);
    }

    run_bridge(config, manager).await
}

/// List USB devices and exit
fn list_devices_mode(manager: &DeviceManager) -> Result<()> {
    let devices = manager.list_devices().context("Failed to enumerate USB devices")?;

    if devices.is_empty() {
        println!("No USB devices found.");
    } else {
        println!("Found {} USB device(s):\n", devices.len());
        for device in devices {
            println!("  {}", device);
        }
    }

    Ok(())
}

/// Accept one consumer and bridge every matching device to it
async fn run_bridge(config: config::ServerConfig, manager: DeviceManager) -> Result<()> {
    let (vendor_id, product_id) = config.device.ids()?;
    let devices = manager
        .find_devices(vendor_id, product_id)
        .context("Failed to enumerate USB devices")?;

    if devices.is_empty() {
        error!("No {:04x}:{:04x} device found", vendor_id, product_id);
        bail!("No {:04x}:{:04x} device found", vendor_id, product_id);
    }
    info!("Found {} matching device(s)", devices.len());

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    let (stream, peer) = tokio::select! {
        accepted = listener.accept() => accepted.context("Failed to accept consumer connection")?,
        _ = signal::ctrl_c() => {
            info!("Interrupted before a consumer connected");
            return Ok(());
        }
    };
    // Only one consumer is ever served
    drop(listener);
    info!("Got a connection from {}", peer);

    if let Err(e) = stream.set_nodelay(true) {
        warn!("Failed to set TCP_NODELAY: {}", e);
    }

    let token = CancellationToken::new();
    let read_timeout = config.device.read_timeout();
    let mut bridge = Bridge::start(
        stream,
        config.output.format,
        config.output.queue_capacity,
        read_timeout,
        token.clone(),
    );

    let interface = config.device.interface;
    let started = bridge
        .supervisor_mut()
        .start_all(devices, |id, device| manager.open(&device, id, interface));

    let grace = read_timeout * 2 + Duration::from_secs(1);

    if started == 0 {
        bridge.shutdown(grace).await?;
        bail!("No device could be set up");
    }

    info!(
        "Important! Exit by pressing Ctrl-C, total {} device(s)",
        started
    );

    tokio::select! {
        result = signal::ctrl_c() => match result {
            Ok(()) => info!("Key interrupt, shutting down"),
            Err(e) => error!("Error waiting for Ctrl+C: {}", e),
        },
        _ = token.cancelled() => warn!("Consumer connection lost, shutting down"),
    }

    let report = bridge.shutdown(grace).await?;
    for (id, stats) in &report.sessions {
        info!(
            "Device {}: {} reports, {} snapshots, {} rejected, {} empty reads, {} timeouts, {} read errors",
            id,
            stats.reports,
            stats.snapshots,
            stats.rejected,
            stats.empty_reads,
            stats.timeouts,
            stats.read_errors
        );
    }
    if report.sink.write_failed {
        warn!("Output stream ended with a write failure");
    }
    info!(
        "Consumer connection closed after {} messages ({} bytes)",
        report.sink.messages, report.sink.bytes
    );

    Ok(())
}
