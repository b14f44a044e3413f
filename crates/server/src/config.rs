//! Server configuration management

use anyhow::{Context, Result, anyhow};
use common::DEFAULT_QUEUE_CAPACITY;
use crate::usb::session::DEFAULT_READ_TIMEOUT;
use protocol::SnapshotFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// System-wide configuration file, tried after the per-user one
pub const SYSTEM_CONFIG_PATH: &str = "/etc/spacenav-bridge/server.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    /// Which devices to bridge and how to read them
    #[serde(default)]
    pub device: DeviceSettings,
    /// Output stream settings
    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address the consumer connects to
    #[serde(default = "ServerSettings::default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "ServerSettings::default_log_level")]
    pub log_level: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: Self::default_bind_addr(),
            log_level: Self::default_log_level(),
        }
    }
}

impl ServerSettings {
    fn default_bind_addr() -> String {
        "127.0.0.1:12345".to_string()
    }

    fn default_log_level() -> String {
        "info".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// USB vendor ID in hex (e.g., "0x256f")
    #[serde(default = "DeviceSettings::default_vendor_id")]
    pub vendor_id: String,
    /// USB product ID in hex (e.g., "0xc635")
    #[serde(default = "DeviceSettings::default_product_id")]
    pub product_id: String,
    /// Interface carrying the report endpoints
    #[serde(default)]
    pub interface: u8,
    /// Timeout for each blocking report read
    #[serde(default = "DeviceSettings::default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            vendor_id: Self::default_vendor_id(),
            product_id: Self::default_product_id(),
            interface: 0,
            read_timeout_ms: Self::default_read_timeout_ms(),
        }
    }
}

impl DeviceSettings {
    fn default_vendor_id() -> String {
        "0x256f".to_string()
    }

    fn default_product_id() -> String {
        "0xc635".to_string()
    }

    fn default_read_timeout_ms() -> u64 {
        DEFAULT_READ_TIMEOUT.as_millis() as u64
    }

    /// Parsed (vendor_id, product_id)
    pub fn ids(&self) -> Result<(u16, u16)> {
        Ok((
            parse_hex_id(&self.vendor_id, "vendor_id")?,
            parse_hex_id(&self.product_id, "product_id")?,
        ))
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Message format ("list" or "json")
    #[serde(default)]
    pub format: SnapshotFormat,
    /// Capacity of the queue between device sessions and the forwarder
    #[serde(default = "OutputSettings::default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: SnapshotFormat::default(),
            queue_capacity: Self::default_queue_capacity(),
        }
    }
}

impl OutputSettings {
    fn default_queue_capacity() -> usize {
        DEFAULT_QUEUE_CAPACITY
    }
}

impl ServerConfig {
    /// Load configuration from `path`, or from the first existing
    /// well-known location
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => [Self::default_path(), PathBuf::from(SYSTEM_CONFIG_PATH)]
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| anyhow!("No configuration file found"))?,
        };
        let config_path = PathBuf::from(shellexpand::tilde(&config_path.to_string_lossy()).as_ref());

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
        let config: ServerConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.validate()?;

        tracing::info!("Loaded configuration from {}", config_path.display());
        Ok(config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default() -> Self {
        match Self::load(None) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Write the configuration as TOML, creating missing directories
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Per-user configuration file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("spacenav-bridge")
            .join("server.toml")
    }

    /// Parsed bind address
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind_addr
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", self.server.bind_addr))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        validate_log_level(&self.server.log_level)?;
        self.bind_addr()?;
        self.device.ids()?;

        if self.device.read_timeout_ms == 0 {
            return Err(anyhow!("read_timeout_ms must be greater than 0"));
        }

        if self.output.queue_capacity == 0 {
            return Err(anyhow!("queue_capacity must be greater than 0"));
        }

        Ok(())
    }
}

/// Validate a log level name
pub fn validate_log_level(level: &str) -> Result<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&level) {
        return Err(anyhow!(
            "Invalid log level '{}', must be one of: {}",
            level,
            valid_levels.join(", ")
        ));
    }
    Ok(())
}

/// Parse a hex ID (VID or PID) such as "0x256f"
fn parse_hex_id(id: &str, name: &str) -> Result<u16> {
    let hex_part = id
        .strip_prefix("0x")
        .or_else(|| id.strip_prefix("0X"))
        .ok_or_else(|| {
            anyhow!(
                "Invalid {} '{}', must start with '0x' (e.g., '0x256f')",
                name,
                id
            )
        })?;

    if hex_part.is_empty() || hex_part.len() > 4 {
        return Err(anyhow!(
            "Invalid {} '{}', hex part must be 1-4 digits",
            name,
            id
        ));
    }

    u16::from_str_radix(hex_part, 16)
        .map_err(|_| anyhow!("Invalid {} '{}', not a valid hex number", name, id))
}
