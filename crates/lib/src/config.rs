//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.voxgate/config.json`) and environment.
//! Every field has a default, so an empty object or a missing file is a valid config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Webhook path, reply timeout and service identity.
    #[serde(default)]
    pub adapter: AdapterConfig,
}

/// Listener bind address and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port for the webhook and health endpoint (default 15152). Overridden by VOXGATE_PORT env.
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_server_bind")]
    pub bind: String,
}

/// Adapter behavior: where the platform posts, how long a request may wait for its reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterConfig {
    /// Route the voice platform calls (GET and POST). Default "/alexa".
    #[serde(default = "default_adapter_path")]
    pub path: String,

    /// Service id reported in send receipts and the health probe. Default "alexa".
    #[serde(default = "default_service_id")]
    pub service_id: String,

    /// How long a pending request waits for a reply before its registration is dropped (default 60000).
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,

    /// Capacity of the inbound event channel (default 64).
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_server_port() -> u16 {
    15152
}

fn default_server_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_adapter_path() -> String {
    "/alexa".to_string()
}

fn default_service_id() -> String {
    "alexa".to_string()
}

fn default_reply_timeout_ms() -> u64 {
    60_000
}

fn default_event_buffer() -> usize {
    64
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            bind: default_server_bind(),
        }
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            path: default_adapter_path(),
            service_id: default_service_id(),
            reply_timeout_ms: default_reply_timeout_ms(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl AdapterConfig {
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }

    /// Webhook path with a guaranteed leading slash.
    pub fn route_path(&self) -> String {
        let p = self.path.trim();
        if p.starts_with('/') {
            p.to_string()
        } else {
            format!("/{}", p)
        }
    }
}

/// Resolve the listener port: env VOXGATE_PORT overrides config when it parses.
pub fn resolve_port(config: &Config) -> u16 {
    std::env::var("VOXGATE_PORT")
        .ok()
        .and_then(|s| s.trim().parse::<u16>().ok())
        .unwrap_or(config.server.port)
}

/// True if the bind address is loopback (127.0.0.1, ::1, etc.).
pub fn is_loopback_bind(bind: &str) -> bool {
    let b = bind.trim();
    b == "127.0.0.1" || b == "::1" || b == "localhost"
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("VOXGATE_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".voxgate").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the given path (or the default path). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
