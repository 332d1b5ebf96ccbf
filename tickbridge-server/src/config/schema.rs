//! Configuration schema structs

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use tickbridge_protocol::DEFAULT_MAX_FRAME_SIZE;
use tickbridge_utils::{port_file_path, DEFAULT_PORT_FILE_NAME};

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub scheduler: SchedulerConfig,
    pub discovery: DiscoveryConfig,
}

/// Listener and connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Loopback address to listen on
    pub bind_address: IpAddr,
    /// First port of the negotiation range
    pub base_port: u16,
    /// Last port of the negotiation range (inclusive)
    pub max_port: u16,
    /// Idle timeout for a connection waiting on its next request
    pub read_timeout_secs: u64,
    /// Enable TCP keepalive on accepted connections
    pub keepalive: bool,
    /// Largest accepted request frame in bytes
    pub max_frame_bytes: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            base_port: 6400,
            max_port: 6499,
            read_timeout_secs: 60,
            keepalive: true,
            max_frame_bytes: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl NetworkConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

/// Host tick settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Interval between drain passes in milliseconds
    pub tick_interval_ms: u64,
    /// Crashed passes tolerated before giving up
    pub max_restarts: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 16,
            max_restarts: 3,
        }
    }
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Port discovery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Project directory holding the port file (working directory if unset)
    pub project_dir: Option<PathBuf>,
    /// File name of the port file
    pub port_file_name: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            project_dir: None,
            port_file_name: DEFAULT_PORT_FILE_NAME.into(),
        }
    }
}

impl DiscoveryConfig {
    /// Full path of the port file
    pub fn port_file(&self) -> PathBuf {
        port_file_path(self.project_dir.as_deref(), &self.port_file_name)
    }
}
