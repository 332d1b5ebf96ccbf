//! Client connection settings

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use tickbridge_protocol::DEFAULT_MAX_FRAME_SIZE;
use tickbridge_utils::{port_file_path, read_port_file, DEFAULT_PORT_FILE_NAME};

/// Port assumed when no port file can be read
pub const FALLBACK_PORT: u16 = 6400;

/// Where and how to reach the bridge
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Bound on each individual connection attempt
    pub connect_timeout: Duration,
    /// Host commands may legitimately run for a very long time
    pub response_timeout: Duration,
    pub max_frame_bytes: usize,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: FALLBACK_PORT,
            connect_timeout: Duration::from_secs(5),
            response_timeout: Duration::from_secs(86_400),
            max_frame_bytes: DEFAULT_MAX_FRAME_SIZE,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl ClientConfig {
    /// Defaults with the port taken from the project's port file
    pub fn discover(project_dir: Option<&Path>) -> Self {
        Self {
            port: resolve_port(&port_file_for(project_dir)),
            ..Self::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// `host:port` as passed to the resolver
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Port published by a running bridge, or [`FALLBACK_PORT`]
pub fn resolve_port(port_file: &Path) -> u16 {
    match read_port_file(port_file) {
        Some(port) => {
            info!(port, path = %port_file.display(), "Read bridge port from port file");
            port
        }
        None => {
            debug!(path = %port_file.display(), "No usable port file, using default port");
            FALLBACK_PORT
        }
    }
}

/// Port file location for a project directory
pub fn port_file_for(project_dir: Option<&Path>) -> PathBuf {
    port_file_path(project_dir, DEFAULT_PORT_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 6400);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.response_timeout, Duration::from_secs(86_400));
        assert_eq!(config.max_frame_bytes, 16 * 1024 * 1024);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_discover_reads_port_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_PORT_FILE_NAME), "6417").unwrap();

        let config = ClientConfig::discover(Some(dir.path()));
        assert_eq!(config.port, 6417);
        assert_eq!(config.address(), "localhost:6417");
    }

    #[test]
    fn test_garbage_port_file_falls_back() {
        let dir = tempdir().unwrap();
        let path = port_file_for(Some(dir.path()));
        std::fs::write(&path, "not-a-port").unwrap();
        assert_eq!(resolve_port(&path), FALLBACK_PORT);
    }

    #[test]
    fn test_missing_port_file_falls_back() {
        let dir = tempdir().unwrap();
        assert_eq!(resolve_port(&port_file_for(Some(dir.path()))), FALLBACK_PORT);
    }

    #[test]
    fn test_builder_overrides() {
        let config = ClientConfig::default().with_host("127.0.0.1").with_port(7000);
        assert_eq!(config.address(), "127.0.0.1:7000");
    }
}
