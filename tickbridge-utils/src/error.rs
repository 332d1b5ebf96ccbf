//! Error types for tickbridge
//!
//! Provides a unified error type used across all tickbridge crates.

use std::path::PathBuf;

/// Main error type for tickbridge operations
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    // === IO Errors ===

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // === Startup Errors ===

    #[error("No free port available in range {start}-{end}")]
    NoPortAvailable { start: u16, end: u16 },

    #[error("Failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        source: std::io::Error,
    },

    #[error("Bridge is already running")]
    AlreadyRunning,

    // === Connection Errors ===

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Connection timeout after {seconds}s")]
    ConnectionTimeout { seconds: u64 },

    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    // === Protocol Errors ===

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    // === Configuration Errors ===

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    // === Internal Errors ===

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. }
            | Self::Connection(_)
        )
    }

    /// Check if this error must abort bridge startup
    pub fn is_startup_fatal(&self) -> bool {
        matches!(self, Self::NoPortAvailable { .. } | Self::Bind { .. })
    }
}

/// Result type alias using BridgeError
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Display Tests ====================

    #[test]
    fn test_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = BridgeError::Io(io_err);
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_error_display_file_write() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        let err = BridgeError::FileWrite {
            path: PathBuf::from("/project/bridge-port.txt"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to write file"));
        assert!(msg.contains("bridge-port.txt"));
    }

    #[test]
    fn test_error_display_no_port_available() {
        let err = BridgeError::NoPortAvailable {
            start: 6400,
            end: 6499,
        };
        assert_eq!(err.to_string(), "No free port available in range 6400-6499");
    }

    #[test]
    fn test_error_display_bind() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = BridgeError::Bind {
            port: 6400,
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("6400"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_error_display_lifecycle() {
        assert_eq!(BridgeError::AlreadyRunning.to_string(), "Bridge is already running");
    }

    #[test]
    fn test_error_display_connection_timeout() {
        let err = BridgeError::ConnectionTimeout { seconds: 30 };
        assert_eq!(err.to_string(), "Connection timeout after 30s");
    }

    #[test]
    fn test_error_display_config_invalid() {
        let err = BridgeError::ConfigInvalid {
            path: PathBuf::from("/home/user/.config/tickbridge/config.toml"),
            message: "syntax error".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Invalid configuration"));
        assert!(msg.contains("config.toml"));
        assert!(msg.contains("syntax error"));
    }

    // ==================== Classification Tests ====================

    #[test]
    fn test_retryable() {
        assert!(BridgeError::ConnectionTimeout { seconds: 5 }.is_retryable());
        assert!(BridgeError::Connection("refused".into()).is_retryable());
        assert!(!BridgeError::ConnectionClosed.is_retryable());
        assert!(!BridgeError::Protocol("bad".into()).is_retryable());
    }

    #[test]
    fn test_startup_fatal() {
        assert!(BridgeError::NoPortAvailable { start: 1, end: 2 }.is_startup_fatal());
        let bind = BridgeError::Bind {
            port: 1,
            source: std::io::Error::new(std::io::ErrorKind::Other, "x"),
        };
        assert!(bind.is_startup_fatal());
        assert!(!BridgeError::AlreadyRunning.is_startup_fatal());
    }

    // ==================== Helper Function Tests ====================

    #[test]
    fn test_helpers() {
        assert!(matches!(BridgeError::connection("x"), BridgeError::Connection(_)));
        assert!(matches!(BridgeError::protocol("x"), BridgeError::Protocol(_)));
        assert!(matches!(BridgeError::config("x"), BridgeError::Config(_)));
        assert_eq!(
            BridgeError::internal("invariant violated").to_string(),
            "Internal error: invariant violated"
        );
    }

    #[test]
    fn test_from_io_error_preserves_kind() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: BridgeError = io_err.into();
        if let BridgeError::Io(inner) = err {
            assert_eq!(inner.kind(), std::io::ErrorKind::PermissionDenied);
        } else {
            panic!("Expected Io variant");
        }
    }
}
