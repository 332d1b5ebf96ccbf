//! tickbridge-utils: Common utilities shared across tickbridge crates
//!
//! This crate provides:
//! - Unified error types ([`BridgeError`], [`Result`])
//! - Logging infrastructure ([`init_logging`], [`LogConfig`])
//! - XDG-compliant path utilities and the port discovery file ([`paths`] module)

pub mod error;
pub mod logging;
pub mod paths;

// Re-export main types at crate root for convenience
pub use error::{BridgeError, Result};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogOutput};

// Re-export commonly used path functions
pub use paths::{
    config_dir, config_file, log_dir, port_file_path, read_port_file, remove_port_file,
    state_dir, write_port_file, DEFAULT_PORT_FILE_NAME,
};
