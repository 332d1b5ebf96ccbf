//! tickbridge-client: controller side of the tickbridge command bridge
//!
//! Discovers the bridge port from the project's port file and sends
//! commands over the loopback connection.

pub mod client;
pub mod config;

pub use client::BridgeClient;
pub use config::{port_file_for, resolve_port, ClientConfig, FALLBACK_PORT};
