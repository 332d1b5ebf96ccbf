//! Port negotiation
//!
//! Binds the first free port of a configured loopback range. A port that is
//! already taken moves the scan along; any other bind failure is fatal.

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr};

use tokio::net::TcpListener;
use tracing::{debug, info};

use tickbridge_utils::{BridgeError, Result};

use crate::config::NetworkConfig;

/// Scans an inclusive port range for a bindable port
#[derive(Debug, Clone)]
pub struct PortNegotiator {
    address: IpAddr,
    base_port: u16,
    max_port: u16,
}

impl PortNegotiator {
    pub fn new(address: IpAddr, base_port: u16, max_port: u16) -> Self {
        Self {
            address,
            base_port,
            max_port,
        }
    }

    pub fn from_config(config: &NetworkConfig) -> Self {
        Self::new(config.bind_address, config.base_port, config.max_port)
    }

    /// Bind the first available port, returning the listener and its port
    pub async fn bind(&self) -> Result<(TcpListener, u16)> {
        let mut port = self.base_port;

        loop {
            let addr = SocketAddr::new(self.address, port);
            match TcpListener::bind(addr).await {
                Ok(listener) => {
                    let bound = listener.local_addr().map(|a| a.port()).unwrap_or(port);
                    info!(port = bound, "Bound bridge listener");
                    return Ok((listener, bound));
                }
                Err(e) if e.kind() == ErrorKind::AddrInUse => {
                    debug!(port, "Port in use, trying next");
                }
                Err(e) => return Err(BridgeError::Bind { port, source: e }),
            }

            port = match port.checked_add(1) {
                Some(next) if next <= self.max_port => next,
                _ => {
                    return Err(BridgeError::NoPortAvailable {
                        start: self.base_port,
                        end: self.max_port,
                    })
                }
            };
        }
    }
}
