//! Bridge lifecycle
//!
//! [`Bridge`] owns everything the network side of the bridge needs: the
//! negotiated listener, the running flag, the producer half of the command
//! queue, and the shutdown broadcast. The consumer half is handed out once at
//! construction and belongs to whatever drives host ticks.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tickbridge_utils::{remove_port_file, write_port_file, BridgeError, Result};

use crate::config::AppConfig;
use crate::port::PortNegotiator;
use crate::queue::{command_queue, QueueReceiver, QueueSender};
use crate::session::SessionSettings;
use crate::tcp::{run_tcp_accept_loop, AcceptorContext};


/// The network half of a running bridge
pub struct Bridge {
    config: AppConfig,
    port_file: PathBuf,
    queue: QueueSender,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    local_addr: Option<SocketAddr>,
    acceptor: Option<JoinHandle<()>>,
}

impl Bridge {
    /// Create a stopped bridge and the queue receiver its host drains
    pub fn new(config: AppConfig) -> (Self, QueueReceiver) {
        let (queue, receiver) = command_queue();
        let (shutdown_tx, _) = broadcast::channel(1);
        let port_file = config.discovery.port_file();

        let bridge = Self {
            config,
            port_file,
            queue,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            local_addr: None,
            acceptor: None,
        };
        (bridge, receiver)
    }

    /// Negotiate a port, publish it, and begin accepting connections
    pub async fn start(&mut self) -> Result<u16> {
        if self.is_running() {
            return Err(BridgeError::AlreadyRunning);
        }

        let (listener, port) = PortNegotiator::from_config(&self.config.network)
            .bind()
            .await?;
        let local_addr = listener.local_addr()?;

        // The listener is dropped on failure, so nothing is left bound
        write_port_file(&self.port_file, port)?;

        self.running.store(true, Ordering::SeqCst);
        self.local_addr = Some(local_addr);

        let ctx = AcceptorContext {
            queue: self.queue.clone(),
            settings: SessionSettings::from_config(&self.config.network),
            keepalive: self.config.network.keepalive,
            running: Arc::clone(&self.running),
            shutdown_tx: self.shutdown_tx.clone(),
        };
        self.acceptor = Some(tokio::spawn(run_tcp_accept_loop(listener, ctx)));

        info!(
            port,
            port_file = %self.port_file.display(),
            "Bridge started"
        );
        Ok(port)
    }

    /// Stop accepting, end every session, and withdraw the port file
    ///
    /// Safe to call on a bridge that is not running.
    pub async fn stop(&mut self) {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());

        if let Some(acceptor) = self.acceptor.take() {
            if let Err(e) = acceptor.await {
                warn!(error = %e, "Accept loop ended abnormally");
            }
        }

        if self.local_addr.take().is_some() {
            if let Err(e) = remove_port_file(&self.port_file) {
                warn!(error = %e, "Failed to remove port file");
            }
        }

        if was_running {
            info!("Bridge stopped");
        } else {
            debug!("Stop requested on a bridge that was not running");
        }
    }

    /// Stop, then start again on a freshly negotiated port
    pub async fn restart(&mut self) -> Result<u16> {
        self.stop().await;
        self.start().await
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Port currently being served
    pub fn port(&self) -> Option<u16> {
        self.local_addr.map(|addr| addr.port())
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn port_file(&self) -> &Path {
        &self.port_file
    }

    /// Requests waiting for the host's next tick
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        if self.running.swap(false, Ordering::SeqCst) {
            let _ = self.shutdown_tx.send(());
            if let Some(acceptor) = self.acceptor.take() {
                acceptor.abort();
            }
            if let Err(e) = remove_port_file(&self.port_file) {
                warn!(error = %e, "Failed to remove port file");
            }
        }
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("running", &self.is_running())
            .field("local_addr", &self.local_addr)
            .field("port_file", &self.port_file)
            .field("queue_len", &self.queue_len())
            .finish()
    }
}
