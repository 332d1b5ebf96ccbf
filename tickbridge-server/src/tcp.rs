//! TCP accept loop

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use socket2::SockRef;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::queue::QueueSender;
use crate::session::{ClientSession, SessionSettings};

/// Everything the accept loop hands to new sessions
#[derive(Debug, Clone)]
pub struct AcceptorContext {
    pub queue: QueueSender,
    pub settings: SessionSettings,
    pub keepalive: bool,
    pub running: Arc<AtomicBool>,
    pub shutdown_tx: broadcast::Sender<()>,
}

/// Run the TCP accept loop
///
/// Each connection gets its own session task; the loop never waits on them.
pub async fn run_tcp_accept_loop(listener: TcpListener, ctx: AcceptorContext) {
    let mut shutdown_rx = ctx.shutdown_tx.subscribe();

    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Accepting connections");
    }

    while ctx.running.load(Ordering::SeqCst) {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        debug!(%peer, "New TCP connection");
                        configure_stream(&stream, ctx.keepalive);

                        let session = ClientSession::new(
                            stream,
                            peer,
                            ctx.queue.clone(),
                            &ctx.settings,
                            Arc::clone(&ctx.running),
                            ctx.shutdown_tx.subscribe(),
                        );
                        tokio::spawn(session.run());
                    }
                    Err(e) => {
                        error!(error = %e, "TCP accept error");
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Shutdown signal received, stopping TCP accept loop");
                break;
            }
        }
    }
}

fn configure_stream(stream: &TcpStream, keepalive: bool) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(error = %e, "Failed to set TCP_NODELAY");
    }
    if keepalive {
        if let Err(e) = SockRef::from(stream).set_keepalive(true) {
            warn!(error = %e, "Failed to enable keepalive");
        }
    }
}
