//! Per-connection request/response loop
//!
//! A session reads one frame, answers it, and only then reads the next, so
//! requests from one client are executed strictly in the order sent.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_util::codec::Framed;
use tracing::{debug, trace, warn};

use tickbridge_protocol::{is_ping_frame, CodecError, ResponseEnvelope, ServerCodec, PONG_RESPONSE};

use crate::config::NetworkConfig;
use crate::queue::QueueSender;

const NOT_ACCEPTING: &str = "Bridge is not accepting commands";
const SHUTTING_DOWN: &str = "Bridge is shutting down";
const DROPPED: &str = "Request was dropped before a response was produced";

/// Settings every session is created with
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub read_timeout: Duration,
    pub max_frame_bytes: usize,
}

impl SessionSettings {
    pub fn from_config(config: &NetworkConfig) -> Self {
        Self {
            read_timeout: config.read_timeout(),
            max_frame_bytes: config.max_frame_bytes,
        }
    }
}

/// How a single request was answered
enum Reply {
    Respond(String),
    RespondAndClose(String),
}

/// One accepted connection
pub struct ClientSession {
    peer: SocketAddr,
    framed: Framed<TcpStream, ServerCodec>,
    queue: QueueSender,
    read_timeout: Duration,
    running: Arc<AtomicBool>,
    shutdown: broadcast::Receiver<()>,
}

impl ClientSession {
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        queue: QueueSender,
        settings: &SessionSettings,
        running: Arc<AtomicBool>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            peer,
            framed: Framed::new(
                stream,
                ServerCodec::with_max_frame_size(settings.max_frame_bytes),
            ),
            queue,
            read_timeout: settings.read_timeout,
            running,
            shutdown,
        }
    }

    /// Serve requests until the peer leaves, the connection idles out, or
    /// the bridge shuts down
    pub async fn run(mut self) {
        debug!(peer = %self.peer, "Session started");

        loop {
            // A stop that landed before this session subscribed is only
            // visible through the flag
            if !self.running.load(Ordering::SeqCst) {
                debug!(peer = %self.peer, "Bridge stopped, closing session");
                break;
            }

            let frame = tokio::select! {
                _ = self.shutdown.recv() => {
                    debug!(peer = %self.peer, "Session closing for shutdown");
                    break;
                }
                next = tokio::time::timeout(self.read_timeout, self.framed.next()) => {
                    match next {
                        Err(_) => {
                            debug!(
                                peer = %self.peer,
                                timeout_secs = self.read_timeout.as_secs(),
                                "Session idle, closing"
                            );
                            break;
                        }
                        Ok(None) => {
                            debug!(peer = %self.peer, "Peer closed connection");
                            break;
                        }
                        Ok(Some(Err(e))) => {
                            warn!(peer = %self.peer, error = %e, "Read failed, closing session");
                            break;
                        }
                        Ok(Some(Ok(frame))) => frame,
                    }
                }
            };

            let (response, close) = match self.respond(frame).await {
                Reply::Respond(response) => (response, false),
                Reply::RespondAndClose(response) => (response, true),
            };

            match self.framed.send(response).await {
                Ok(()) => {}
                Err(CodecError::FrameTooLarge { size, max }) => {
                    warn!(peer = %self.peer, size, max, "Response exceeds frame limit");
                    let message = format!("Response too large: {} bytes (max {})", size, max);
                    if let Err(e) = self.framed.send(error_json(&message)).await {
                        warn!(peer = %self.peer, error = %e, "Write failed, closing session");
                        break;
                    }
                }
                Err(e) => {
                    warn!(peer = %self.peer, error = %e, "Write failed, closing session");
                    break;
                }
            }
            if close {
                break;
            }
        }

        debug!(peer = %self.peer, "Session ended");
    }

    async fn respond(&mut self, frame: String) -> Reply {
        if is_ping_frame(&frame) {
            trace!(peer = %self.peer, "Answered ping without queueing");
            return Reply::Respond(PONG_RESPONSE.to_string());
        }

        let (request_id, response) = match self.queue.submit(frame) {
            Ok(submitted) => submitted,
            Err(e) => {
                warn!(peer = %self.peer, error = %e, "Rejecting request");
                return Reply::RespondAndClose(error_json(NOT_ACCEPTING));
            }
        };

        tokio::select! {
            resolved = response => match resolved {
                Ok(json) => {
                    trace!(peer = %self.peer, request_id = %request_id, "Response ready");
                    Reply::Respond(json)
                }
                Err(_) => {
                    warn!(peer = %self.peer, request_id = %request_id, "Request dropped unresolved");
                    Reply::Respond(error_json(DROPPED))
                }
            },
            _ = self.shutdown.recv() => {
                debug!(peer = %self.peer, request_id = %request_id, "Shutdown while awaiting response");
                Reply::RespondAndClose(error_json(SHUTTING_DOWN))
            }
        }
    }
}

fn error_json(message: &str) -> String {
    ResponseEnvelope::error(message)
        .to_json()
        .unwrap_or_else(|_| format!(r#"{{"status":"error","error":"{}"}}"#, message))
}
