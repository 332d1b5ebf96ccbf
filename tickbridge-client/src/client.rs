//! One-shot client for the bridge
//!
//! Each request is written as a single frame and answered by exactly one
//! response envelope on the same connection.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Map, Value};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use tickbridge_protocol::{ClientCodec, CodecError, Command, ResponseEnvelope, PING};
use tickbridge_utils::{BridgeError, Result};

use crate::config::ClientConfig;

/// Connected client
pub struct BridgeClient {
    framed: Framed<TcpStream, ClientCodec>,
    response_timeout: Duration,
}

impl BridgeClient {
    /// Connect, retrying up to `max_retries` attempts
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let addr = config.address();
        let attempts = config.max_retries.max(1);
        let mut attempt = 1;

        loop {
            let error = match timeout(config.connect_timeout, TcpStream::connect(&addr)).await {
                Ok(Ok(stream)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(error = %e, "Failed to set TCP_NODELAY");
                    }
                    debug!(%addr, attempt, "Connected to bridge");
                    return Ok(Self {
                        framed: Framed::new(
                            stream,
                            ClientCodec::with_max_frame_size(config.max_frame_bytes),
                        ),
                        response_timeout: config.response_timeout,
                    });
                }
                Ok(Err(e)) => {
                    BridgeError::connection(format!("Failed to connect to {}: {}", addr, e))
                }
                Err(_) => BridgeError::ConnectionTimeout {
                    seconds: config.connect_timeout.as_secs(),
                },
            };

            if attempt >= attempts || !error.is_retryable() {
                return Err(error);
            }

            warn!(%addr, attempt, max = attempts, error = %error, "Connection attempt failed, retrying");
            tokio::time::sleep(config.retry_delay).await;
            attempt += 1;
        }
    }

    /// Check the bridge is alive
    pub async fn ping(&mut self) -> Result<()> {
        let envelope = self.request_raw(PING).await?;
        let is_pong = envelope.is_success()
            && envelope
                .result
                .as_ref()
                .and_then(|r| r.get("message"))
                .and_then(Value::as_str)
                == Some("pong");

        if is_pong {
            Ok(())
        } else {
            Err(BridgeError::protocol("Unexpected reply to ping"))
        }
    }

    /// Run a named command and return its result
    ///
    /// An error envelope becomes [`BridgeError::Protocol`] carrying its message.
    pub async fn send_command(
        &mut self,
        name: &str,
        params: Map<String, Value>,
    ) -> Result<Value> {
        let frame = Command::new(name, params)
            .to_frame()
            .map_err(|e| BridgeError::protocol(format!("Failed to encode command: {}", e)))?;

        let envelope = self.request_raw(&frame).await?;
        if envelope.is_success() {
            Ok(envelope.result.unwrap_or(Value::Null))
        } else {
            Err(BridgeError::Protocol(
                envelope
                    .error
                    .unwrap_or_else(|| "Bridge reported an error".to_string()),
            ))
        }
    }

    /// Send one frame verbatim and wait for its envelope
    pub async fn request_raw(&mut self, text: &str) -> Result<ResponseEnvelope> {
        self.framed
            .send(text.to_string())
            .await
            .map_err(|e| match e {
                CodecError::EmbeddedNewline | CodecError::FrameTooLarge { .. } => {
                    BridgeError::protocol(e.to_string())
                }
                other => BridgeError::connection(format!("Failed to send: {}", other)),
            })?;

        match timeout(self.response_timeout, self.framed.next()).await {
            Ok(Some(Ok(envelope))) => Ok(envelope),
            Ok(Some(Err(CodecError::Json(e)))) => Err(BridgeError::InvalidMessage(e.to_string())),
            Ok(Some(Err(e))) => Err(BridgeError::connection(format!("Failed to receive: {}", e))),
            Ok(None) => Err(BridgeError::ConnectionClosed),
            Err(_) => Err(BridgeError::ConnectionTimeout {
                seconds: self.response_timeout.as_secs(),
            }),
        }
    }
}
