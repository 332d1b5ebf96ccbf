//! Message codec for IPC framing
//!
//! Frames are UTF-8 text terminated by `\n`; a `\r` before the terminator is
//! dropped. One frame carries exactly one request or one response.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::envelope::ResponseEnvelope;

/// Default maximum frame size (16 MB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Protocol codec error
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("Frame is not valid UTF-8")]
    InvalidUtf8,

    #[error("Outgoing frame contains a raw newline")]
    EmbeddedNewline,

    #[error("Malformed response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Shared newline framing state
#[derive(Debug, Clone)]
struct LineFraming {
    max_frame_size: usize,
    /// Bytes already scanned for a terminator
    next_index: usize,
}

impl LineFraming {
    fn new(max_frame_size: usize) -> Self {
        Self {
            max_frame_size,
            next_index: 0,
        }
    }

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, CodecError> {
        let newline = src[self.next_index..].iter().position(|b| *b == b'\n');

        match newline {
            Some(offset) => {
                let end = self.next_index + offset;
                self.next_index = 0;

                if end > self.max_frame_size {
                    return Err(CodecError::FrameTooLarge {
                        size: end,
                        max: self.max_frame_size,
                    });
                }

                let mut line = src.split_to(end + 1);
                line.truncate(end);
                frame_to_string(line).map(Some)
            }
            None => {
                if src.len() > self.max_frame_size {
                    return Err(CodecError::FrameTooLarge {
                        size: src.len(),
                        max: self.max_frame_size,
                    });
                }
                self.next_index = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, CodecError> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        self.next_index = 0;
        if src.is_empty() {
            return Ok(None);
        }
        let rest = src.split_to(src.len());
        frame_to_string(rest).map(Some)
    }

    fn encode(&self, frame: &str, dst: &mut BytesMut) -> Result<(), CodecError> {
        if frame.contains('\n') {
            return Err(CodecError::EmbeddedNewline);
        }
        if frame.len() > self.max_frame_size {
            return Err(CodecError::FrameTooLarge {
                size: frame.len(),
                max: self.max_frame_size,
            });
        }

        dst.reserve(frame.len() + 1);
        dst.put_slice(frame.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}

fn frame_to_string(mut line: BytesMut) -> Result<String, CodecError> {
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }
    String::from_utf8(line.to_vec()).map_err(|_| CodecError::InvalidUtf8)
}

/// Codec for raw request frames (decoding) and serialized responses (encoding)
/// Used by the bridge side
#[derive(Debug, Clone)]
pub struct ServerCodec {
    framing: LineFraming,
}

impl ServerCodec {
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            framing: LineFraming::new(max_frame_size),
        }
    }
}

impl Default for ServerCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ServerCodec {
    type Item = String;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.framing.decode(src)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.framing.decode_eof(src)
    }
}

impl Encoder<String> for ServerCodec {
    type Error = CodecError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.framing.encode(&item, dst)
    }
}

/// Codec for raw request frames (encoding) and response envelopes (decoding)
/// Used by the controller side
#[derive(Debug, Clone)]
pub struct ClientCodec {
    framing: LineFraming,
}

impl ClientCodec {
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            framing: LineFraming::new(max_frame_size),
        }
    }
}

impl Default for ClientCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ClientCodec {
    type Item = ResponseEnvelope;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.framing.decode(src)? {
            Some(frame) => Ok(Some(serde_json::from_str(&frame)?)),
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.framing.decode_eof(src)? {
            Some(frame) => Ok(Some(serde_json::from_str(&frame)?)),
            None => Ok(None),
        }
    }
}

impl Encoder<String> for ClientCodec {
    type Error = CodecError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.framing.encode(&item, dst)
    }
}
