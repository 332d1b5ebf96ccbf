//! tickbridge-protocol: Wire contract between the bridge and its controller
//!
//! This crate defines the request and response shapes and the framing used
//! over the loopback connection, so both sides agree on one definition.

pub mod codec;
pub mod command;
pub mod envelope;

// Re-export main types at crate root
pub use codec::{ClientCodec, CodecError, ServerCodec, DEFAULT_MAX_FRAME_SIZE};
pub use command::{is_ping_frame, looks_like_json, Command, CommandParseError, PING};
pub use envelope::{
    summarize_params, truncate_with_ellipsis, ResponseEnvelope, Status, PARAM_VALUE_LIMIT,
    PONG_RESPONSE, RECEIVED_TEXT_LIMIT,
};
