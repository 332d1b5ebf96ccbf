//! Uniform success/error response shape

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Serialized pong reply, shared by the fast path and the dispatcher
pub const PONG_RESPONSE: &str = r#"{"status":"success","result":{"message":"pong"}}"#;

/// Maximum characters of a rejected payload echoed back for diagnostics
pub const RECEIVED_TEXT_LIMIT: usize = 50;

/// Maximum characters of each parameter value in a failure summary
pub const PARAM_VALUE_LIMIT: usize = 20;

/// Envelope status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Response returned for every request
///
/// Field order is the wire order: `status`, then `result` or `error`, then
/// any diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Truncated echo of a payload that failed structural validation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_text: Option<String>,
    /// Command whose handler failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// `name: value` pairs of the failed command's parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params_summary: Option<String>,
}

impl ResponseEnvelope {
    /// Successful response wrapping a handler result
    pub fn success(result: Value) -> Self {
        Self {
            status: Status::Success,
            result: Some(result),
            error: None,
            received_text: None,
            command: None,
            params_summary: None,
        }
    }

    /// Reply to the liveness probe
    pub fn pong() -> Self {
        Self::success(serde_json::json!({ "message": "pong" }))
    }

    /// Error response with a message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            result: None,
            error: Some(message.into()),
            received_text: None,
            command: None,
            params_summary: None,
        }
    }

    /// Attach a truncated echo of the rejected payload
    pub fn with_received_text(mut self, text: &str) -> Self {
        self.received_text = Some(truncate_with_ellipsis(text, RECEIVED_TEXT_LIMIT));
        self
    }

    /// Attach the name of the failed command
    pub fn with_command(mut self, name: impl Into<String>) -> Self {
        self.command = Some(name.into());
        self
    }

    /// Attach a summary of the failed command's parameters
    pub fn with_params_summary(mut self, params: &Map<String, Value>) -> Self {
        self.params_summary = Some(summarize_params(params));
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Serialize to a single-line response frame
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Keep the first `max` characters, appending `...` when anything was cut
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Render parameters as `name: value` pairs, each value cut to
/// [`PARAM_VALUE_LIMIT`] characters
pub fn summarize_params(params: &Map<String, Value>) -> String {
    params
        .iter()
        .map(|(name, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let cut: String = rendered.chars().take(PARAM_VALUE_LIMIT).collect();
            format!("{}: {}", name, cut)
        })
        .collect::<Vec<_>>()
        .join(", ")
}
