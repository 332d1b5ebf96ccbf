//! Command requests sent by the controller

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Liveness probe, accepted both as a bare frame and as a command name
pub const PING: &str = "ping";

/// A parsed controller request
///
/// Wire form: `{"type": "<name>", "params": {...}}`. A missing or `null`
/// `params` field is an empty parameter object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "type")]
    pub name: String,
    #[serde(rename = "params", default, deserialize_with = "null_as_empty")]
    pub parameters: Map<String, Value>,
}

/// Why a payload could not be turned into a [`Command`]
#[derive(Debug, thiserror::Error)]
pub enum CommandParseError {
    /// The payload is not JSON at all
    #[error("Invalid JSON format: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// The payload is JSON but does not have the command shape
    #[error("Valid JSON but not a valid command: {0}")]
    NotACommand(#[source] serde_json::Error),
}

impl Command {
    /// Create a command with the given parameters
    pub fn new(name: impl Into<String>, parameters: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }

    /// Parse a request payload
    pub fn parse(text: &str) -> Result<Self, CommandParseError> {
        let value: Value = serde_json::from_str(text).map_err(CommandParseError::InvalidJson)?;
        serde_json::from_value(value).map_err(CommandParseError::NotACommand)
    }

    /// Whether this is the liveness probe (case-insensitive)
    pub fn is_ping(&self) -> bool {
        self.name.eq_ignore_ascii_case(PING)
    }

    /// Serialize to a single-line request frame
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Whether a payload is the bare `ping` frame
pub fn is_ping_frame(text: &str) -> bool {
    text.trim() == PING
}

/// Cheap structural check that a payload is a JSON object or array
///
/// Only the outer delimiters are inspected; full parsing happens later.
pub fn looks_like_json(text: &str) -> bool {
    let trimmed = text.trim();
    (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ==================== Parse Tests ====================

    #[test]
    fn test_parse_full_command() {
        let cmd = Command::parse(r#"{"type":"manage_scene","params":{"action":"load","path":"a.unity"}}"#)
            .unwrap();
        assert_eq!(cmd.name, "manage_scene");
        assert_eq!(cmd.parameters.get("action"), Some(&json!("load")));
        assert_eq!(cmd.parameters.len(), 2);
    }

    #[test]
    fn test_parse_missing_params_is_empty() {
        let cmd = Command::parse(r#"{"type":"read_console"}"#).unwrap();
        assert_eq!(cmd.name, "read_console");
        assert!(cmd.parameters.is_empty());
    }

    #[test]
    fn test_parse_null_params_is_empty() {
        let cmd = Command::parse(r#"{"type":"read_console","params":null}"#).unwrap();
        assert!(cmd.parameters.is_empty());
    }

    #[test]
    fn test_parse_ignores_unknown_fields() {
        let cmd = Command::parse(r#"{"type":"x","params":{},"id":7}"#).unwrap();
        assert_eq!(cmd.name, "x");
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = Command::parse("{not json}").unwrap_err();
        assert!(matches!(err, CommandParseError::InvalidJson(_)));
    }

    #[test]
    fn test_parse_json_without_type() {
        let err = Command::parse(r#"{"params":{}}"#).unwrap_err();
        assert!(matches!(err, CommandParseError::NotACommand(_)));
    }

    #[test]
    fn test_parse_array_is_not_a_command() {
        let err = Command::parse("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, CommandParseError::NotACommand(_)));
    }

    #[test]
    fn test_parse_params_must_be_object() {
        let err = Command::parse(r#"{"type":"x","params":[1]}"#).unwrap_err();
        assert!(matches!(err, CommandParseError::NotACommand(_)));
    }

    #[test]
    fn test_parse_empty_type_is_accepted() {
        // Empty names are rejected by the dispatcher, not the parser
        let cmd = Command::parse(r#"{"type":""}"#).unwrap();
        assert!(cmd.name.is_empty());
    }

    // ==================== Ping Tests ====================

    #[test]
    fn test_is_ping_case_insensitive() {
        assert!(Command::new("ping", Map::new()).is_ping());
        assert!(Command::new("PING", Map::new()).is_ping());
        assert!(Command::new("Ping", Map::new()).is_ping());
        assert!(!Command::new("pong", Map::new()).is_ping());
    }

    #[test]
    fn test_is_ping_frame() {
        assert!(is_ping_frame("ping"));
        assert!(is_ping_frame("  ping\r\n"));
        assert!(!is_ping_frame("PING"));
        assert!(!is_ping_frame("ping me"));
    }

    // ==================== Structural Check Tests ====================

    #[test]
    fn test_looks_like_json() {
        assert!(looks_like_json("{}"));
        assert!(looks_like_json("  {\"a\":1}  "));
        assert!(looks_like_json("[]"));
        assert!(!looks_like_json("not json"));
        assert!(!looks_like_json("{unterminated"));
        assert!(!looks_like_json("\"string\""));
        assert!(!looks_like_json("42"));
        assert!(!looks_like_json(""));
    }

    // ==================== Frame Tests ====================

    #[test]
    fn test_to_frame_is_single_line() {
        let mut params = Map::new();
        params.insert("text".into(), json!("line one\nline two"));
        let frame = Command::new("echo", params).to_frame().unwrap();
        assert!(!frame.contains('\n'));
        assert_eq!(Command::parse(&frame).unwrap().name, "echo");
    }
}
