//! Command dispatch
//!
//! Turns one raw request payload into exactly one response envelope. Every
//! failure mode, including a panicking handler, ends up as an error envelope;
//! nothing escapes to the caller.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, warn};

use tickbridge_protocol::{
    is_ping_frame, looks_like_json, Command, CommandParseError, ResponseEnvelope,
};

use crate::registry::{HandlerError, HandlerRegistry};

/// Routes parsed commands to registered handlers
#[derive(Debug)]
pub struct CommandDispatcher {
    registry: HandlerRegistry,
}

impl CommandDispatcher {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Execute a raw request payload
    pub fn execute(&self, raw: &str) -> ResponseEnvelope {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return ResponseEnvelope::error("Empty command received");
        }

        if is_ping_frame(trimmed) {
            return ResponseEnvelope::pong();
        }

        if !looks_like_json(trimmed) {
            return ResponseEnvelope::error("Invalid JSON format").with_received_text(trimmed);
        }

        let command = match Command::parse(trimmed) {
            Ok(command) => command,
            Err(CommandParseError::InvalidJson(e)) => {
                debug!(error = %e, "Rejected malformed JSON payload");
                return ResponseEnvelope::error("Invalid JSON format").with_received_text(trimmed);
            }
            Err(CommandParseError::NotACommand(e)) => {
                return ResponseEnvelope::error(format!(
                    "Valid JSON but not a valid command: {}",
                    e
                ))
                .with_received_text(trimmed);
            }
        };

        if command.name.is_empty() {
            return ResponseEnvelope::error("Command type cannot be empty");
        }

        if command.is_ping() {
            return ResponseEnvelope::pong();
        }

        self.dispatch(&command)
    }

    /// Route an already parsed command
    pub fn dispatch(&self, command: &Command) -> ResponseEnvelope {
        let Some(handler) = self.registry.get(&command.name) else {
            return ResponseEnvelope::error(format!(
                "Unknown or unsupported command type: {}",
                command.name
            ));
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| handler.handle(&command.parameters)));

        match outcome {
            Ok(Ok(result)) => ResponseEnvelope::success(result),
            Ok(Err(err)) => {
                warn!(command = %command.name, error = %err, "Handler failed");
                failure_envelope(err, command)
            }
            Err(payload) => {
                let err = HandlerError::new(panic_message(payload.as_ref()));
                warn!(command = %command.name, error = %err, "Handler panicked");
                failure_envelope(err, command)
            }
        }
    }
}

fn failure_envelope(err: HandlerError, command: &Command) -> ResponseEnvelope {
    ResponseEnvelope::error(format!("Error executing command: {}", err.message))
        .with_command(command.name.clone())
        .with_params_summary(&command.parameters)
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};
    use tickbridge_protocol::{Status, PONG_RESPONSE};

    fn dispatcher() -> CommandDispatcher {
        let mut registry = HandlerRegistry::new();
        registry
            .register("echo", |params: &Map<String, Value>| -> Result<Value, HandlerError> {
                Ok(Value::Object(params.clone()))
            })
            .register("fail", |_: &Map<String, Value>| -> Result<Value, HandlerError> {
                Err(HandlerError::new("scene not found"))
            })
            .register("explode", |_: &Map<String, Value>| -> Result<Value, HandlerError> {
                panic!("handler blew up")
            });
        CommandDispatcher::new(registry)
    }

    fn to_json(envelope: &ResponseEnvelope) -> String {
        envelope.to_json().unwrap()
    }

    // ==================== Malformed Input Tests ====================

    #[test]
    fn test_empty_payload() {
        let env = dispatcher().execute("   \r\n ");
        assert_eq!(env.status, Status::Error);
        assert_eq!(env.error.as_deref(), Some("Empty command received"));
    }

    #[test]
    fn test_not_json_example() {
        let env = dispatcher().execute("not json");
        assert_eq!(
            to_json(&env),
            r#"{"status":"error","error":"Invalid JSON format","receivedText":"not json"}"#
        );
    }

    #[test]
    fn test_not_json_long_payload_truncated() {
        let payload = format!("garbage {}", "x".repeat(100));
        let env = dispatcher().execute(&payload);
        let received = env.received_text.unwrap();
        assert_eq!(received.chars().count(), 53);
        assert!(received.ends_with("..."));
        assert!(payload.starts_with(received.trim_end_matches("...")));
    }

    #[test]
    fn test_braced_but_invalid_json() {
        let env = dispatcher().execute("{type: echo}");
        assert_eq!(env.error.as_deref(), Some("Invalid JSON format"));
        assert_eq!(env.received_text.as_deref(), Some("{type: echo}"));
    }

    #[test]
    fn test_valid_json_not_a_command() {
        let env = dispatcher().execute(r#"{"params":{}}"#);
        let error = env.error.unwrap();
        assert!(error.starts_with("Valid JSON but not a valid command"));
    }

    #[test]
    fn test_array_is_not_a_command() {
        let env = dispatcher().execute("[1,2]");
        assert!(env.error.unwrap().starts_with("Valid JSON but not a valid command"));
    }

    #[test]
    fn test_empty_command_type() {
        let env = dispatcher().execute(r#"{"type":"","params":{}}"#);
        assert_eq!(env.error.as_deref(), Some("Command type cannot be empty"));
    }

    // ==================== Ping Tests ====================

    #[test]
    fn test_literal_ping() {
        assert_eq!(to_json(&dispatcher().execute("ping")), PONG_RESPONSE);
        assert_eq!(to_json(&dispatcher().execute("  ping \n")), PONG_RESPONSE);
    }

    #[test]
    fn test_command_ping_case_insensitive() {
        let d = dispatcher();
        assert_eq!(to_json(&d.execute(r#"{"type":"ping"}"#)), PONG_RESPONSE);
        assert_eq!(to_json(&d.execute(r#"{"type":"PING","params":{}}"#)), PONG_RESPONSE);
    }

    // ==================== Routing Tests ====================

    #[test]
    fn test_unknown_command_names_type() {
        let env = dispatcher().execute(r#"{"type":"read_console","params":{}}"#);
        assert_eq!(
            to_json(&env),
            r#"{"status":"error","error":"Unknown or unsupported command type: read_console"}"#
        );
    }

    #[test]
    fn test_success_wraps_handler_result_losslessly() {
        let params = json!({
            "nested": {"list": [1, 2.5, "three", null, true]},
            "unicode": "héllo ✓",
            "big": 9007199254740991u64
        });
        let payload = json!({"type": "echo", "params": params}).to_string();

        let env = dispatcher().execute(&payload);
        assert_eq!(env.status, Status::Success);
        assert_eq!(env.result, Some(params));
        assert!(env.error.is_none());
    }

    #[test]
    fn test_missing_params_reaches_handler_as_empty() {
        let env = dispatcher().execute(r#"{"type":"echo"}"#);
        assert_eq!(env.result, Some(json!({})));
    }

    // ==================== Handler Failure Tests ====================

    #[test]
    fn test_handler_error_becomes_envelope() {
        let env = dispatcher()
            .execute(r#"{"type":"fail","params":{"scene":"Assets/Scenes/VeryLongSceneName.unity"}}"#);
        assert_eq!(env.status, Status::Error);
        assert!(env.error.as_deref().unwrap().contains("scene not found"));
        assert_eq!(env.command.as_deref(), Some("fail"));
        assert_eq!(env.params_summary.as_deref(), Some("scene: Assets/Scenes/VeryLo"));
    }

    #[test]
    fn test_handler_panic_becomes_envelope() {
        let env = dispatcher().execute(r#"{"type":"explode","params":{"n":1}}"#);
        assert_eq!(env.status, Status::Error);
        assert!(env.error.as_deref().unwrap().contains("handler blew up"));
        assert_eq!(env.command.as_deref(), Some("explode"));
        assert_eq!(env.params_summary.as_deref(), Some("n: 1"));
    }

    #[test]
    fn test_dispatcher_usable_after_panic() {
        let d = dispatcher();
        let _ = d.execute(r#"{"type":"explode"}"#);
        let env = d.execute(r#"{"type":"echo","params":{"a":1}}"#);
        assert!(env.is_success());
    }

    #[test]
    fn test_panic_message_variants() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "static");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(boxed.as_ref()), "handler panicked");
    }
}
