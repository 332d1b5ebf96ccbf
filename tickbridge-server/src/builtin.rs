//! Demonstration handlers registered by the server binary

use std::time::Instant;

use serde_json::{json, Map, Value};

use crate::registry::{HandlerError, HandlerRegistry};

/// Returns its parameter object unchanged
pub fn echo(params: &Map<String, Value>) -> Result<Value, HandlerError> {
    Ok(Value::Object(params.clone()))
}

/// Reports the serving port, crate version and uptime
pub fn bridge_info(
    port: u16,
    started: Instant,
) -> impl Fn(&Map<String, Value>) -> Result<Value, HandlerError> {
    move |_: &Map<String, Value>| -> Result<Value, HandlerError> {
        Ok(json!({
            "port": port,
            "version": env!("CARGO_PKG_VERSION"),
            "uptime_ms": started.elapsed().as_millis() as u64,
        }))
    }
}

/// Registry holding every built-in handler
pub fn builtin_registry(port: u16) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register("echo", echo)
        .register("get_bridge_info", bridge_info(port, Instant::now()));
    registry
}
