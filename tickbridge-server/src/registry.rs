//! Named handler capabilities
//!
//! The host registers one handler per command name before the bridge starts
//! serving. Handlers run only on the host thread, so they need not be `Send`.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::warn;

/// Failure reported by a handler
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    pub message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// A command capability provided by the host
pub trait CommandHandler {
    fn handle(&self, params: &Map<String, Value>) -> Result<Value, HandlerError>;
}

impl<F> CommandHandler for F
where
    F: Fn(&Map<String, Value>) -> Result<Value, HandlerError>,
{
    fn handle(&self, params: &Map<String, Value>) -> Result<Value, HandlerError> {
        self(params)
    }
}

/// Fixed mapping from command name to handler
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Box<dyn CommandHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one under the same name
    pub fn register<H>(&mut self, name: impl Into<String>, handler: H) -> &mut Self
    where
        H: CommandHandler + 'static,
    {
        let name = name.into();
        if self.handlers.insert(name.clone(), Box::new(handler)).is_some() {
            warn!(command = %name, "Replacing previously registered handler");
        }
        self
    }

    /// Look up a handler by exact name
    pub fn get(&self, name: &str) -> Option<&dyn CommandHandler> {
        self.handlers.get(name).map(|h| h.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}
