//! Configuration management for the bridge server
//!
//! Configuration is read once at startup from a TOML file; every section
//! falls back to its defaults when absent.

mod defaults;
mod loader;
mod schema;

pub use defaults::DEFAULT_CONFIG_TOML;
pub use loader::ConfigLoader;
pub use schema::*;
