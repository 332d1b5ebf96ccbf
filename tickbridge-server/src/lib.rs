//! tickbridge-server: loopback command bridge into a tick-driven host
//!
//! Clients connect over TCP and send one request per line. Requests are
//! queued and executed only inside the host's own periodic tick, one drain
//! pass at a time; each client waits for its own response.
//!
//! - [`Bridge`]: listener lifecycle, port negotiation and the port file
//! - [`DrainScheduler`] and [`TickDriver`]: the host-side consumer
//! - [`CommandDispatcher`] and [`HandlerRegistry`]: routing to handlers

pub mod bridge;
pub mod builtin;
pub mod config;
pub mod dispatcher;
pub mod host;
pub mod port;
pub mod queue;
pub mod registry;
pub mod scheduler;
pub mod session;
pub mod tcp;
pub mod tick;

pub use bridge::Bridge;
pub use config::{AppConfig, ConfigLoader};
pub use dispatcher::CommandDispatcher;
pub use host::{HostReport, HostThread};
pub use port::PortNegotiator;
pub use queue::{command_queue, PendingRequest, QueueReceiver, QueueSender};
pub use registry::{CommandHandler, HandlerError, HandlerRegistry};
pub use scheduler::{DrainScheduler, PassReport, Scheduler};
pub use tick::{TickDriver, TickExit};
