//! Simulated host thread
//!
//! Owns the handler registry and the drain scheduler on a dedicated OS thread
//! and ticks them at a fixed cadence, the way an embedding host would from
//! its own frame loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::sync::oneshot;
use tracing::info;

use tickbridge_utils::{BridgeError, Result};

use crate::config::SchedulerConfig;
use crate::dispatcher::CommandDispatcher;
use crate::queue::QueueReceiver;
use crate::registry::HandlerRegistry;
use crate::scheduler::DrainScheduler;
use crate::tick::{TickDriver, TickExit};

/// How the host thread finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostReport {
    pub exit: TickExit,
    /// Requests answered with a shutdown error when the queue was closed
    pub answered_on_close: usize,
}

/// Handle to the running host thread
#[derive(Debug)]
pub struct HostThread {
    running: Arc<AtomicBool>,
    handle: JoinHandle<HostReport>,
    exit_rx: Option<oneshot::Receiver<TickExit>>,
}

impl HostThread {
    /// Start ticking `receiver` on a new thread
    ///
    /// `build_registry` runs on the host thread, so handlers never cross
    /// threads.
    pub fn spawn<F>(receiver: QueueReceiver, config: &SchedulerConfig, build_registry: F) -> Result<Self>
    where
        F: FnOnce() -> HandlerRegistry + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let (exit_tx, exit_rx) = oneshot::channel();
        let driver = TickDriver::from_config(config);
        let flag = Arc::clone(&running);

        let handle = std::thread::Builder::new()
            .name("tickbridge-host".into())
            .spawn(move || {
                let dispatcher = CommandDispatcher::new(build_registry());
                info!(handlers = ?dispatcher.registry().names(), "Host ready");

                let mut scheduler = DrainScheduler::new(receiver, dispatcher);
                let exit = driver.run(&mut scheduler, &flag);
                let _ = exit_tx.send(exit);

                HostReport {
                    exit,
                    answered_on_close: scheduler.close(),
                }
            })
            .map_err(|e| BridgeError::internal(format!("failed to spawn host thread: {}", e)))?;

        Ok(Self {
            running,
            handle,
            exit_rx: Some(exit_rx),
        })
    }

    /// Resolves when the tick loop returns on its own
    ///
    /// Yields `None` if the host thread died without reporting.
    pub async fn exited(&mut self) -> Option<TickExit> {
        let exit = match self.exit_rx.as_mut() {
            Some(rx) => rx.await.ok(),
            None => return None,
        };
        self.exit_rx = None;
        exit
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst) && !self.handle.is_finished()
    }

    /// Clear the running flag and wait for the thread to finish
    pub fn stop(self) -> Result<HostReport> {
        self.running.store(false, Ordering::SeqCst);
        self.handle
            .join()
            .map_err(|_| BridgeError::internal("host thread panicked"))
    }
}
