//! Cooperative drain scheduler
//!
//! Runs on the host thread, one pass per host tick. A pass drains whatever is
//! queued at that instant, executes each request synchronously, and resolves
//! its completion. It never waits for new work.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use tracing::{debug, error, info, trace};

use tickbridge_protocol::ResponseEnvelope;

use crate::dispatcher::{panic_message, CommandDispatcher};
use crate::queue::{PendingRequest, QueueReceiver};

/// Last-resort response when an envelope cannot be produced at all
const INTERNAL_FAILURE_RESPONSE: &str =
    r#"{"status":"error","error":"Internal error while processing command"}"#;

/// Outcome counts of one drain pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl PassReport {
    pub fn is_idle(&self) -> bool {
        self.processed == 0
    }
}

/// One host-tick worth of work
pub trait Scheduler {
    fn run_pass(&mut self) -> PassReport;
}

/// Drains the command queue through a dispatcher
#[derive(Debug)]
pub struct DrainScheduler {
    queue: QueueReceiver,
    dispatcher: CommandDispatcher,
}

impl DrainScheduler {
    pub fn new(queue: QueueReceiver, dispatcher: CommandDispatcher) -> Self {
        Self { queue, dispatcher }
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    /// Requests waiting for the next pass
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Stop intake and answer everything still queued with an error
    ///
    /// Returns the number of requests that were answered this way.
    pub fn close(mut self) -> usize {
        self.queue.close();
        let leftover = self.queue.drain_all();
        let count = leftover.len();

        let response = ResponseEnvelope::error("Bridge is shutting down")
            .to_json()
            .unwrap_or_else(|_| INTERNAL_FAILURE_RESPONSE.to_string());
        for request in leftover {
            request.completion.resolve(response.clone());
        }

        if count > 0 {
            info!(count, "Answered queued requests during shutdown");
        }
        count
    }

    /// Execute one request, never unwinding past this point
    fn process(&self, request: PendingRequest) -> bool {
        let PendingRequest {
            id,
            payload,
            completion,
        } = request;

        let started = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let envelope = self.dispatcher.execute(&payload);
            let success = envelope.is_success();
            envelope.to_json().map(|json| (json, success))
        }));

        let (response, success) = match outcome {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                error!(request_id = %id, error = %e, "Failed to serialize response");
                (INTERNAL_FAILURE_RESPONSE.to_string(), false)
            }
            Err(payload) => {
                error!(
                    request_id = %id,
                    panic = %panic_message(payload.as_ref()),
                    "Request processing panicked"
                );
                (INTERNAL_FAILURE_RESPONSE.to_string(), false)
            }
        };

        trace!(
            request_id = %id,
            elapsed_us = started.elapsed().as_micros() as u64,
            success,
            "Request processed"
        );

        if !completion.resolve(response) {
            debug!(request_id = %id, "Session went away before its response was ready");
        }
        success
    }
}

impl Scheduler for DrainScheduler {
    fn run_pass(&mut self) -> PassReport {
        let batch = self.queue.drain_all();
        let mut report = PassReport::default();

        for request in batch {
            report.processed += 1;
            if self.process(request) {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
        }

        if !report.is_idle() {
            debug!(
                processed = report.processed,
                failed = report.failed,
                "Drain pass complete"
            );
        }
        report
    }
}
