//! Host tick driver
//!
//! Stands in for the host's frame loop: calls a [`Scheduler`] once per
//! interval on the current thread until told to stop. A pass that panics is
//! caught and the loop restarts, up to a configured number of times.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::config::SchedulerConfig;
use crate::dispatcher::panic_message;
use crate::scheduler::Scheduler;

/// Why the tick loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickExit {
    /// The running flag was cleared
    Stopped,
    /// Passes kept crashing past the restart limit
    GaveUp { restarts: u32 },
}

/// Fixed-interval driver for a scheduler
#[derive(Debug, Clone)]
pub struct TickDriver {
    interval: Duration,
    max_restarts: u32,
}

impl TickDriver {
    pub fn new(interval: Duration, max_restarts: u32) -> Self {
        Self {
            interval,
            max_restarts,
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(config.tick_interval(), config.max_restarts)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Tick until `running` is cleared or the restart budget is spent
    pub fn run<S: Scheduler>(&self, scheduler: &mut S, running: &AtomicBool) -> TickExit {
        let mut restarts = 0u32;
        info!(interval_ms = self.interval.as_millis() as u64, "Host tick loop started");

        while running.load(Ordering::SeqCst) {
            let started = Instant::now();

            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| scheduler.run_pass())) {
                restarts += 1;
                let reason = panic_message(payload.as_ref());
                if restarts > self.max_restarts {
                    error!(restarts, panic = %reason, "Drain pass keeps crashing, giving up");
                    return TickExit::GaveUp { restarts };
                }
                warn!(
                    attempt = restarts,
                    max = self.max_restarts,
                    panic = %reason,
                    "Drain pass crashed, restarting"
                );
            }

            if let Some(remaining) = self.interval.checked_sub(started.elapsed()) {
                std::thread::sleep(remaining);
            }
        }

        info!("Host tick loop stopped");
        TickExit::Stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::PassReport;
    use std::sync::Arc;

    /// Scheduler that counts passes and clears the flag after `limit`
    struct Counting {
        passes: usize,
        limit: usize,
        running: Arc<AtomicBool>,
    }

    impl Scheduler for Counting {
        fn run_pass(&mut self) -> PassReport {
            self.passes += 1;
            if self.passes >= self.limit {
                self.running.store(false, Ordering::SeqCst);
            }
            PassReport::default()
        }
    }

    /// Scheduler that panics for its first `failures` passes
    struct Flaky {
        failures: u32,
        passes: u32,
        running: Arc<AtomicBool>,
    }

    impl Scheduler for Flaky {
        fn run_pass(&mut self) -> PassReport {
            self.passes += 1;
            if self.passes <= self.failures {
                panic!("pass {} failed", self.passes);
            }
            self.running.store(false, Ordering::SeqCst);
            PassReport::default()
        }
    }

    #[test]
    fn test_runs_until_flag_cleared() {
        let running = Arc::new(AtomicBool::new(true));
        let mut scheduler = Counting {
            passes: 0,
            limit: 5,
            running: Arc::clone(&running),
        };

        let exit = TickDriver::new(Duration::from_millis(1), 0).run(&mut scheduler, &running);
        assert_eq!(exit, TickExit::Stopped);
        assert_eq!(scheduler.passes, 5);
    }

    #[test]
    fn test_cleared_flag_runs_no_pass() {
        let running = Arc::new(AtomicBool::new(false));
        let mut scheduler = Counting {
            passes: 0,
            limit: 1,
            running: Arc::clone(&running),
        };

        TickDriver::new(Duration::from_millis(1), 0).run(&mut scheduler, &running);
        assert_eq!(scheduler.passes, 0);
    }

    #[test]
    fn test_recovers_within_restart_budget() {
        let running = Arc::new(AtomicBool::new(true));
        let mut scheduler = Flaky {
            failures: 2,
            passes: 0,
            running: Arc::clone(&running),
        };

        let exit = TickDriver::new(Duration::from_millis(1), 3).run(&mut scheduler, &running);
        assert_eq!(exit, TickExit::Stopped);
        assert_eq!(scheduler.passes, 3);
    }

    #[test]
    fn test_gives_up_past_restart_budget() {
        let running = Arc::new(AtomicBool::new(true));
        let mut scheduler = Flaky {
            failures: u32::MAX,
            passes: 0,
            running: Arc::clone(&running),
        };

        let exit = TickDriver::new(Duration::from_millis(1), 2).run(&mut scheduler, &running);
        assert_eq!(exit, TickExit::GaveUp { restarts: 3 });
        assert_eq!(scheduler.passes, 3);
        assert!(running.load(Ordering::SeqCst));
    }

    #[test]
    fn test_from_config() {
        let config = SchedulerConfig {
            tick_interval_ms: 20,
            max_restarts: 7,
        };
        let driver = TickDriver::from_config(&config);
        assert_eq!(driver.interval(), Duration::from_millis(20));
        assert_eq!(driver.max_restarts, 7);
    }
}
