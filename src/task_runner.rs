/// Task Runner with Failure Budget
///
/// Bounded retries for transient automation failures, and a polling loop that
/// stops once a task fails too many times in a row instead of degrading silently.
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, warn};

use crate::domain::errors::{AutomationError, PipelineError};

/// Polling loop configuration
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Pause between successful polls
    pub interval: Duration,
    /// Consecutive failures tolerated before the loop gives up
    pub max_consecutive_failures: u32,
    /// Upper bound for the backoff after failures; equal to `interval` keeps the delay fixed
    pub max_retry_delay: Duration,
    /// Stop after this many polls; `None` runs until failure or cancellation
    pub max_polls: Option<u64>,
}

impl PollingConfig {
    pub fn new(interval: Duration, max_consecutive_failures: u32) -> Self {
        Self {
            interval,
            max_consecutive_failures,
            max_retry_delay: interval,
            max_polls: None,
        }
    }
}

/// Internal state for the failure budget
#[derive(Debug)]
struct FailureState {
    consecutive_failures: u32,
    current_retry_delay: Duration,
}

impl FailureState {
    fn new(initial_delay: Duration) -> Self {
        Self {
            consecutive_failures: 0,
            current_retry_delay: initial_delay,
        }
    }

    fn record_failure(&mut self, max_delay: Duration) {
        self.consecutive_failures += 1;
        // Exponential backoff with cap
        self.current_retry_delay = std::cmp::min(self.current_retry_delay * 2, max_delay);
    }

    fn reset(&mut self, initial_delay: Duration) {
        self.consecutive_failures = 0;
        self.current_retry_delay = initial_delay;
    }
}

/// One iteration of a repeating pipeline
#[async_trait]
pub trait PollTask: Send {
    fn name(&self) -> &str;

    async fn poll(&mut self) -> Result<(), PipelineError>;
}

/// Run `task` repeatedly with a pause between polls.
///
/// Returns `Ok` only when `max_polls` is reached. A fatal error is returned
/// immediately; other errors count against the failure budget and end the
/// loop with [`PipelineError::TooManyFailures`] once it is spent.
pub async fn run_polling_loop<T>(task: &mut T, config: &PollingConfig) -> Result<(), PipelineError>
where
    T: PollTask + ?Sized,
{
    let mut state = FailureState::new(config.interval);
    let mut polls: u64 = 0;

    loop {
        match task.poll().await {
            Ok(()) => {
                if state.consecutive_failures > 0 {
                    warn!(
                        "Task '{}' recovered after {} failures",
                        task.name(),
                        state.consecutive_failures
                    );
                }
                state.reset(config.interval);
            }
            Err(e) if e.is_fatal() => {
                error!("Task '{}' hit a fatal error: {}", task.name(), e);
                return Err(e);
            }
            Err(e) => {
                state.record_failure(config.max_retry_delay);
                error!(
                    "Task '{}' failed (attempt {}/{}): {}",
                    task.name(),
                    state.consecutive_failures,
                    config.max_consecutive_failures,
                    e
                );

                if state.consecutive_failures >= config.max_consecutive_failures {
                    return Err(PipelineError::TooManyFailures {
                        task: task.name().to_string(),
                        failures: state.consecutive_failures,
                        last_error: e.to_string(),
                    });
                }
            }
        }

        polls += 1;
        if config.max_polls.is_some_and(|max| polls >= max) {
            return Ok(());
        }

        if state.consecutive_failures > 0 {
            warn!(
                "Task '{}' will retry in {:?}",
                task.name(),
                state.current_retry_delay
            );
        }
        sleep(state.current_retry_delay).await;
    }
}

/// Retry `op` while it fails with a transient automation error.
///
/// Non-transient errors and the last transient error are returned as is.
pub async fn retry_transient<T, F, Fut>(
    label: &str,
    max_attempts: u32,
    mut op: F,
) -> Result<T, AutomationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AutomationError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                warn!(
                    "'{}' failed with a transient error (attempt {}/{}): {}",
                    label, attempt, max_attempts, e
                );
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
