//! Interval polling for image readiness.
//!
//! Time is read through [`Clock`] so that the deadline can be driven by a
//! manual clock in tests. Every wait can be aborted through a
//! [`CancellationToken`].

use async_trait::async_trait;
use ntnx_core::config::ReadinessConfig;
use ntnx_core::{Error, Result};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::models::IMAGE_STATE_ACTIVE;

/// Source of time for polling loops.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Wait for the given duration.
    async fn sleep(&self, duration: Duration);

    /// Wait until `deadline` has passed.
    async fn sleep_until(&self, deadline: Instant) {
        let remaining = deadline.saturating_duration_since(self.now());
        if !remaining.is_zero() {
            self.sleep(remaining).await;
        }
    }
}

/// [`Clock`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Polls an image state check until it reports `ACTIVE`, the deadline passes, or
/// the caller cancels.
#[derive(Debug, Clone, Copy)]
pub struct ReadinessWait {
    timeout: Duration,
    interval: Duration,
}

impl ReadinessWait {
    /// Create a wait from its configuration.
    #[must_use]
    pub const fn new(config: ReadinessConfig) -> Self {
        Self {
            timeout: config.timeout(),
            interval: config.poll_interval(),
        }
    }

    /// Run the wait for the resource named by `label`.
    ///
    /// Each state check is raced against `cancel` and the deadline, so a slow
    /// request never holds the wait past either. A check answering
    /// [`Error::NotFound`] means the resource is not visible yet and polling
    /// continues. Any other check error ends the wait.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] when the state never became `ACTIVE`,
    /// [`Error::Cancelled`] when `cancel` fired, [`Error::ConfigError`] for a
    /// zero poll interval or a deadline the clock cannot represent, or the
    /// error of the check.
    pub async fn run<F, Fut>(
        &self,
        clock: &dyn Clock,
        cancel: &CancellationToken,
        label: &str,
        mut check_state: F,
    ) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        if self.interval.is_zero() {
            return Err(Error::ConfigError(
                "Readiness poll interval must be positive".to_string(),
            ));
        }
        let deadline = clock.now().checked_add(self.timeout).ok_or_else(|| {
            Error::ConfigError(format!("Readiness timeout {:?} is out of range", self.timeout))
        })?;
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(cancelled(label));
            }
            if clock.now() >= deadline {
                return Err(self.timed_out(label, attempt));
            }

            attempt += 1;
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(cancelled(label)),
                () = clock.sleep_until(deadline) => return Err(self.timed_out(label, attempt)),
                outcome = check_state() => outcome,
            };

            match outcome {
                Ok(state) if state == IMAGE_STATE_ACTIVE => {
                    debug!(label, attempt, "Image is active");
                    return Ok(());
                }
                Ok(state) => debug!(label, attempt, state = state.as_str(), "Image not active yet"),
                Err(Error::NotFound(_)) => debug!(label, attempt, "Image not visible yet"),
                Err(err) => return Err(err),
            }

            let pause = self
                .interval
                .min(deadline.saturating_duration_since(clock.now()));
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(cancelled(label)),
                () = clock.sleep(pause) => {}
            }
        }
    }

    fn timed_out(&self, label: &str, attempt: u32) -> Error {
        warn!(label, attempt, "Image is not active and timed out");
        Error::Timeout(format!(
            "Image {label} is not active after {:?}",
            self.timeout
        ))
    }
}

fn cancelled(label: &str) -> Error {
    Error::Cancelled(format!("Wait for image {label}"))
}

impl Default for ReadinessWait {
    fn default() -> Self {
        Self::new(ReadinessConfig::default())
    }
}
