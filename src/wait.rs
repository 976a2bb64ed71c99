use crate::runner::CommandRunner;
use crate::Result;
use std::time::{Duration, Instant};

/// Exponential back-off between readiness probes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub initial: Duration,
    pub factor: u32,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            factor: 2,
            max: Duration::from_secs(10),
        }
    }
}

impl Backoff {
    /// Delay before the probe following attempt `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let multiplier = self.factor.max(1).saturating_pow(attempt);
        self.initial.saturating_mul(multiplier).min(self.max)
    }
}

/// Outcome of a single readiness probe.
#[derive(Debug, Clone, PartialEq)]
pub enum Poll<T> {
    Ready(T),
    Pending,
}

/// Probe until ready or until `deadline` has elapsed.
///
/// Returns `Ok(None)` on deadline. Errors from the probe or from the pause
/// (an interrupt) end the wait immediately.
pub fn poll_until<T, F>(
    runner: &dyn CommandRunner,
    backoff: &Backoff,
    deadline: Duration,
    mut probe: F,
) -> Result<Option<T>>
where
    F: FnMut() -> Result<Poll<T>>,
{
    let started = Instant::now();
    let mut paused = Duration::ZERO;
    let mut attempt = 0;

    loop {
        if let Poll::Ready(value) = probe()? {
            return Ok(Some(value));
        }

        let elapsed = started.elapsed().max(paused);
        if elapsed >= deadline {
            tracing::debug!("Gave up after {} attempts ({:?})", attempt + 1, elapsed);
            return Ok(None);
        }

        let delay = backoff
            .delay(attempt)
            .min(deadline - elapsed)
            .max(Duration::from_millis(1));
        runner.pause(delay)?;
        paused += delay;
        attempt += 1;
    }
}

#[cfg(test)]
#[path = "wait_tests.rs"]
mod wait_tests;
