use crate::console;
use crate::{ConsoleError, Result};

/// Strictly ordered multi-step operation.
///
/// A failing step aborts the rest and the error records how far the sequence got.
/// An interrupt passes through unchanged.
pub struct Sequence {
    total: usize,
    completed: usize,
}

impl Sequence {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
        }
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn step<T, F>(&mut self, label: &str, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let number = self.completed + 1;
        console::heading(format!("Step {}/{}: {}", number, self.total, label));
        tracing::info!("Step {}/{}: {}", number, self.total, label);

        match f() {
            Ok(value) => {
                self.completed += 1;
                Ok(value)
            }
            Err(ConsoleError::Cancelled) => Err(ConsoleError::Cancelled),
            Err(source) => {
                tracing::warn!("Step '{}' failed: {}", label, source);
                Err(ConsoleError::StepFailed {
                    step: label.to_string(),
                    completed: self.completed,
                    total: self.total,
                    source: Box::new(source),
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "steps_tests.rs"]
mod steps_tests;
