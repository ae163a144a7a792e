//! Run control: deadlines and cancellation.

use std::time::{Duration, Instant};

pub use tokio_util::sync::CancellationToken;

/// Time budget for the bounded I/O stages of a run.
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    started: Instant,
    budget: Option<Duration>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{stage} exceeded the {}ms timeout", .budget.as_millis())]
pub struct TimeoutError {
    pub stage: String,
    pub budget: Duration,
}

/// Failures that abort evaluation without producing a report.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("verification cancelled")]
    Cancelled,
    #[error("failed to start verification workers: {0}")]
    WorkerPool(String),
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget: Some(budget),
        }
    }

    /// A deadline that never expires.
    pub fn none() -> Self {
        Self {
            started: Instant::now(),
            budget: None,
        }
    }

    pub fn budget(&self) -> Option<Duration> {
        self.budget
    }

    /// Time left, or `None` for an unbounded deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.budget
            .map(|b| b.saturating_sub(self.started.elapsed()))
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.remaining(), Some(d) if d.is_zero())
    }

    pub fn check(&self, stage: &str) -> Result<(), TimeoutError> {
        match self.budget {
            Some(budget) if self.started.elapsed() >= budget => Err(TimeoutError {
                stage: stage.to_string(),
                budget,
            }),
            _ => Ok(()),
        }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}
