// src/task/options.rs

//! Per-task retry and timeout options.

use std::time::Duration;

/// A single option declared for a task. Later options override earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOption {
    /// Maximum number of attempts; `0` behaves like `1`.
    Retry(u32),
    /// Deadline for all attempts together; zero disables it.
    Timeout(Duration),
}

/// Set the maximum number of attempts.
pub fn retry(max_times: u32) -> TaskOption {
    TaskOption::Retry(max_times)
}

/// Set the timeout covering every attempt of a task.
pub fn timeout(limit: Duration) -> TaskOption {
    TaskOption::Timeout(limit)
}

/// Options resolved once per node, right before it executes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskOptions {
    pub retry: u32,
    pub timeout: Duration,
}

impl TaskOptions {
    pub fn resolve<'a>(options: impl IntoIterator<Item = &'a TaskOption>) -> Self {
        let mut resolved = Self::default();
        for option in options {
            resolved.apply(option);
        }
        resolved
    }

    pub fn apply(&mut self, option: &TaskOption) {
        match *option {
            TaskOption::Retry(n) => self.retry = n,
            TaskOption::Timeout(d) => self.timeout = d,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.retry.max(1)
    }

    pub fn deadline(&self) -> Option<Duration> {
        (!self.timeout.is_zero()).then_some(self.timeout)
    }
}
