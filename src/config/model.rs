// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::logging::LogLevel;
use crate::task::TaskOption;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [default]
/// retry = 2
/// timeout = "500ms"
///
/// [task.fetch]
/// retry = 3
/// timeout = "2s"
///
/// [log]
/// level = "debug"
/// ```
///
/// All sections are optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSchedulerConfig {
    /// Option defaults applied to every task from `[default]`.
    #[serde(default)]
    pub default: OptionSection,

    /// Per-task overrides from `[task.<name>]`.
    #[serde(default)]
    pub task: BTreeMap<String, OptionSection>,

    #[serde(default)]
    pub log: LogSection,
}

/// `[default]` and `[task.<name>]` sections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionSection {
    /// Maximum number of attempts; `0` behaves like `1`.
    #[serde(default)]
    pub retry: Option<u32>,

    /// Duration string such as `"50ms"` or `"2s"`; `"0s"` disables the timeout.
    #[serde(default)]
    pub timeout: Option<String>,
}

/// `[log]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    #[serde(default)]
    pub level: Option<String>,
}

/// Option values parsed out of an [`OptionSection`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionOverrides {
    pub retry: Option<u32>,
    pub timeout: Option<Duration>,
}

impl OptionOverrides {
    /// The overrides expressed as task options, retry first.
    pub fn to_options(&self) -> Vec<TaskOption> {
        let mut ops = Vec::new();
        if let Some(n) = self.retry {
            ops.push(TaskOption::Retry(n));
        }
        if let Some(d) = self.timeout {
            ops.push(TaskOption::Timeout(d));
        }
        ops
    }
}

/// Validated scheduler configuration.
///
/// Built from a [`RawSchedulerConfig`] through `TryFrom`, or programmatically
/// with the `with_*` helpers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub defaults: OptionOverrides,
    pub tasks: BTreeMap<String, OptionOverrides>,
    pub log_level: Option<LogLevel>,
}

impl SchedulerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_retry(mut self, retry: u32) -> Self {
        self.defaults.retry = Some(retry);
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.defaults.timeout = Some(timeout);
        self
    }

    pub fn with_task_overrides(mut self, task: &str, overrides: OptionOverrides) -> Self {
        self.tasks.insert(task.to_string(), overrides);
        self
    }

    /// Options that wrap a task's own declared options: defaults first,
    /// per-task overrides last.
    pub fn layered_options(&self, task: &str, declared: &[TaskOption]) -> Vec<TaskOption> {
        let mut ops = self.defaults.to_options();
        ops.extend_from_slice(declared);
        if let Some(overrides) = self.tasks.get(task) {
            ops.extend(overrides.to_options());
        }
        ops
    }
}
