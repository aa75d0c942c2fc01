// src/errors.rs

//! Crate-wide error type and helpers.
//!
//! Submission errors (`NilTask`, `TaskExists`, `NoTaskName`, `NilFunc`,
//! `Sealed`) are raised synchronously by the `submit*` family and latched on
//! the scheduler. Wiring (`TaskNotFound`) and structural (`CycleEdge`,
//! `CycleNodes`) errors abort a run before any task body starts. Everything
//! else is a runtime error recorded while the graph executes.

use std::time::Duration;

use thiserror::Error;

use crate::engine::TaskName;

#[derive(Error, Debug)]
pub enum DagRunError {
    #[error("dagrun: nil task")]
    NilTask,

    #[error("dagrun: task already exists: {0}")]
    TaskExists(TaskName),

    #[error("dagrun: no task name")]
    NoTaskName,

    #[error("dagrun: nil func for task: {0}")]
    NilFunc(TaskName),

    #[error("dagrun: task not found: {name}{}", required_by_suffix(.required_by))]
    TaskNotFound {
        name: TaskName,
        /// The task that declared `name` as a dependency, if any.
        required_by: Option<TaskName>,
    },

    #[error("dagrun: dag is sealed")]
    Sealed,

    #[error("dagrun: not async job")]
    NotAsyncJob,

    /// Back edge found by the depth-first check.
    #[error("graph has cycle, cur node: {from}, next node: {to}")]
    CycleEdge { from: TaskName, to: TaskName },

    /// Nodes left over by the in-degree peeling check, sorted by name.
    #[error("graph has cycle in nodes: {0:?}")]
    CycleNodes(Vec<TaskName>),

    #[error("walk func returned error: {0}")]
    Walk(#[source] anyhow::Error),

    #[error("task: {task} run timeout after {timeout:?}")]
    Timeout { task: TaskName, timeout: Duration },

    #[error("task: {task} panicked: {message}\n{backtrace}")]
    Panicked {
        task: TaskName,
        message: String,
        backtrace: String,
    },

    #[error("dagrun: run cancelled")]
    Cancelled,

    #[error("task: {task} failed: {source}")]
    Task {
        task: TaskName,
        #[source]
        source: anyhow::Error,
    },

    /// The first recorded runtime error plus the messages of every error
    /// recorded after it, in arrival order.
    #[error("{first}{}", joined_suffix(.others))]
    Aggregate {
        first: Box<DagRunError>,
        others: Vec<String>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DagRunError {
    /// The authoritative error: for an aggregate, the first one recorded.
    pub fn first(&self) -> &DagRunError {
        match self {
            DagRunError::Aggregate { first, .. } => first.first(),
            other => other,
        }
    }

    /// Whether this error was raised by a `submit*` call.
    pub fn is_submission(&self) -> bool {
        matches!(
            self,
            DagRunError::NilTask
                | DagRunError::TaskExists(_)
                | DagRunError::NoTaskName
                | DagRunError::NilFunc(_)
                | DagRunError::Sealed
        )
    }

    /// Whether this error was raised before any task body could start.
    pub fn is_preflight(&self) -> bool {
        self.is_submission()
            || matches!(
                self,
                DagRunError::TaskNotFound { .. }
                    | DagRunError::CycleEdge { .. }
                    | DagRunError::CycleNodes(_)
            )
    }

    /// Cheap structural copy used when a latched submission error has to be
    /// both kept and returned. Runtime errors carrying an `anyhow::Error`
    /// degrade to `Other` with the same message.
    pub(crate) fn duplicate(&self) -> DagRunError {
        match self {
            DagRunError::NilTask => DagRunError::NilTask,
            DagRunError::TaskExists(n) => DagRunError::TaskExists(n.clone()),
            DagRunError::NoTaskName => DagRunError::NoTaskName,
            DagRunError::NilFunc(n) => DagRunError::NilFunc(n.clone()),
            DagRunError::TaskNotFound { name, required_by } => DagRunError::TaskNotFound {
                name: name.clone(),
                required_by: required_by.clone(),
            },
            DagRunError::Sealed => DagRunError::Sealed,
            DagRunError::NotAsyncJob => DagRunError::NotAsyncJob,
            DagRunError::CycleEdge { from, to } => DagRunError::CycleEdge {
                from: from.clone(),
                to: to.clone(),
            },
            DagRunError::CycleNodes(nodes) => DagRunError::CycleNodes(nodes.clone()),
            DagRunError::Timeout { task, timeout } => DagRunError::Timeout {
                task: task.clone(),
                timeout: *timeout,
            },
            DagRunError::Cancelled => DagRunError::Cancelled,
            DagRunError::Config(msg) => DagRunError::Config(msg.clone()),
            other => DagRunError::Other(anyhow::anyhow!("{other}")),
        }
    }
}

fn required_by_suffix(required_by: &Option<TaskName>) -> String {
    match required_by {
        Some(task) => format!(" (dependency of task: {task})"),
        None => String::new(),
    }
}

fn joined_suffix(others: &[String]) -> String {
    others.iter().map(|msg| format!("; {msg}")).collect()
}

pub type Result<T> = std::result::Result<T, DagRunError>;
