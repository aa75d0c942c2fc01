// src/engine/mod.rs

//! Concurrent execution engine.
//!
//! This module ties together:
//! - the [`Scheduler`], which owns submissions and the graph
//! - the per-run node arena and node lifecycle
//! - the atomic wakeup counters ([`countdown`])
//! - the shared terminal-error slot ([`failure`])
//!
//! Every node is spawned as its own Tokio task as soon as the run starts.
//! A node sleeps on its prerequisite countdown; predecessors count it down
//! as they finish, so there is no central poller.

pub mod countdown;
pub mod failure;
pub mod func_scheduler;
pub(crate) mod node;
pub mod scheduler;

use crate::errors::DagRunError;

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

/// Lifecycle of one node within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Waiting on prerequisites (or the run has not started).
    Pending,
    Running,
    Skipped(SkipReason),
    Succeeded,
    Failed,
}

impl NodeState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, NodeState::Pending | NodeState::Running)
    }
}

/// Why a node never entered its task body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another node had already recorded a fatal error.
    FatalError,
    /// The caller cancelled the run.
    Cancelled,
    /// Every predecessor either took a false branch or was itself suppressed.
    Suppressed,
}

/// What a node produced, as seen by the completion step.
#[derive(Debug)]
pub enum Outcome {
    Succeeded,
    Failed(DagRunError),
    Skipped(SkipReason),
}

impl Outcome {
    pub fn state(&self) -> NodeState {
        match self {
            Outcome::Succeeded => NodeState::Succeeded,
            Outcome::Failed(_) => NodeState::Failed,
            Outcome::Skipped(reason) => NodeState::Skipped(*reason),
        }
    }
}

pub use countdown::Countdown;
pub use failure::FailureSlot;
pub use func_scheduler::FuncScheduler;
pub use scheduler::Scheduler;
