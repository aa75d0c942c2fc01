// src/task/mod.rs

//! Units of work and everything attached to them at submission time.
//!
//! - [`Task`] is the trait a unit of work implements.
//! - [`TaskSpec`] bundles a task with its optional capabilities (options,
//!   branch flag); the scheduler never inspects a task's concrete type.
//! - [`options`] holds `retry` / `timeout`.
//! - [`injector`] holds the pre/post hook factory.
//! - [`func`] adapts bare closures into tasks.
//! - [`registry`] stores tasks by name for later selection.

pub mod func;
pub mod injector;
pub mod options;
pub mod registry;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::engine::TaskName;

pub use func::{BranchFnTask, DynTaskFn, FnTask};
pub use injector::{Injector, InjectorFactory, PostHook, PreHook};
pub use options::{TaskOption, TaskOptions, retry, timeout};
pub use registry::TaskRegistry;

/// A named unit of work with declared dependencies.
///
/// `value` is the run value shared by every task of one run. The scheduler
/// does not synchronise access to it.
#[async_trait]
pub trait Task<T: Send + Sync + 'static>: Send + Sync {
    fn name(&self) -> &str;

    /// Names of tasks that must finish before this one starts.
    fn dependencies(&self) -> &[TaskName];

    async fn execute(&self, cx: TaskContext, value: Arc<T>) -> anyhow::Result<()>;
}

/// Per-execution context handed to a task body.
///
/// The token is cancelled when the caller cancels the run or when another
/// task records a fatal error. Bodies are free to ignore it.
#[derive(Debug, Clone)]
pub struct TaskContext {
    task: TaskName,
    attempt: u32,
    token: CancellationToken,
}

impl TaskContext {
    pub fn new(task: impl Into<TaskName>, token: CancellationToken) -> Self {
        Self {
            task: task.into(),
            attempt: 1,
            token,
        }
    }

    pub(crate) fn for_attempt(&self, attempt: u32) -> Self {
        Self {
            attempt,
            ..self.clone()
        }
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    /// 1-based attempt number under the retry policy.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

/// Branch-validity signal read by the scheduler after a task succeeds.
///
/// Starts out valid. A task that clears it suppresses its direct dependents
/// unless they have another live predecessor.
#[derive(Debug, Clone)]
pub struct BranchFlag(Arc<AtomicBool>);

impl BranchFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn set(&self, valid: bool) {
        self.0.store(valid, Ordering::SeqCst);
    }

    pub fn is_valid(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for BranchFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// A task plus the optional capabilities declared for it at submission.
pub struct TaskSpec<T: Send + Sync + 'static> {
    task: Arc<dyn Task<T>>,
    options: Vec<TaskOption>,
    branch: Option<BranchFlag>,
}

impl<T: Send + Sync + 'static> TaskSpec<T> {
    pub fn new(task: impl Task<T> + 'static) -> Self {
        Self::from_arc(Arc::new(task))
    }

    pub fn from_arc(task: Arc<dyn Task<T>>) -> Self {
        Self {
            task,
            options: Vec::new(),
            branch: None,
        }
    }

    pub fn with_option(mut self, option: TaskOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_options(mut self, options: impl IntoIterator<Item = TaskOption>) -> Self {
        self.options.extend(options);
        self
    }

    pub fn with_branch(mut self, flag: BranchFlag) -> Self {
        self.branch = Some(flag);
        self
    }

    pub fn name(&self) -> &str {
        self.task.name()
    }

    pub fn dependencies(&self) -> &[TaskName] {
        self.task.dependencies()
    }

    pub fn task(&self) -> &Arc<dyn Task<T>> {
        &self.task
    }

    pub fn options(&self) -> &[TaskOption] {
        &self.options
    }

    pub fn branch(&self) -> Option<&BranchFlag> {
        self.branch.as_ref()
    }
}

impl<T: Send + Sync + 'static> Clone for TaskSpec<T> {
    fn clone(&self) -> Self {
        Self {
            task: Arc::clone(&self.task),
            options: self.options.clone(),
            branch: self.branch.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> fmt::Debug for TaskSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSpec")
            .field("name", &self.name())
            .field("dependencies", &self.dependencies())
            .field("options", &self.options)
            .field("branch", &self.branch.is_some())
            .finish()
    }
}
