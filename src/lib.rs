// src/lib.rs

//! Concurrent DAG task scheduling.
//!
//! Submit named tasks with declared dependencies to a [`Scheduler`], then
//! [`Scheduler::run`] them: each task starts as soon as every dependency has
//! finished, siblings run concurrently, and the first runtime error stops
//! tasks that have not started yet.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! use dagrun::{CancellationToken, Scheduler, retry};
//!
//! # async fn demo() -> dagrun::errors::Result<()> {
//! let mut s: Scheduler<AtomicUsize> = Scheduler::new();
//! s.submit_func("a", &[], |_, n| async move {
//!     n.fetch_add(1, Ordering::SeqCst);
//!     Ok(())
//! })?;
//! s.submit_func_with_options("b", &["a"], [retry(3)], |_, n| async move {
//!     n.fetch_add(1, Ordering::SeqCst);
//!     Ok(())
//! })?;
//! s.run(&CancellationToken::new(), Arc::new(AtomicUsize::new(0))).await
//! # }
//! ```

pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod task;

pub use tokio_util::sync::CancellationToken;

pub use config::SchedulerConfig;
pub use dag::{DotOptions, Graph};
pub use engine::{FuncScheduler, NodeState, Outcome, Scheduler, SkipReason, TaskName};
pub use errors::{DagRunError, Result};
pub use logging::{LogLevel, init_logging};
pub use task::{
    BranchFlag, Injector, InjectorFactory, Task, TaskContext, TaskOption, TaskRegistry, TaskSpec,
    retry, timeout,
};
