// src/exec/runner.rs

//! Runs one task body under its hook, retry and timeout policy.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Once};
use std::time::Duration;

use futures::FutureExt;
use tracing::{Instrument, Span, debug, info, warn};

use crate::errors::{DagRunError, Result};
use crate::task::{Injector, Task, TaskContext, TaskOptions};

/// Execute `task` once per node.
///
/// Order: pre-hook, then the retry loop (raced against the timeout when one
/// is set), then the post-hook over whatever the loop produced.
pub async fn run_task<T>(
    task: Arc<dyn Task<T>>,
    cx: TaskContext,
    value: Arc<T>,
    options: TaskOptions,
    injector: Injector<T>,
) -> Result<()>
where
    T: Send + Sync + 'static,
{
    let Injector { pre, post } = injector;

    if let Some(pre) = pre {
        if let Err(source) = pre(&cx, &*value) {
            warn!(task = %cx.task(), error = %source, "pre-hook failed; skipping task body");
            return Err(DagRunError::Task {
                task: cx.task().to_string(),
                source: source.context("pre-hook"),
            });
        }
    }

    let result = match options.deadline() {
        Some(limit) => {
            run_with_timeout(Arc::clone(&task), cx.clone(), Arc::clone(&value), options.attempts(), limit)
                .await
        }
        None => run_with_retry(task.as_ref(), &cx, &value, options.attempts()).await,
    };

    match post {
        Some(post) => post(&cx, &*value, result),
        None => result,
    }
}

async fn run_with_retry<T>(
    task: &dyn Task<T>,
    cx: &TaskContext,
    value: &Arc<T>,
    attempts: u32,
) -> Result<()>
where
    T: Send + Sync + 'static,
{
    let mut attempt = 1;
    loop {
        let attempt_cx = cx.for_attempt(attempt);
        match guarded(cx.task(), task.execute(attempt_cx, Arc::clone(value))).await {
            Ok(()) => {
                if attempt > 1 {
                    info!(task = %cx.task(), attempt, "task succeeded after retry");
                }
                return Ok(());
            }
            Err(err) if attempt >= attempts => return Err(err),
            Err(err) => {
                warn!(
                    task = %cx.task(),
                    attempt,
                    attempts,
                    error = %err,
                    "task attempt failed; retrying"
                );
                attempt += 1;
            }
        }
    }
}

/// Race the retry loop against `limit`.
///
/// The loop runs as its own Tokio task. On timeout the handle is dropped,
/// which detaches the task: it keeps running and its result is discarded.
async fn run_with_timeout<T>(
    task: Arc<dyn Task<T>>,
    cx: TaskContext,
    value: Arc<T>,
    attempts: u32,
    limit: Duration,
) -> Result<()>
where
    T: Send + Sync + 'static,
{
    let name = cx.task().to_string();
    let handle = tokio::spawn(
        async move { run_with_retry(task.as_ref(), &cx, &value, attempts).await }
            .instrument(Span::current()),
    );

    match tokio::time::timeout(limit, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) if join_err.is_panic() => {
            Err(panic_error(&name, join_err.into_panic()))
        }
        Ok(Err(join_err)) => Err(DagRunError::Other(anyhow::anyhow!(
            "task: {name} aborted: {join_err}"
        ))),
        Err(_elapsed) => {
            warn!(
                task = %name,
                timeout_ms = limit.as_millis() as u64,
                "task timed out; abandoning running attempt"
            );
            Err(DagRunError::Timeout {
                task: name,
                timeout: limit,
            })
        }
    }
}

/// Await a task body, turning both returned errors and panics into
/// [`DagRunError`].
async fn guarded<F>(task: &str, body: F) -> Result<()>
where
    F: Future<Output = anyhow::Result<()>>,
{
    install_panic_hook();
    match AssertUnwindSafe(body).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(DagRunError::Task {
            task: task.to_string(),
            source,
        }),
        Err(payload) => {
            debug!(task = %task, "caught panic in task body");
            Err(panic_error(task, payload))
        }
    }
}

thread_local! {
    /// Trace of the most recent panic on this thread, taken while the
    /// panicking frames were still on the stack.
    static PANIC_TRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Chain a hook in front of the current one that records the panic site's
/// backtrace. The previous hook still runs, so panic output is unchanged.
pub(crate) fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let trace = Backtrace::force_capture();
            PANIC_TRACE.with(|slot| *slot.borrow_mut() = Some(trace));
            previous(info);
        }));
    });
}

/// The backtrace recorded by the panic hook on this thread. Falls back to
/// the current stack when the panic happened elsewhere.
fn take_panic_trace() -> Backtrace {
    PANIC_TRACE
        .with(|slot| slot.borrow_mut().take())
        .unwrap_or_else(Backtrace::force_capture)
}

pub(crate) fn panic_error(task: &str, payload: Box<dyn Any + Send>) -> DagRunError {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    };

    DagRunError::Panicked {
        task: task.to_string(),
        message,
        backtrace: take_panic_trace().to_string(),
    }
}
