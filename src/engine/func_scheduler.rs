// src/engine/func_scheduler.rs

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::config::SchedulerConfig;
use crate::dag::DotOptions;
use crate::engine::Scheduler;
use crate::errors::{DagRunError, Result};
use crate::task::{InjectorFactory, TaskOption};

/// Scheduler over bare closures with no run value.
///
/// `submit` chains; submission errors are latched and reported by
/// [`FuncScheduler::err`] and again by [`FuncScheduler::run`].
///
/// ```no_run
/// # async fn demo() -> dagrun::errors::Result<()> {
/// let mut s = dagrun::FuncScheduler::new();
/// s.submit("fetch", &[], || async { Ok(()) })
///     .submit("parse", &["fetch"], || async { Ok(()) });
/// s.run().await
/// # }
/// ```
#[derive(Default)]
pub struct FuncScheduler {
    inner: Scheduler<()>,
}

impl FuncScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_injector_factory(self, factory: impl InjectorFactory<()> + 'static) -> Self {
        Self {
            inner: self.inner.with_injector_factory(factory),
        }
    }

    pub fn with_config(self, config: SchedulerConfig) -> Self {
        Self {
            inner: self.inner.with_config(config),
        }
    }

    pub fn submit<F, Fut>(&mut self, name: &str, deps: &[&str], f: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.submit_with_options(name, deps, [], f)
    }

    pub fn submit_with_options<F, Fut>(
        &mut self,
        name: &str,
        deps: &[&str],
        options: impl IntoIterator<Item = TaskOption>,
        f: F,
    ) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        // Latched on the inner scheduler.
        let _ = self
            .inner
            .submit_func_with_options(name, deps, options, move |_, _| f());
        self
    }

    pub fn err(&self) -> Option<&DagRunError> {
        self.inner.err()
    }

    pub async fn run(&mut self) -> Result<()> {
        self.inner.run(&CancellationToken::new(), Default::default()).await
    }

    pub async fn run_with_cancel(&mut self, cx: &CancellationToken) -> Result<()> {
        self.inner.run(cx, Default::default()).await
    }

    pub fn dot(&mut self, options: &DotOptions) -> Result<String> {
        self.inner.dot(options)
    }

    pub fn scheduler(&self) -> &Scheduler<()> {
        &self.inner
    }
}
