// src/task/func.rs

//! Adapters turning bare closures into [`Task`]s.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::engine::TaskName;
use crate::task::{BranchFlag, Task, TaskContext};

/// Type-erased task body, for callers that pick bodies at runtime.
pub type DynTaskFn<T> =
    Arc<dyn Fn(TaskContext, Arc<T>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// A task whose body is a closure.
pub struct FnTask<T, F> {
    name: TaskName,
    deps: Vec<TaskName>,
    f: F,
    _value: PhantomData<fn(Arc<T>)>,
}

impl<T, F> FnTask<T, F> {
    pub fn new(name: impl Into<TaskName>, deps: &[&str], f: F) -> Self {
        Self {
            name: name.into(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
            f,
            _value: PhantomData,
        }
    }
}

#[async_trait]
impl<T, F, Fut> Task<T> for FnTask<T, F>
where
    T: Send + Sync + 'static,
    F: Fn(TaskContext, Arc<T>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> &[TaskName] {
        &self.deps
    }

    async fn execute(&self, cx: TaskContext, value: Arc<T>) -> anyhow::Result<()> {
        (self.f)(cx, value).await
    }
}

/// A task whose closure also decides whether its dependents should run.
///
/// The returned `bool` is written into the task's [`BranchFlag`].
pub struct BranchFnTask<T, F> {
    name: TaskName,
    deps: Vec<TaskName>,
    f: F,
    flag: BranchFlag,
    _value: PhantomData<fn(Arc<T>)>,
}

impl<T, F> BranchFnTask<T, F> {
    pub fn new(name: impl Into<TaskName>, deps: &[&str], f: F) -> Self {
        Self {
            name: name.into(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
            f,
            flag: BranchFlag::new(),
            _value: PhantomData,
        }
    }

    pub fn flag(&self) -> BranchFlag {
        self.flag.clone()
    }
}

#[async_trait]
impl<T, F, Fut> Task<T> for BranchFnTask<T, F>
where
    T: Send + Sync + 'static,
    F: Fn(TaskContext, Arc<T>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<bool>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> &[TaskName] {
        &self.deps
    }

    async fn execute(&self, cx: TaskContext, value: Arc<T>) -> anyhow::Result<()> {
        let valid = (self.f)(cx, value).await?;
        self.flag.set(valid);
        Ok(())
    }
}
