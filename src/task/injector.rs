// src/task/injector.rs

//! Hooks run around every task body.
//!
//! An [`InjectorFactory`] is asked once per node for an [`Injector`]. The
//! pre-hook runs before the first attempt; if it fails the body never runs.
//! The post-hook sees the final outcome (after retry and timeout) and may
//! replace it.

use crate::errors::Result;
use crate::task::{Task, TaskContext};

pub type PreHook<T> = Box<dyn FnOnce(&TaskContext, &T) -> anyhow::Result<()> + Send>;
pub type PostHook<T> = Box<dyn FnOnce(&TaskContext, &T, Result<()>) -> Result<()> + Send>;

pub struct Injector<T> {
    pub pre: Option<PreHook<T>>,
    pub post: Option<PostHook<T>>,
}

impl<T> Injector<T> {
    pub fn new() -> Self {
        Self {
            pre: None,
            post: None,
        }
    }

    pub fn with_pre<F>(mut self, pre: F) -> Self
    where
        F: FnOnce(&TaskContext, &T) -> anyhow::Result<()> + Send + 'static,
    {
        self.pre = Some(Box::new(pre));
        self
    }

    pub fn with_post<F>(mut self, post: F) -> Self
    where
        F: FnOnce(&TaskContext, &T, Result<()>) -> Result<()> + Send + 'static,
    {
        self.post = Some(Box::new(post));
        self
    }
}

impl<T> Default for Injector<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub trait InjectorFactory<T: Send + Sync + 'static>: Send + Sync {
    fn inject(&self, cx: &TaskContext, task: &dyn Task<T>) -> Injector<T>;
}

impl<T, F> InjectorFactory<T> for F
where
    T: Send + Sync + 'static,
    F: Fn(&TaskContext, &dyn Task<T>) -> Injector<T> + Send + Sync,
{
    fn inject(&self, cx: &TaskContext, task: &dyn Task<T>) -> Injector<T> {
        self(cx, task)
    }
}
