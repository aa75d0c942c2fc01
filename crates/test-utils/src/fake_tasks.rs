//! Fake tasks that record what ran into a shared [`Recorder`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dagrun::{Task, TaskContext, TaskName};

/// Run value for tests: a key/value store plus the order tasks finished in.
///
/// Locks internally, since sibling tasks write to it concurrently.
#[derive(Debug, Default)]
pub struct Recorder {
    values: Mutex<BTreeMap<String, String>>,
    order: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn store(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn load(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.lock().unwrap().contains_key(key)
    }

    /// Task names in the order their bodies completed successfully.
    pub fn order(&self) -> Vec<String> {
        self.order.lock().unwrap().clone()
    }

    pub fn ran(&self, task: &str) -> bool {
        self.order.lock().unwrap().iter().any(|t| t == task)
    }

    pub fn position(&self, task: &str) -> Option<usize> {
        self.order.lock().unwrap().iter().position(|t| t == task)
    }

    pub fn finished(&self, task: &str) {
        self.order.lock().unwrap().push(task.to_string());
    }
}

#[derive(Debug, Clone)]
pub enum Behaviour {
    Succeed,
    Fail(String),
    /// Fail the first `n` calls, then succeed.
    FailTimes(u32),
    Panic(String),
}

/// A task that optionally sleeps, then behaves as configured. Successful
/// runs store `"<name>" -> "done"` and append to the recorder's order.
pub struct RecordingTask {
    pub name: TaskName,
    pub deps: Vec<TaskName>,
    pub delay: Duration,
    pub behaviour: Behaviour,
    calls: Arc<AtomicU32>,
}

impl RecordingTask {
    pub fn new(name: &str, deps: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
            delay: Duration::ZERO,
            behaviour: Behaviour::Succeed,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Shared counter of how many times the body was entered.
    pub fn calls(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Task<Recorder> for RecordingTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> &[TaskName] {
        &self.deps
    }

    async fn execute(&self, _cx: TaskContext, rec: Arc<Recorder>) -> anyhow::Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.behaviour {
            Behaviour::Succeed => {}
            Behaviour::Fail(msg) => anyhow::bail!("{msg}"),
            Behaviour::FailTimes(n) if call <= *n => anyhow::bail!("attempt {call} failed"),
            Behaviour::FailTimes(_) => {}
            Behaviour::Panic(msg) => panic!("{msg}"),
        }

        rec.store(&self.name, "done");
        rec.finished(&self.name);
        tracing::debug!(task = %self.name, call, "fake task finished");
        Ok(())
    }
}
