use std::sync::Arc;
use std::sync::atomic::AtomicU32;
use std::time::Duration;

use dagrun::{BranchFlag, TaskOption, TaskSpec};

use crate::fake_tasks::{Behaviour, Recorder, RecordingTask};

/// Builder for [`RecordingTask`] specs.
pub struct TaskBuilder {
    task: RecordingTask,
    options: Vec<TaskOption>,
    branch: Option<BranchFlag>,
}

impl TaskBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            task: RecordingTask::new(name, &[]),
            options: Vec::new(),
            branch: None,
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.deps.push(dep.to_string());
        self
    }

    pub fn sleep_ms(mut self, ms: u64) -> Self {
        self.task.delay = Duration::from_millis(ms);
        self
    }

    pub fn fails_with(mut self, msg: &str) -> Self {
        self.task.behaviour = Behaviour::Fail(msg.to_string());
        self
    }

    pub fn fails_times(mut self, n: u32) -> Self {
        self.task.behaviour = Behaviour::FailTimes(n);
        self
    }

    pub fn panics(mut self, msg: &str) -> Self {
        self.task.behaviour = Behaviour::Panic(msg.to_string());
        self
    }

    pub fn option(mut self, option: TaskOption) -> Self {
        self.options.push(option);
        self
    }

    /// Attach a branch flag the test controls.
    pub fn branch(mut self, flag: &BranchFlag) -> Self {
        self.branch = Some(flag.clone());
        self
    }

    /// Counter of body entries, for asserting retries.
    pub fn calls(&self) -> Arc<AtomicU32> {
        self.task.calls()
    }

    pub fn build(self) -> TaskSpec<Recorder> {
        let mut spec = TaskSpec::new(self.task).with_options(self.options);
        if let Some(flag) = self.branch {
            spec = spec.with_branch(flag);
        }
        spec
    }
}
