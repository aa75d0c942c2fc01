// src/task/registry.rs

//! Name-keyed task storage.
//!
//! A registry holds every task a program knows about; a run only needs the
//! tasks it asks for plus their transitive dependencies, which
//! [`TaskRegistry::resolve_with_dependencies`] collects.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::engine::TaskName;
use crate::errors::{DagRunError, Result};
use crate::task::TaskSpec;

pub struct TaskRegistry<T: Send + Sync + 'static> {
    tasks: HashMap<TaskName, TaskSpec<T>>,
}

impl<T: Send + Sync + 'static> TaskRegistry<T> {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
        }
    }

    pub fn register(&mut self, spec: TaskSpec<T>) -> Result<()> {
        if spec.name().is_empty() {
            return Err(DagRunError::NoTaskName);
        }
        if self.tasks.contains_key(spec.name()) {
            return Err(DagRunError::TaskExists(spec.name().to_string()));
        }
        debug!(task = %spec.name(), "registered task");
        self.tasks.insert(spec.name().to_string(), spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&TaskSpec<T>> {
        self.tasks.get(name).ok_or_else(|| DagRunError::TaskNotFound {
            name: name.to_string(),
            required_by: None,
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Sorted task names.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tasks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Collect `names` and everything they depend on, transitively.
    ///
    /// The result is sorted by name and can be handed straight to
    /// `Scheduler::submit_all`.
    pub fn resolve_with_dependencies(&self, names: &[&str]) -> Result<Vec<TaskSpec<T>>> {
        let mut selected: BTreeMap<&str, &TaskSpec<T>> = BTreeMap::new();
        let mut stack: Vec<(&str, Option<&str>)> = names.iter().map(|n| (*n, None)).collect();

        while let Some((name, required_by)) = stack.pop() {
            if selected.contains_key(name) {
                continue;
            }
            let spec = self.tasks.get(name).ok_or_else(|| DagRunError::TaskNotFound {
                name: name.to_string(),
                required_by: required_by.map(str::to_string),
            })?;
            selected.insert(spec.name(), spec);
            for dep in spec.dependencies() {
                stack.push((dep.as_str(), Some(spec.name())));
            }
        }

        Ok(selected.into_values().cloned().collect())
    }
}

impl<T: Send + Sync + 'static> Default for TaskRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
