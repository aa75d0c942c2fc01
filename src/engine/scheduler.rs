// src/engine/scheduler.rs

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span};

use crate::config::SchedulerConfig;
use crate::dag::{DotOptions, Graph};
use crate::engine::node::{RunShared, drive};
use crate::engine::{FailureSlot, NodeState, TaskName};
use crate::errors::{DagRunError, Result};
use crate::task::{
    BranchFnTask, DynTaskFn, FnTask, InjectorFactory, Task, TaskContext, TaskOption, TaskSpec,
};

/// Runs a set of interdependent tasks over one shared run value.
///
/// Tasks are submitted first; edges are wired from their declared
/// dependency names when the run starts. A scheduler executes at most one
/// run: [`Scheduler::run`] seals it and later submissions fail.
///
/// Submission errors are latched. The first one is kept and returned again
/// by `run` without executing anything.
pub struct Scheduler<T: Send + Sync + 'static> {
    graph: Graph,
    /// Indexed by graph node id.
    specs: Vec<TaskSpec<T>>,
    /// Graph with dependency edges, set once wiring succeeded.
    wired: Option<Graph>,
    sealed: bool,
    latched: Option<DagRunError>,
    failure: Arc<FailureSlot>,
    injector: Option<Arc<dyn InjectorFactory<T>>>,
    config: SchedulerConfig,
    run: Option<Arc<RunShared<T>>>,
    pending: Option<JoinHandle<Result<()>>>,
}

impl<T: Send + Sync + 'static> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            specs: Vec::new(),
            wired: None,
            sealed: false,
            latched: None,
            failure: Arc::new(FailureSlot::new()),
            injector: None,
            config: SchedulerConfig::default(),
            run: None,
            pending: None,
        }
    }

    /// Shortcut for `Scheduler::new().with_injector_factory(factory)`.
    pub fn new_with_injector(factory: impl InjectorFactory<T> + 'static) -> Self {
        Self::new().with_injector_factory(factory)
    }

    /// Ask `factory` for pre/post hooks once per node.
    pub fn with_injector_factory(mut self, factory: impl InjectorFactory<T> + 'static) -> Self {
        self.injector = Some(Arc::new(factory));
        self
    }

    /// Layer config defaults and per-task overrides around declared options.
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    fn latch(&mut self, err: DagRunError) -> DagRunError {
        if self.latched.is_none() {
            self.latched = Some(err.duplicate());
        }
        err
    }

    /// Register one task. Edges are not wired until the run starts.
    pub fn submit(&mut self, spec: TaskSpec<T>) -> Result<()> {
        if self.sealed {
            return Err(self.latch(DagRunError::Sealed));
        }
        let name = spec.name().to_string();
        if name.is_empty() {
            return Err(self.latch(DagRunError::NoTaskName));
        }
        self.graph.add_node(&name).map_err(|e| self.latch(e))?;
        self.specs.push(spec);
        self.wired = None;
        debug!(task = %name, "task submitted");
        Ok(())
    }

    /// Register a plain task without options or branch flag.
    pub fn submit_task(&mut self, task: impl Task<T> + 'static) -> Result<()> {
        self.submit(TaskSpec::new(task))
    }

    /// Register several tasks, stopping at the first error. A `None` entry
    /// fails with `NilTask`.
    pub fn submit_all<I, S>(&mut self, specs: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<Option<TaskSpec<T>>>,
    {
        for spec in specs {
            match spec.into() {
                Some(spec) => self.submit(spec)?,
                None => return Err(self.latch(DagRunError::NilTask)),
            }
        }
        Ok(())
    }

    pub fn submit_func<F, Fut>(&mut self, name: &str, deps: &[&str], f: F) -> Result<()>
    where
        F: Fn(TaskContext, Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.submit_func_with_options(name, deps, [], f)
    }

    pub fn submit_func_with_options<F, Fut>(
        &mut self,
        name: &str,
        deps: &[&str],
        options: impl IntoIterator<Item = TaskOption>,
        f: F,
    ) -> Result<()>
    where
        F: Fn(TaskContext, Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.submit(TaskSpec::new(FnTask::new(name, deps, f)).with_options(options))
    }

    /// Register a closure whose `bool` result says whether its direct
    /// dependents should run.
    pub fn submit_branch_func<F, Fut>(&mut self, name: &str, deps: &[&str], f: F) -> Result<()>
    where
        F: Fn(TaskContext, Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
    {
        self.submit_branch_func_with_options(name, deps, [], f)
    }

    pub fn submit_branch_func_with_options<F, Fut>(
        &mut self,
        name: &str,
        deps: &[&str],
        options: impl IntoIterator<Item = TaskOption>,
        f: F,
    ) -> Result<()>
    where
        F: Fn(TaskContext, Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
    {
        let task = BranchFnTask::new(name, deps, f);
        let flag = task.flag();
        self.submit(TaskSpec::new(task).with_options(options).with_branch(flag))
    }

    /// Register a type-erased body chosen at runtime. `None` fails with
    /// `NilFunc`.
    pub fn submit_dyn_func(
        &mut self,
        name: &str,
        deps: &[&str],
        f: Option<DynTaskFn<T>>,
    ) -> Result<()> {
        if name.is_empty() {
            return Err(self.latch(DagRunError::NoTaskName));
        }
        let Some(f) = f else {
            return Err(self.latch(DagRunError::NilFunc(name.to_string())));
        };
        self.submit_task(FnTask::new(name, deps, move |cx: TaskContext, value: Arc<T>| {
            f(cx, value)
        }))
    }

    /// Record a fatal error. Nodes that have not started yet will skip
    /// their bodies. Later calls append to the first error.
    pub fn cancel_with_err(&self, err: impl Into<DagRunError>) {
        self.failure.record(err.into());
    }

    /// The run's error slot, for recording errors while `run` holds the
    /// scheduler (e.g. from another task or a signal handler).
    pub fn failure_slot(&self) -> Arc<FailureSlot> {
        Arc::clone(&self.failure)
    }

    /// The latched submission error, if any.
    pub fn err(&self) -> Option<&DagRunError> {
        self.latched.as_ref()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Names of submitted tasks, in submission order.
    pub fn task_names(&self) -> Vec<TaskName> {
        self.specs.iter().map(|s| s.name().to_string()).collect()
    }

    /// The graph, with edges once a run has wired them.
    pub fn graph(&self) -> &Graph {
        self.wired.as_ref().unwrap_or(&self.graph)
    }

    /// Per-task state. Everything is `Pending` before a run starts.
    pub fn states(&self) -> BTreeMap<TaskName, NodeState> {
        match &self.run {
            Some(run) => run
                .nodes()
                .iter()
                .map(|n| (n.name().to_string(), n.state()))
                .collect(),
            None => self
                .specs
                .iter()
                .map(|s| (s.name().to_string(), NodeState::Pending))
                .collect(),
        }
    }

    /// Graphviz text for the dependency graph. Before a run this wires the
    /// current submissions afresh; nothing is executed.
    pub fn dot(&mut self, options: &DotOptions) -> Result<String> {
        if !self.sealed {
            self.wired = Some(self.wired_graph()?);
        }
        Ok(self.graph().dot(options))
    }

    /// A copy of the node graph with an edge per declared dependency.
    fn wired_graph(&self) -> Result<Graph> {
        let mut graph = self.graph.clone();
        for spec in &self.specs {
            for dep in spec.dependencies() {
                graph.add_dependency(dep, spec.name())?;
            }
        }
        Ok(graph)
    }

    /// Everything a run does before the first spawn: latched error check,
    /// sealing, wiring and the acyclicity check.
    fn prepare(&mut self, caller: &CancellationToken) -> Result<Arc<RunShared<T>>> {
        if let Some(err) = &self.latched {
            return Err(err.duplicate());
        }
        if self.sealed {
            return Err(self.latch(DagRunError::Sealed));
        }
        self.sealed = true;

        let wired = self.wired_graph()?;
        wired.check_acyclic()?;
        debug!(tasks = wired.len(), edges = wired.edge_count(), "graph wired");
        self.wired = Some(wired);

        let shared = Arc::new(RunShared::new(
            self.graph(),
            &self.specs,
            Arc::clone(&self.failure),
            self.injector.clone(),
            self.config.clone(),
            caller.clone(),
        ));
        self.run = Some(Arc::clone(&shared));
        Ok(shared)
    }

    /// Run every task and wait for all of them to finish.
    ///
    /// Cancelling `cx` stops nodes that have not started yet and makes the
    /// run return `Cancelled` unless a task error was recorded first.
    /// Returns the first recorded runtime error, or `Aggregate` when more
    /// than one was recorded.
    pub async fn run(&mut self, cx: &CancellationToken, value: Arc<T>) -> Result<()> {
        let shared = self.prepare(cx)?;
        execute(shared, Arc::clone(&self.failure), value).await
    }

    /// Start the run in the background; collect the result with
    /// [`Scheduler::wait`]. Pre-flight errors surface from `wait`.
    ///
    /// Must be called within a Tokio runtime.
    ///
    /// A second call while a run is pending leaves that run's handle in
    /// place; the `Sealed` error is latched and returned by [`Scheduler::err`].
    pub fn run_async(&mut self, cx: &CancellationToken, value: Arc<T>) {
        let prepared = self.prepare(cx);
        if self.pending.is_some() {
            if let Err(err) = prepared {
                debug!(error = %err, "run already pending; keeping its handle");
            }
            return;
        }
        let handle = match prepared {
            Ok(shared) => tokio::spawn(execute(shared, Arc::clone(&self.failure), value)),
            Err(err) => tokio::spawn(async move { Err(err) }),
        };
        self.pending = Some(handle);
    }

    /// Block until the run started by [`Scheduler::run_async`] finishes.
    pub async fn wait(&mut self) -> Result<()> {
        let handle = self.pending.take().ok_or(DagRunError::NotAsyncJob)?;
        handle
            .await
            .map_err(|e| DagRunError::Other(anyhow::anyhow!("run task failed to join: {e}")))?
    }
}

impl<T: Send + Sync + 'static> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

async fn execute<T: Send + Sync + 'static>(
    shared: Arc<RunShared<T>>,
    failure: Arc<FailureSlot>,
    value: Arc<T>,
) -> Result<()> {
    if let Some(err) = failure.take() {
        info!(error = %err, "run cancelled before start");
        return Err(err);
    }

    let nodes = shared.nodes().len();
    info!(tasks = nodes, "run started");

    for (id, node) in shared.nodes().iter().enumerate() {
        let span = info_span!("task", task = %node.name());
        tokio::spawn(drive(Arc::clone(&shared), id, Arc::clone(&value)).instrument(span));
    }
    for id in shared.sources() {
        shared.release(id);
    }

    shared.wait_all().await;

    match failure.take() {
        Some(err) => {
            info!(error = %err, "run finished with error");
            Err(err)
        }
        None => {
            info!(tasks = nodes, "run finished");
            Ok(())
        }
    }
}
