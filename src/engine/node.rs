// src/engine/node.rs

//! Per-run node arena and the node lifecycle.
//!
//! A [`RunShared`] is built once per run from the wired graph. Each node is
//! driven by [`drive`] on its own Tokio task:
//!
//! 1. wait for the prerequisite countdown to reach zero
//! 2. decide whether to skip (caller cancelled, fatal error, suppressed)
//! 3. otherwise run the task body through [`run_task`]
//! 4. complete: record any error, then signal the global countdown and
//!    every successor

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::dag::Graph;
use crate::engine::{Countdown, FailureSlot, NodeState, Outcome, SkipReason};
use crate::exec::run_task;
use crate::exec::runner::{install_panic_hook, panic_error};
use crate::task::{Injector, InjectorFactory, TaskContext, TaskOptions, TaskSpec};

pub(crate) struct NodeRuntime<T: Send + Sync + 'static> {
    spec: TaskSpec<T>,
    /// Arena ids of direct successors, in wiring order.
    successors: Vec<usize>,
    in_degree: usize,
    prerequisites: Countdown,
    /// Predecessors that finished without suppressing this node.
    live_inputs: AtomicUsize,
    state: Mutex<NodeState>,
}

impl<T: Send + Sync + 'static> NodeRuntime<T> {
    pub(crate) fn name(&self) -> &str {
        self.spec.name()
    }

    pub(crate) fn state(&self) -> NodeState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: NodeState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

/// Everything the spawned node tasks share for one run.
pub(crate) struct RunShared<T: Send + Sync + 'static> {
    nodes: Vec<NodeRuntime<T>>,
    failure: Arc<FailureSlot>,
    completion: Countdown,
    injector: Option<Arc<dyn InjectorFactory<T>>>,
    config: SchedulerConfig,
    caller: CancellationToken,
    token: CancellationToken,
}

impl<T: Send + Sync + 'static> RunShared<T> {
    /// Build the arena. `specs` is indexed like the graph's node ids.
    ///
    /// Prerequisite counters start at the in-degree, or 1 for sources so
    /// that they fire exactly once on the start signal.
    pub(crate) fn new(
        graph: &Graph,
        specs: &[TaskSpec<T>],
        failure: Arc<FailureSlot>,
        injector: Option<Arc<dyn InjectorFactory<T>>>,
        config: SchedulerConfig,
        caller: CancellationToken,
    ) -> Self {
        let degrees = graph.in_degrees();
        let nodes = graph
            .node_ids()
            .map(|id| {
                let in_degree = degrees[id.index()];
                NodeRuntime {
                    spec: specs[id.index()].clone(),
                    successors: graph.successors(id).into_iter().map(|s| s.index()).collect(),
                    in_degree,
                    prerequisites: Countdown::new(in_degree.max(1)),
                    live_inputs: AtomicUsize::new(0),
                    state: Mutex::new(NodeState::Pending),
                }
            })
            .collect::<Vec<_>>();

        let token = caller.child_token();
        failure.attach(token.clone());

        Self {
            completion: Countdown::new(nodes.len()),
            nodes,
            failure,
            injector,
            config,
            caller,
            token,
        }
    }

    pub(crate) fn nodes(&self) -> &[NodeRuntime<T>] {
        &self.nodes
    }

    /// Arena ids of nodes without predecessors.
    pub(crate) fn sources(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|id| self.nodes[*id].in_degree == 0)
            .collect()
    }

    /// The start signal for a source node.
    pub(crate) fn release(&self, id: usize) {
        self.nodes[id].prerequisites.count_down();
    }

    pub(crate) async fn wait_all(&self) {
        self.completion.wait().await
    }

    async fn evaluate(&self, id: usize, value: Arc<T>) -> Outcome {
        let node = &self.nodes[id];

        if self.caller.is_cancelled() {
            self.failure.record_cancelled();
            return Outcome::Skipped(SkipReason::Cancelled);
        }
        if self.failure.is_tripped() {
            return Outcome::Skipped(SkipReason::FatalError);
        }
        if node.in_degree > 0 && node.live_inputs.load(Ordering::Acquire) == 0 {
            return Outcome::Skipped(SkipReason::Suppressed);
        }

        node.set_state(NodeState::Running);
        let cx = TaskContext::new(node.name(), self.token.clone());
        let layered = self.config.layered_options(node.name(), node.spec.options());
        let options = TaskOptions::resolve(&layered);
        let injector = match &self.injector {
            Some(factory) => factory.inject(&cx, node.spec.task().as_ref()),
            None => Injector::new(),
        };
        debug!(retry = options.retry, timeout = ?options.timeout, "task starting");

        match run_task(Arc::clone(node.spec.task()), cx, value, options, injector).await {
            Ok(()) => Outcome::Succeeded,
            Err(err) => Outcome::Failed(err),
        }
    }

    fn complete(&self, id: usize, outcome: Outcome) {
        let node = &self.nodes[id];

        let suppress = match &outcome {
            Outcome::Succeeded => node.spec.branch().is_some_and(|flag| !flag.is_valid()),
            Outcome::Skipped(SkipReason::Suppressed) => true,
            _ => false,
        };

        node.set_state(outcome.state());
        match outcome {
            Outcome::Succeeded if suppress => info!("task succeeded; branch not taken"),
            Outcome::Succeeded => info!("task succeeded"),
            Outcome::Failed(err) => {
                warn!(error = %err, "task failed");
                self.failure.record(err);
            }
            Outcome::Skipped(reason) => debug!(?reason, "task skipped"),
        }

        self.completion.count_down();
        for &next in &node.successors {
            let successor = &self.nodes[next];
            if !suppress {
                successor.live_inputs.fetch_add(1, Ordering::AcqRel);
            }
            successor.prerequisites.count_down();
        }
    }
}

/// Lifecycle of one node; spawned once per node when the run starts.
pub(crate) async fn drive<T: Send + Sync + 'static>(shared: Arc<RunShared<T>>, id: usize, value: Arc<T>) {
    shared.nodes[id].prerequisites.wait().await;

    // A panic outside the task body (factory, hooks) still completes the node.
    install_panic_hook();
    let outcome = match AssertUnwindSafe(shared.evaluate(id, value)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => Outcome::Failed(panic_error(shared.nodes[id].name(), payload)),
    };

    shared.complete(id, outcome);
}
