mod common;
use crate::common::{Recorder, TaskBuilder};

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use proptest::prelude::*;

use dagrun::dag::Graph;
use dagrun::{CancellationToken, Scheduler};

/// Dependency lists for `n` tasks where task `i` may only depend on tasks
/// `0..i`, which keeps the graph acyclic.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<BTreeSet<usize>>> {
    (1..=max_tasks).prop_flat_map(|n| {
        proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..4), n).prop_map(
            |raw| {
                raw.into_iter()
                    .enumerate()
                    .map(|(i, picks)| {
                        if i == 0 {
                            BTreeSet::new()
                        } else {
                            picks.into_iter().map(|p| p % i).collect()
                        }
                    })
                    .collect()
            },
        )
    })
}

fn name(i: usize) -> String {
    format!("task_{i}")
}

fn build_graph(deps: &[BTreeSet<usize>]) -> Graph {
    let mut graph = Graph::new();
    for i in 0..deps.len() {
        graph.add_node(&name(i)).unwrap();
    }
    for (i, ds) in deps.iter().enumerate() {
        for d in ds {
            graph.add_dependency(&name(*d), &name(i)).unwrap();
        }
    }
    graph
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_dags_pass_both_cycle_checks(deps in dag_strategy(12)) {
        let graph = build_graph(&deps);
        prop_assert!(graph.check_acyclic().is_ok());
        prop_assert!(!graph.has_cycle());

        let order = graph.topological_order().unwrap();
        prop_assert_eq!(order.len(), deps.len());
        let pos = |n: &str| order.iter().position(|o| o == n).unwrap();
        for (i, ds) in deps.iter().enumerate() {
            for d in ds {
                prop_assert!(pos(&name(*d)) < pos(&name(i)));
            }
        }
    }

    #[test]
    fn adding_a_back_edge_fails_both_checks(deps in dag_strategy(12)) {
        prop_assume!(deps.len() >= 2);
        // Chain every task to its predecessor so the last reaches the first.
        let mut deps = deps;
        for (i, ds) in deps.iter_mut().enumerate().skip(1) {
            ds.insert(i - 1);
        }
        let last = deps.len() - 1;
        deps[0].insert(last);

        let graph = build_graph(&deps);
        prop_assert!(graph.has_cycle());
        prop_assert!(graph.check_acyclic().is_err());
        prop_assert!(graph.bfs(|_| Ok(())).is_err());
    }

    #[test]
    fn random_dags_run_every_task_once_in_order(deps in dag_strategy(10)) {
        let mut s: Scheduler<Recorder> = Scheduler::new();
        let mut counters = Vec::new();
        for (i, ds) in deps.iter().enumerate() {
            let mut b = TaskBuilder::new(&name(i));
            for d in ds {
                b = b.after(&name(*d));
            }
            counters.push(b.calls());
            s.submit(b.build()).unwrap();
        }

        let rec = Recorder::shared();
        runtime()
            .block_on(s.run(&CancellationToken::new(), Arc::clone(&rec)))
            .unwrap();

        for c in &counters {
            prop_assert_eq!(c.load(Ordering::SeqCst), 1);
        }
        for (i, ds) in deps.iter().enumerate() {
            let me = rec.position(&name(i)).unwrap();
            for d in ds {
                prop_assert!(rec.position(&name(*d)).unwrap() < me);
            }
        }
    }

    #[test]
    fn cyclic_task_sets_never_execute(deps in dag_strategy(10)) {
        prop_assume!(deps.len() >= 2);
        let mut deps = deps;
        for (i, ds) in deps.iter_mut().enumerate().skip(1) {
            ds.insert(i - 1);
        }
        let last = deps.len() - 1;
        deps[0].insert(last);

        let mut s: Scheduler<Recorder> = Scheduler::new();
        for (i, ds) in deps.iter().enumerate() {
            let mut b = TaskBuilder::new(&name(i));
            for d in ds {
                b = b.after(&name(*d));
            }
            s.submit(b.build()).unwrap();
        }

        let rec = Recorder::shared();
        let result = runtime().block_on(s.run(&CancellationToken::new(), Arc::clone(&rec)));
        prop_assert!(result.is_err());
        prop_assert!(rec.order().is_empty());
    }
}
