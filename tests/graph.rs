mod common;
use crate::common::TestResult;

use dagrun::dag::{Graph, NodeIndex};
use dagrun::errors::DagRunError;

const NODES: [&str; 5] = ["A", "B", "C", "D", "E"];
const EDGES: [(usize, usize); 7] = [(1, 0), (1, 4), (1, 3), (0, 2), (0, 3), (2, 3), (3, 4)];

fn sample() -> (Graph, Vec<NodeIndex>) {
    let mut graph = Graph::new();
    let ids: Vec<NodeIndex> = NODES
        .iter()
        .map(|n| graph.add_node(n).expect("unique node"))
        .collect();
    for (from, to) in EDGES {
        graph.add_edge(ids[from], ids[to]).expect("known nodes");
    }
    (graph, ids)
}

fn collect_dfs(graph: &Graph) -> Result<Vec<String>, DagRunError> {
    let mut seen = Vec::new();
    graph.dfs(|name| {
        seen.push(name.to_string());
        Ok(())
    })?;
    Ok(seen)
}

#[test]
fn display_lists_successors_in_wiring_order() {
    let (graph, _) = sample();
    assert_eq!(
        graph.to_string(),
        "[A]-> [C,D,]\n[B]-> [A,E,D,]\n[C]-> [D,]\n[D]-> [E,]\n[E]-> []\n"
    );
}

#[test]
fn dfs_visits_pre_order_from_insertion_roots() -> TestResult {
    let (graph, _) = sample();
    assert_eq!(collect_dfs(&graph)?, vec!["A", "C", "D", "E", "B"]);
    Ok(())
}

#[test]
fn dfs_reports_back_edge() {
    let (mut graph, ids) = sample();
    graph.add_edge(ids[4], ids[0]).unwrap();

    let err = collect_dfs(&graph).unwrap_err();
    assert!(matches!(
        &err,
        DagRunError::CycleEdge { from, to } if from == "E" && to == "A"
    ));
    assert_eq!(err.to_string(), "graph has cycle, cur node: E, next node: A");
    assert!(graph.has_cycle());
}

#[test]
fn bfs_peels_by_in_degree() -> TestResult {
    let (graph, _) = sample();
    let mut seen = Vec::new();
    graph.bfs(|name| {
        seen.push(name.to_string());
        Ok(())
    })?;
    assert_eq!(seen, vec!["B", "A", "C", "D", "E"]);
    assert_eq!(graph.topological_order()?, seen);
    Ok(())
}

#[test]
fn bfs_reports_cycle_members_sorted() {
    let mut graph = Graph::new();
    for n in ["root", "z", "y", "x", "tail"] {
        graph.add_node(n).unwrap();
    }
    graph.add_dependency("root", "z").unwrap();
    graph.add_dependency("z", "y").unwrap();
    graph.add_dependency("y", "x").unwrap();
    graph.add_dependency("x", "z").unwrap();
    graph.add_dependency("x", "tail").unwrap();

    let err = graph.bfs(|_| Ok(())).unwrap_err();
    match err {
        DagRunError::CycleNodes(nodes) => assert_eq!(nodes, vec!["tail", "x", "y", "z"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn walker_error_aborts_traversal() {
    let (graph, _) = sample();
    let mut visited = 0;
    let err = graph
        .dfs(|name| {
            visited += 1;
            if name == "D" {
                anyhow::bail!("stop at {name}");
            }
            Ok(())
        })
        .unwrap_err();

    assert!(matches!(err, DagRunError::Walk(_)));
    assert_eq!(err.to_string(), "walk func returned error: stop at D");
    assert_eq!(visited, 3);
}

#[test]
fn sources_sinks_and_degrees() {
    let (graph, ids) = sample();
    assert_eq!(graph.sources(), vec!["B"]);
    assert_eq!(graph.sinks(), vec!["E"]);
    assert_eq!(graph.in_degrees(), vec![1, 0, 1, 3, 2]);
    assert_eq!(graph.out_degree(ids[1]), 3);
    assert_eq!(graph.edge_count(), 7);
    assert!(graph.check_acyclic().is_ok());
}

#[test]
fn duplicate_node_is_rejected() {
    let mut graph = Graph::new();
    graph.add_node("A").unwrap();
    let err = graph.add_node("A").unwrap_err();
    assert!(matches!(err, DagRunError::TaskExists(name) if name == "A"));
}

#[test]
fn dependency_on_unknown_node_names_the_dependent() {
    let mut graph = Graph::new();
    graph.add_node("build").unwrap();
    let err = graph.add_dependency("fetch", "build").unwrap_err();
    assert_eq!(
        err.to_string(),
        "dagrun: task not found: fetch (dependency of task: build)"
    );
}

#[test]
fn empty_graph_is_trivially_acyclic() -> TestResult {
    let graph = Graph::new();
    assert!(graph.is_empty());
    graph.check_acyclic()?;
    assert!(graph.topological_order()?.is_empty());
    Ok(())
}
