mod common;
use crate::common::{TaskBuilder, TestResult, scheduler_with};

use dagrun::dag::{DotOptions, Graph};
use dagrun::errors::DagRunError;

fn sample() -> Graph {
    let mut graph = Graph::new();
    for n in ["A", "B", "C", "D", "E"] {
        graph.add_node(n).unwrap();
    }
    for (dep, task) in [
        ("B", "A"),
        ("B", "E"),
        ("B", "D"),
        ("A", "C"),
        ("A", "D"),
        ("C", "D"),
        ("D", "E"),
    ] {
        graph.add_dependency(dep, task).unwrap();
    }
    graph
}

#[test]
fn renders_sorted_groups_with_start_and_end() {
    let expected = "
digraph G {
\"start\"[shape=box,color=\"green\"]
\"end\"[shape=box,color=\"red\"]
\"A\" -> {\"C\",\"D\"}
\"B\" -> {\"A\",\"D\",\"E\"}
\"C\" -> {\"D\"}
\"D\" -> {\"E\"}
\"start\" -> {\"B\"}
{\"E\"}  -> \"end\"
}
";
    assert_eq!(sample().dot(&DotOptions::new()), expected);
}

#[test]
fn attribute_lines_follow_the_header() {
    let options = DotOptions::new()
        .with_graph_attr("label=\"testDot\"")
        .with_graph_attr("rankdir=LR")
        .with_node_attr("color=\"blue\"")
        .with_edge_attr("fontcolor=\"red\"");

    let out = sample().dot(&options);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[1], "digraph G {");
    assert_eq!(lines[2], "graph [label=\"testDot\",rankdir=LR]");
    assert_eq!(lines[3], "node [color=\"blue\"]");
    assert_eq!(lines[4], "edge [fontcolor=\"red\"]");
}

#[test]
fn rendering_is_byte_identical_across_calls() {
    let graph = sample();
    let options = DotOptions::new().with_graph_attr("rankdir=LR");
    assert_eq!(graph.dot(&options), graph.dot(&options));
}

#[test]
fn scheduler_dot_wires_without_running() -> TestResult {
    let mut s = scheduler_with(vec![
        TaskBuilder::new("fetch").build(),
        TaskBuilder::new("parse").after("fetch").build(),
        TaskBuilder::new("report").after("parse").build(),
    ]);

    let out = s.dot(&DotOptions::new())?;
    assert!(out.contains("\"fetch\" -> {\"parse\"}"));
    assert!(out.contains("\"start\" -> {\"fetch\"}"));
    assert!(out.contains("{\"report\"}  -> \"end\""));
    assert!(!s.is_sealed());
    Ok(())
}

#[test]
fn scheduler_dot_reflects_later_submissions() -> TestResult {
    let mut s = scheduler_with(vec![TaskBuilder::new("A").build()]);
    let before = s.dot(&DotOptions::new())?;
    assert!(before.contains("\"start\" -> {\"A\"}"));
    assert!(before.contains("{\"A\"}  -> \"end\""));

    s.submit(TaskBuilder::new("B").after("A").build())?;
    let after = s.dot(&DotOptions::new())?;
    assert_ne!(before, after);
    assert!(after.contains("\"A\" -> {\"B\"}"));
    assert!(after.contains("{\"B\"}  -> \"end\""));
    assert_eq!(s.graph().len(), 2);
    Ok(())
}

#[test]
fn scheduler_dot_surfaces_missing_dependency() {
    let mut s = scheduler_with(vec![TaskBuilder::new("parse").after("fetch").build()]);
    let err = s.dot(&DotOptions::new()).unwrap_err();
    assert!(matches!(err, DagRunError::TaskNotFound { .. }));
}
