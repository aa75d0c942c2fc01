mod common;
use crate::common::{Recorder, TaskBuilder, TestResult, init_tracing, token, with_timeout};

use std::sync::Arc;

use dagrun::errors::DagRunError;
use dagrun::{Scheduler, TaskRegistry};

fn registry() -> TaskRegistry<Recorder> {
    let mut reg = TaskRegistry::new();
    for spec in [
        TaskBuilder::new("fetch").build(),
        TaskBuilder::new("decode").after("fetch").build(),
        TaskBuilder::new("index").after("decode").build(),
        TaskBuilder::new("report").after("decode").after("fetch").build(),
        TaskBuilder::new("lint").build(),
    ] {
        reg.register(spec).expect("unique names");
    }
    reg
}

#[test]
fn register_rejects_duplicates_and_empty_names() {
    let mut reg = registry();
    assert_eq!(reg.len(), 5);

    let err = reg.register(TaskBuilder::new("fetch").build()).unwrap_err();
    assert!(matches!(err, DagRunError::TaskExists(ref n) if n == "fetch"));

    let err = reg.register(TaskBuilder::new("").build()).unwrap_err();
    assert!(matches!(err, DagRunError::NoTaskName));
    assert_eq!(reg.names(), vec!["decode", "fetch", "index", "lint", "report"]);
}

#[test]
fn get_unknown_task_fails() {
    let reg = registry();
    assert!(reg.contains("lint"));
    assert_eq!(reg.get("lint").map(|s| s.name()).ok(), Some("lint"));
    assert!(matches!(
        reg.get("nope"),
        Err(DagRunError::TaskNotFound { required_by: None, .. })
    ));
}

#[test]
fn resolve_collects_transitive_dependencies() -> TestResult {
    let reg = registry();
    let names: Vec<String> = reg
        .resolve_with_dependencies(&["report"])?
        .iter()
        .map(|s| s.name().to_string())
        .collect();
    assert_eq!(names, vec!["decode", "fetch", "report"]);
    Ok(())
}

#[test]
fn resolve_reports_who_needed_a_missing_task() {
    let mut reg: TaskRegistry<Recorder> = TaskRegistry::new();
    reg.register(TaskBuilder::new("build").after("codegen").build())
        .unwrap();

    let err = reg.resolve_with_dependencies(&["build"]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "dagrun: task not found: codegen (dependency of task: build)"
    );
}

#[tokio::test]
async fn resolved_subset_runs_on_a_scheduler() -> TestResult {
    init_tracing();
    let reg = registry();
    let mut s: Scheduler<Recorder> = Scheduler::new();
    s.submit_all(reg.resolve_with_dependencies(&["index"])?)?;

    let rec = Recorder::shared();
    with_timeout(s.run(&token(), Arc::clone(&rec))).await?;
    assert_eq!(rec.order(), vec!["fetch", "decode", "index"]);
    assert!(!rec.ran("lint"));
    Ok(())
}
