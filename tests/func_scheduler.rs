mod common;
use crate::common::{TestResult, init_tracing, with_timeout};

use std::future::{Ready, ready};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dagrun::dag::DotOptions;
use dagrun::errors::DagRunError;
use dagrun::{FuncScheduler, timeout};

type Log = Arc<Mutex<Vec<&'static str>>>;

/// A body that appends `name` to `log`.
fn push(log: &Log, name: &'static str) -> impl Fn() -> Ready<anyhow::Result<()>> + Send + Sync + 'static {
    let log = Arc::clone(log);
    move || {
        log.lock().unwrap().push(name);
        ready(Ok(()))
    }
}

#[tokio::test]
async fn chained_submissions_run_in_dependency_order() -> TestResult {
    init_tracing();
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut s = FuncScheduler::new();
    s.submit("T1", &[], push(&log, "T1"))
        .submit("T2", &["T1"], push(&log, "T2"))
        .submit("T3", &["T2"], push(&log, "T3"));

    assert!(s.err().is_none());
    with_timeout(s.run()).await?;
    assert_eq!(*log.lock().unwrap(), vec!["T1", "T2", "T3"]);

    let dot = s.dot(&DotOptions::new())?;
    assert!(dot.contains("\"T1\" -> {\"T2\"}"));
    Ok(())
}

#[tokio::test]
async fn duplicate_submission_is_latched() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut s = FuncScheduler::new();
    s.submit("T1", &[], push(&log, "T1"))
        .submit("T1", &[], push(&log, "again"));

    assert!(matches!(s.err(), Some(DagRunError::TaskExists(_))));
    let err = s.run().await.unwrap_err();
    assert!(matches!(err, DagRunError::TaskExists(_)));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn options_apply_to_func_tasks() {
    init_tracing();
    let mut s = FuncScheduler::new();
    s.submit_with_options("slow", &[], [timeout(Duration::from_millis(30))], || async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        Ok(())
    });

    let err = with_timeout(s.run()).await.unwrap_err();
    assert!(matches!(err, DagRunError::Timeout { .. }));
}
