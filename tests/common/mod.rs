#![allow(dead_code)]

pub use dagrun_test_utils::builders::TaskBuilder;
pub use dagrun_test_utils::fake_tasks::Recorder;
pub use dagrun_test_utils::{init_tracing, with_timeout};

use dagrun::{CancellationToken, Scheduler};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Scheduler with every spec submitted, panicking on submission errors.
pub fn scheduler_with(specs: Vec<dagrun::TaskSpec<Recorder>>) -> Scheduler<Recorder> {
    let mut s = Scheduler::new();
    s.submit_all(specs).expect("submission should succeed");
    s
}

pub fn token() -> CancellationToken {
    CancellationToken::new()
}
