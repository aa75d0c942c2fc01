// src/exec/mod.rs

//! Task body execution.
//!
//! [`runner`] wraps a single task body with the injector hooks, the retry
//! loop and the optional timeout, and turns panics into errors. It knows
//! nothing about the graph; the engine calls it once per node.

pub mod runner;

pub use runner::run_task;
