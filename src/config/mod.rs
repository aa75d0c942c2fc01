// src/config/mod.rs

//! Configuration loading and validation for dagrun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk or a string (`loader.rs`).
//! - Validate durations, task keys and log levels (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{from_toml_str, load_and_validate, load_from_path};
pub use model::{LogSection, OptionOverrides, OptionSection, RawSchedulerConfig, SchedulerConfig};
pub use validate::parse_duration;
