// src/exec/mod.rs

//! Worker pool.
//!
//! A fixed number of Tokio tasks share one bounded input channel of
//! operation ids. Each worker claims an operation under the store's update
//! lock, runs the calculation engine with the configured simulated
//! duration, records the outcome under the lock again and reports back to
//! the resolver.
//!
//! - [`executor_loop`] spawns the workers and owns their receive loop.
//! - [`task_runner`] handles one operation from claim to recorded outcome.

pub mod executor_loop;
pub mod task_runner;

pub use executor_loop::{WorkerPool, WorkerSettings, spawn_workers};
