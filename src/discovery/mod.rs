// src/discovery/mod.rs

//! Discovery of operations the resolver has not been told about.
//!
//! Ingestion signals new operations directly through the
//! [`Injector`](crate::engine::Injector); the poller here is the fallback
//! that reconciles the store with the resolver on a fixed interval.

pub mod poller;

pub use poller::{Sweep, spawn_poller, sweep};
