//! Embedded CPython-WASI runtime for plotpad.
//!
//! This crate owns the heavyweight half of plotpad: it downloads and caches
//! the CPython runtime compiled to WASI, compiles it into a wasmtime module,
//! installs the plotting packages the execution harness requires, and runs
//! one user script per call with stdout/stderr captured and every matplotlib
//! figure routed back to the host as an encoded PNG.
//!
//! # Architecture
//!
//! - [`Bootstrap`] drives the one-shot async initialization sequence and
//!   publishes [`RuntimeState`](plotpad_core::RuntimeState) transitions
//!   through a watch channel.
//! - [`PythonRuntime`] is the bootstrapped, process-lifetime resource: the
//!   compiled module plus the cached stdlib and site-packages paths. Each
//!   run instantiates a fresh store against it.
//! - [`ArtifactSink`] is the host-side buffer figures are collected into,
//!   scoped to exactly one run.
//!
//! Guest code communicates with the host through a per-run scratch directory
//! preopened into the WASI filesystem: the host writes the user source and
//! the fixed harness script in, the guest writes captured text, emitted
//! figures, and error reports out.
//!
//! # Limitations
//!
//! - One script executes at a time; the runtime has no internal concurrency.
//! - Execution has no time limit: a script that never terminates blocks its
//!   run indefinitely.
//! - Only packages compiled for WASI in the pinned distribution are
//!   available to guest code.

#![warn(missing_docs)]

mod download;
mod harness;
mod protocol;

pub mod bootstrap;
pub mod error;
pub mod executor;
pub mod sink;

pub use bootstrap::{Bootstrap, RuntimeConfig};
pub use error::{BootstrapError, ExecError};
pub use executor::{PythonRuntime, ScriptExecutor};
pub use sink::ArtifactSink;
