//! Core types for plotpad
//!
//! This crate provides the fundamental types shared by the plotpad runtime
//! and session crates:
//!
//! - [`RuntimeState`] - Lifecycle states of the embedded Python runtime
//! - [`RunRequest`] - An immutable snapshot of user source text for one run
//! - [`RunResult`] - The outcome of one run: captured text plus images, or a failure
//! - [`ImageArtifact`] - One encoded plot image emitted by guest code
//!
//! # Example
//!
//! ```
//! use plotpad_core::{ImageArtifact, RunResult};
//!
//! let image = ImageArtifact::from_data_uri("data:image/png;base64,iVBORw0KGgo=").unwrap();
//! let result = RunResult::success("hello\n", vec![image]);
//!
//! assert!(result.is_success());
//! assert_eq!(result.images().len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod artifact;
pub mod request;
pub mod result;
pub mod state;

pub use artifact::{ArtifactError, ImageArtifact, PNG_MIME};
pub use request::RunRequest;
pub use result::RunResult;
pub use state::RuntimeState;
