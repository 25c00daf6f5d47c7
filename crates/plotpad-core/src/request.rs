//! The source text snapshot for one run.

use serde::{Deserialize, Serialize};

/// An immutable snapshot of the user's source text, taken when a run starts.
///
/// Edits made to the editor buffer after a run begins never affect the run in
/// flight; the snapshot is what executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest(String);

impl RunRequest {
    /// Snapshot the given source text.
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    /// The verbatim source text.
    pub fn source(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RunRequest {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}
