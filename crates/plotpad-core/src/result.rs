//! The outcome of one run.

use crate::ImageArtifact;
use serde::{Deserialize, Serialize};

/// The outcome of executing one [`RunRequest`](crate::RunRequest).
///
/// Exactly one result is "current" per session at any time; starting a new
/// run clears the previous one before the new outcome is known, so consumers
/// never render stale output under fresh output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunResult {
    /// The script ran to completion.
    Success {
        /// Everything the script wrote to stdout and stderr, in program order.
        ///
        /// Empty when the script produced no output; that is still success.
        text: String,
        /// Captured plot images, in guest emission order.
        images: Vec<ImageArtifact>,
    },
    /// The script raised an uncaught error.
    Failure {
        /// The guest diagnostic, ideally a full traceback.
        message: String,
    },
}

impl RunResult {
    /// Build a success result.
    pub fn success(text: impl Into<String>, images: Vec<ImageArtifact>) -> Self {
        Self::Success {
            text: text.into(),
            images,
        }
    }

    /// Build a failure result.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    /// Whether the run completed without error.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Whether the run ended in a guest error.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Captured text for a success, empty for a failure.
    pub fn text(&self) -> &str {
        match self {
            Self::Success { text, .. } => text,
            Self::Failure { .. } => "",
        }
    }

    /// Captured images for a success, empty for a failure.
    pub fn images(&self) -> &[ImageArtifact] {
        match self {
            Self::Success { images, .. } => images,
            Self::Failure { .. } => &[],
        }
    }
}
