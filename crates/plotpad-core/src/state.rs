//! Lifecycle states of the embedded Python runtime.
//!
//! A session's runtime moves through a fixed sequence of states while it is
//! bootstrapped: download, construction, extension loading, then [`Ready`].
//! The sequence is strictly monotonic, with one exception: [`Failed`] is
//! reachable from every non-terminal state and is absorbing.
//!
//! [`Ready`]: RuntimeState::Ready
//! [`Failed`]: RuntimeState::Failed

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the embedded Python runtime.
///
/// Observed by consumers through a watch channel; the [`fmt::Display`]
/// rendering is the human-readable progress line shown while the runtime
/// boots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum RuntimeState {
    /// Bootstrap has not started.
    Uninitialized,
    /// The runtime archive is being downloaded.
    Fetching,
    /// The wasm module is being compiled and the engine constructed.
    Initializing,
    /// Extension packages (the plotting stack) are being installed.
    LoadingExtensions,
    /// The runtime is ready to execute scripts.
    Ready,
    /// Bootstrap failed; the message is the triggering diagnostic.
    ///
    /// This state is absorbing: no further transitions are accepted.
    Failed(String),
}

impl RuntimeState {
    /// Whether scripts may be executed in this state.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Whether bootstrap has failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Whether this state accepts no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed(_))
    }

    /// Position of this state in the bootstrap sequence.
    fn rank(&self) -> u8 {
        match self {
            Self::Uninitialized => 0,
            Self::Fetching => 1,
            Self::Initializing => 2,
            Self::LoadingExtensions => 3,
            Self::Ready => 4,
            Self::Failed(_) => 5,
        }
    }

    /// Whether a transition from `self` to `next` is legal.
    ///
    /// Legal transitions advance one step along the bootstrap sequence, or
    /// jump to [`RuntimeState::Failed`] from any non-terminal state.
    pub fn accepts(&self, next: &Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Failed(_) => true,
            other => other.rank() == self.rank() + 1,
        }
    }
}

impl fmt::Display for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "runtime not initialized"),
            Self::Fetching => write!(f, "downloading Python runtime"),
            Self::Initializing => write!(f, "initializing Python runtime"),
            Self::LoadingExtensions => write!(f, "loading plotting packages"),
            Self::Ready => write!(f, "ready"),
            Self::Failed(message) => write!(f, "initialization failed: {message}"),
        }
    }
}
