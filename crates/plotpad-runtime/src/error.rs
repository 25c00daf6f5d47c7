//! Error types for runtime bootstrap and script execution.
//!
//! The two families are deliberately separate: a [`BootstrapError`] is fatal
//! to the session (the runtime never becomes ready), while an [`ExecError`]
//! settles a single run and leaves the session usable.

use std::io;

/// Errors raised while bootstrapping the Python runtime.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Failed to download the runtime archive.
    #[error("failed to download Python runtime: {0}")]
    Download(String),

    /// Checksum mismatch after downloading an archive.
    #[error("checksum mismatch for {name}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Archive label (the runtime or a package name).
        name: String,
        /// Expected checksum.
        expected: String,
        /// Actual checksum.
        actual: String,
    },

    /// Failed to install an extension package.
    #[error("failed to install extension package {name}: {reason}")]
    Package {
        /// Package name.
        name: String,
        /// What went wrong.
        reason: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// WASM runtime error.
    #[error("WASM runtime error: {0}")]
    Wasm(#[from] anyhow::Error),

    /// Bootstrap already failed for this session; the message is the
    /// original diagnostic. Recovery is a fresh session, not a retry.
    #[error("runtime bootstrap previously failed: {0}")]
    Unavailable(String),

    /// The session was closed while bootstrap was outstanding.
    #[error("session closed during bootstrap")]
    Cancelled,
}

/// Errors raised while executing a guest script.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The guest script raised an uncaught error; the message is the guest
    /// diagnostic, ideally a full traceback.
    #[error("{message}")]
    Guest {
        /// Guest-side diagnostic text.
        message: String,
    },

    /// IO error staging or reading the run's scratch directory.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// WASM runtime error.
    #[error("WASM runtime error: {0}")]
    Wasm(#[from] anyhow::Error),
}

impl ExecError {
    /// A non-empty user-facing diagnostic for this error.
    pub fn diagnostic(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            "unknown error".to_string()
        } else {
            message
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_diagnostic_is_the_message() {
        let err = ExecError::Guest {
            message: "NameError: name 'x' is not defined".to_string(),
        };
        assert_eq!(err.diagnostic(), "NameError: name 'x' is not defined");
    }

    #[test]
    fn test_empty_guest_message_falls_back() {
        let err = ExecError::Guest {
            message: String::new(),
        };
        assert_eq!(err.diagnostic(), "unknown error");
    }

    #[test]
    fn test_checksum_mismatch_names_the_archive() {
        let err = BootstrapError::ChecksumMismatch {
            name: "matplotlib".to_string(),
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("matplotlib"));
        assert!(text.contains("aa"));
        assert!(text.contains("bb"));
    }
}
