//! plotpad: run Python, capture prints and plots.
//!
//! plotpad embeds a CPython-WASI runtime in the host process, bootstraps it
//! exactly once per session, and executes one user script at a time with its
//! stdout/stderr captured and every matplotlib figure returned as an encoded
//! PNG artifact, in the order the script showed them.
//!
//! # Example
//!
//! ```no_run
//! use plotpad::{Session, DEFAULT_SOURCE};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::new();
//! session.initialize().await?;
//!
//! let result = session.run_once(DEFAULT_SOURCE).await?;
//! assert!(result.is_success());
//! assert_eq!(result.images().len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! Progress while the runtime boots is observable through
//! [`Session::subscribe`]; a consumer renders the
//! [`RuntimeState`] display string and enables its run trigger once the
//! state is ready.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod session;

pub use plotpad_core::{
    ArtifactError, ImageArtifact, RunRequest, RunResult, RuntimeState, PNG_MIME,
};
pub use plotpad_runtime::{
    ArtifactSink, Bootstrap, BootstrapError, ExecError, PythonRuntime, RuntimeConfig,
    ScriptExecutor,
};
pub use session::{RunRejected, Session};

/// Default script preloaded into the editor on first load.
///
/// Produces exactly one figure and no text output.
pub const DEFAULT_SOURCE: &str = r#"import matplotlib.pyplot as plt
import numpy as np

x = np.linspace(0.0, 2.0 * np.pi, 200)
plt.plot(x, np.sin(x))
plt.title("sin(x)")
plt.show()
"#;
