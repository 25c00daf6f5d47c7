//! One-shot asynchronous bootstrap of the embedded Python runtime.
//!
//! Bootstrap runs once per session and performs, in order: download of the
//! runtime archive, construction of the wasm engine and module, and
//! installation of the extension packages. Each step publishes its
//! [`RuntimeState`] through a watch channel before the step begins, so a
//! consumer can render progress while the blocking work runs on the blocking
//! pool. Any step failure aborts the remainder and latches the `Failed`
//! state; there is no automatic retry.

use crate::download;
use crate::error::BootstrapError;
use crate::executor::PythonRuntime;
use plotpad_core::RuntimeState;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task;

/// Configuration for locating and caching the runtime.
///
/// These are deployment constants rather than end-user settings; the
/// defaults pin the release the engine was tested against.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Pinned runtime version identifier.
    pub version: String,
    /// Base URL the runtime archive and extension packages are fetched from.
    pub base_url: String,
    /// Cache directory override; defaults to the user cache directory.
    pub cache_dir: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            version: download::RUNTIME_VERSION.to_string(),
            base_url: download::BASE_URL.to_string(),
            cache_dir: None,
        }
    }
}

/// Drives the one-shot bootstrap sequence and publishes its progress.
///
/// The liveness flag set by [`shutdown`](Self::shutdown) guards every state
/// mutation: once the owning session is torn down, a late bootstrap
/// continuation becomes a no-op instead of resurrecting state.
pub struct Bootstrap {
    config: RuntimeConfig,
    state: watch::Sender<RuntimeState>,
    alive: Arc<AtomicBool>,
}

impl Bootstrap {
    /// A bootstrap that has not started.
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_initial(config, RuntimeState::Uninitialized)
    }

    /// A bootstrap that is already `Ready`.
    ///
    /// Used by sessions whose executor is provided externally instead of
    /// being built from the downloaded runtime.
    pub fn ready(config: RuntimeConfig) -> Self {
        Self::with_initial(config, RuntimeState::Ready)
    }

    fn with_initial(config: RuntimeConfig, initial: RuntimeState) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            config,
            state,
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    /// The current runtime state.
    pub fn state(&self) -> RuntimeState {
        self.state.borrow().clone()
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<RuntimeState> {
        self.state.subscribe()
    }

    /// Whether the owning session is still live.
    pub fn is_live(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Signal teardown: no state mutation is applied after this returns.
    pub fn shutdown(&self) {
        self.alive.store(false, Ordering::Release);
        tracing::debug!("bootstrap liveness flag cleared");
    }

    /// Run the bootstrap sequence to completion.
    ///
    /// On success the state is `Ready` and the bootstrapped runtime is
    /// returned. On failure the state is latched to `Failed` with the
    /// triggering diagnostic, except when the failure is the session being
    /// closed, which leaves the state untouched.
    pub async fn initialize(&self) -> Result<PythonRuntime, BootstrapError> {
        match self.run_steps().await {
            Ok(runtime) => {
                self.advance(RuntimeState::Ready)?;
                Ok(runtime)
            }
            Err(BootstrapError::Cancelled) => Err(BootstrapError::Cancelled),
            Err(err) => {
                self.mark_failed(&err);
                Err(err)
            }
        }
    }

    async fn run_steps(&self) -> Result<PythonRuntime, BootstrapError> {
        if let RuntimeState::Failed(message) = self.state() {
            return Err(BootstrapError::Unavailable(message));
        }

        self.advance(RuntimeState::Fetching)?;
        let config = self.config.clone();
        let wasm_path = run_blocking(move || download::ensure_runtime(&config)).await?;

        self.advance(RuntimeState::Initializing)?;
        let (engine, module) = run_blocking(move || PythonRuntime::load_module(&wasm_path)).await?;

        self.advance(RuntimeState::LoadingExtensions)?;
        let config = self.config.clone();
        let site_packages = run_blocking(move || download::ensure_packages(&config)).await?;

        let stdlib = download::stdlib_path(&self.config)?;
        Ok(PythonRuntime::new(engine, module, stdlib, site_packages))
    }

    fn advance(&self, next: RuntimeState) -> Result<(), BootstrapError> {
        if !self.is_live() {
            return Err(BootstrapError::Cancelled);
        }
        let mut advanced = false;
        self.state.send_modify(|state| {
            if state.accepts(&next) {
                *state = next.clone();
                advanced = true;
            }
        });
        if advanced {
            tracing::info!(state = %next, "bootstrap state advanced");
            Ok(())
        } else {
            Err(BootstrapError::Unavailable(format!(
                "illegal bootstrap transition from '{}' to '{next}'",
                self.state()
            )))
        }
    }

    fn mark_failed(&self, err: &BootstrapError) {
        if !self.is_live() {
            return;
        }
        tracing::error!(error = %err, "runtime bootstrap failed");
        self.state.send_modify(|state| {
            let failed = RuntimeState::Failed(err.to_string());
            if state.accepts(&failed) {
                *state = failed;
            }
        });
    }
}

/// Run a blocking bootstrap step on the blocking pool.
async fn run_blocking<T, F>(step: F) -> Result<T, BootstrapError>
where
    F: FnOnce() -> Result<T, BootstrapError> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(step)
        .await
        .map_err(|err| BootstrapError::Wasm(anyhow::anyhow!("bootstrap task aborted: {err}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_config(cache: &tempfile::TempDir) -> RuntimeConfig {
        RuntimeConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            cache_dir: Some(cache.path().to_path_buf()),
            ..RuntimeConfig::default()
        }
    }

    #[test]
    fn test_new_bootstrap_is_uninitialized() {
        let bootstrap = Bootstrap::new(RuntimeConfig::default());
        assert_eq!(bootstrap.state(), RuntimeState::Uninitialized);
        assert!(bootstrap.is_live());
    }

    #[test]
    fn test_ready_bootstrap_skips_the_sequence() {
        let bootstrap = Bootstrap::ready(RuntimeConfig::default());
        assert!(bootstrap.state().is_ready());
    }

    #[tokio::test]
    async fn test_initialize_after_shutdown_mutates_nothing() {
        let bootstrap = Bootstrap::new(RuntimeConfig::default());
        bootstrap.shutdown();

        let err = bootstrap.initialize().await.unwrap_err();
        assert!(matches!(err, BootstrapError::Cancelled));
        assert_eq!(bootstrap.state(), RuntimeState::Uninitialized);
    }

    #[tokio::test]
    async fn test_unreachable_host_latches_failed_state() {
        let cache = tempfile::tempdir().unwrap();
        let bootstrap = Bootstrap::new(offline_config(&cache));

        let err = bootstrap.initialize().await.unwrap_err();
        assert!(matches!(err, BootstrapError::Download(_)));
        assert!(bootstrap.state().is_failed());
        assert!(bootstrap.state().to_string().contains("failed"));
    }

    #[tokio::test]
    async fn test_failed_bootstrap_is_not_retried() {
        let cache = tempfile::tempdir().unwrap();
        let bootstrap = Bootstrap::new(offline_config(&cache));

        bootstrap.initialize().await.unwrap_err();
        let err = bootstrap.initialize().await.unwrap_err();
        assert!(matches!(err, BootstrapError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_subscribers_observe_the_failure() {
        let cache = tempfile::tempdir().unwrap();
        let bootstrap = Bootstrap::new(offline_config(&cache));
        let rx = bootstrap.subscribe();

        bootstrap.initialize().await.unwrap_err();
        assert!(rx.borrow().is_failed());
    }
}
