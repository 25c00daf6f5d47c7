//! The run orchestrator.
//!
//! A [`Session`] owns the bootstrapped runtime and sequences runs against
//! it: it gates on readiness, enforces that at most one run is in flight,
//! clears the previous result before computing a new one, and converts guest
//! failures into [`RunResult::Failure`] instead of letting them escape.

use parking_lot::Mutex;
use plotpad_core::{RunRequest, RunResult, RuntimeState};
use plotpad_runtime::{
    ArtifactSink, Bootstrap, BootstrapError, RuntimeConfig, ScriptExecutor,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, OnceCell};
use tokio::task;

/// Why a run request was rejected at the caller boundary.
///
/// A rejection is a no-op: no result state is touched. It is distinct from
/// [`RunResult::Failure`], which is the settled outcome of an accepted run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RunRejected {
    /// The runtime is not ready; initialize the session first.
    #[error("runtime is not ready")]
    NotReady,

    /// A run is already in flight; requests are rejected, not queued.
    #[error("a run is already in flight")]
    Busy,

    /// The session has been closed.
    #[error("session is closed")]
    Closed,
}

/// One user-facing execution session over the embedded runtime.
///
/// The session is the only component allowed to invoke guest execution; all
/// access to the runtime goes through [`run_once`](Self::run_once) under the
/// one-run-at-a-time discipline.
pub struct Session {
    bootstrap: Bootstrap,
    executor: OnceCell<Arc<dyn ScriptExecutor>>,
    in_flight: AtomicBool,
    current: Mutex<Option<RunResult>>,
}

impl Session {
    /// A session over the default runtime configuration.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// A session over a custom runtime configuration.
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self::build(Bootstrap::new(config))
    }

    /// A session over an externally provided executor.
    ///
    /// Skips bootstrap entirely; the session starts ready. Useful for
    /// embedders with their own runtime and for tests.
    pub fn with_executor(executor: Arc<dyn ScriptExecutor>) -> Self {
        let session = Self::build(Bootstrap::ready(RuntimeConfig::default()));
        let _ = session.executor.set(executor);
        session
    }

    fn build(bootstrap: Bootstrap) -> Self {
        Self {
            bootstrap,
            executor: OnceCell::new(),
            in_flight: AtomicBool::new(false),
            current: Mutex::new(None),
        }
    }

    /// Bootstrap the runtime, exactly once per session.
    ///
    /// Concurrent callers share the same bootstrap; later callers observe
    /// its outcome. Once bootstrap has failed, further calls are rejected
    /// with the latched diagnostic rather than retried.
    pub async fn initialize(&self) -> Result<(), BootstrapError> {
        if self.executor.get().is_some() {
            return Ok(());
        }
        if !self.bootstrap.is_live() {
            return Err(BootstrapError::Cancelled);
        }
        if let RuntimeState::Failed(message) = self.bootstrap.state() {
            return Err(BootstrapError::Unavailable(message));
        }

        self.executor
            .get_or_try_init(|| async {
                let runtime = self.bootstrap.initialize().await?;
                Ok::<_, BootstrapError>(Arc::new(runtime) as Arc<dyn ScriptExecutor>)
            })
            .await?;
        Ok(())
    }

    /// The current runtime state.
    pub fn state(&self) -> RuntimeState {
        self.bootstrap.state()
    }

    /// Subscribe to runtime state transitions, for progress rendering.
    pub fn subscribe(&self) -> watch::Receiver<RuntimeState> {
        self.bootstrap.subscribe()
    }

    /// Whether a run is currently in flight.
    ///
    /// Consumers use this to disable their run trigger instead of relying
    /// on [`RunRejected::Busy`].
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// The settled result of the most recent accepted run, if any.
    pub fn current_result(&self) -> Option<RunResult> {
        self.current.lock().clone()
    }

    /// Close the session.
    ///
    /// Outstanding bootstrap or run continuations become no-ops: no state is
    /// published after this returns.
    pub fn close(&self) {
        self.bootstrap.shutdown();
    }

    /// Execute one run of `source` and settle it into a [`RunResult`].
    ///
    /// Rejected without side effects unless the runtime is ready and no run
    /// is in flight. The previous result is cleared as soon as the run is
    /// accepted, before its own outcome is known. Overlapping requests are
    /// rejected, never queued; runs are not cancellable once started.
    pub async fn run_once(&self, source: &str) -> Result<RunResult, RunRejected> {
        if !self.bootstrap.is_live() {
            return Err(RunRejected::Closed);
        }
        let executor = match self.executor.get() {
            Some(executor) if self.bootstrap.state().is_ready() => Arc::clone(executor),
            _ => return Err(RunRejected::NotReady),
        };
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(RunRejected::Busy);
        }

        self.current.lock().take();
        let request = RunRequest::new(source);

        let outcome = task::spawn_blocking(move || {
            let mut sink = ArtifactSink::new();
            sink.arm();
            let outcome = executor.execute(request.source(), &mut sink);
            (outcome, sink)
        })
        .await;

        let result = match outcome {
            Ok((Ok(text), mut sink)) => RunResult::success(text, sink.settle()),
            Ok((Err(err), _)) => {
                tracing::debug!(error = %err, "guest run failed");
                RunResult::failure(err.diagnostic())
            }
            Err(join_err) => RunResult::failure(format!("execution task failed: {join_err}")),
        };

        if self.bootstrap.is_live() {
            *self.current.lock() = Some(result.clone());
        }
        self.in_flight.store(false, Ordering::Release);

        Ok(result)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
