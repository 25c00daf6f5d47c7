//! Script execution against the bootstrapped runtime.
//!
//! The bootstrapped [`PythonRuntime`] is reused for every run in a session.
//! Each run instantiates a fresh store over the compiled module, so guest
//! state never leaks between runs, and stages a fresh scratch directory for
//! the host-guest protocol.
//!
//! Execution deliberately carries no fuel, epoch, or wall-clock limit: a
//! script that never terminates blocks its run indefinitely.

use crate::error::{BootstrapError, ExecError};
use crate::protocol;
use crate::sink::ArtifactSink;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wasmtime::{Engine, Linker, Module, Store};
use wasmtime_wasi::p1;
use wasmtime_wasi::{DirPerms, FilePerms, WasiCtxBuilder};

/// Executes one guest script per call.
///
/// Abstracted as a trait so the session orchestrator can be driven by stub
/// executors in tests or by an embedder-provided runtime.
pub trait ScriptExecutor: Send + Sync {
    /// Run `source` to completion, emitting captured figures into `sink` in
    /// guest emission order, and return the captured stdout/stderr text.
    fn execute(&self, source: &str, sink: &mut ArtifactSink) -> Result<String, ExecError>;
}

/// The bootstrapped CPython-WASI runtime.
///
/// Holds the compiled module and the cached stdlib and site-packages paths
/// produced by bootstrap. This is a process-lifetime resource: it is never
/// torn down and re-created within a session.
#[derive(Debug)]
pub struct PythonRuntime {
    engine: Arc<Engine>,
    module: Module,
    stdlib_path: PathBuf,
    site_packages: PathBuf,
}

impl PythonRuntime {
    pub(crate) fn new(
        engine: Arc<Engine>,
        module: Module,
        stdlib_path: PathBuf,
        site_packages: PathBuf,
    ) -> Self {
        Self {
            engine,
            module,
            stdlib_path,
            site_packages,
        }
    }

    /// Compile the runtime module, or load the precompiled form cached next
    /// to it.
    #[allow(unsafe_code)] // Module::deserialize is unsafe but we load our own compiled code
    pub(crate) fn load_module(wasm_path: &Path) -> Result<(Arc<Engine>, Module), BootstrapError> {
        let engine = Arc::new(Engine::default());

        let cache_path = wasm_path.with_extension("cwasm");
        let module = if cache_path.exists() {
            // SAFETY: We compiled this module ourselves with the same engine config
            unsafe { Module::deserialize_file(&engine, &cache_path)? }
        } else {
            tracing::info!(path = %wasm_path.display(), "compiling Python wasm module");
            let module = Module::from_file(&engine, wasm_path)?;

            // Cache the compiled module for the next session
            if let Ok(bytes) = module.serialize() {
                let _ = std::fs::write(&cache_path, bytes);
            }
            module
        };

        Ok((engine, module))
    }
}

impl ScriptExecutor for PythonRuntime {
    fn execute(&self, source: &str, sink: &mut ArtifactSink) -> Result<String, ExecError> {
        let work_dir = tempfile::tempdir()?;
        protocol::stage_run(work_dir.path(), source)?;

        // The python-wasi root (parent of lib) is mapped as "." so the
        // interpreter can find ./lib
        let python_root = self.stdlib_path.parent().unwrap_or(&self.stdlib_path);

        let mut wasi_builder = WasiCtxBuilder::new();
        wasi_builder.inherit_stderr();
        wasi_builder.preopened_dir(python_root, ".", DirPerms::READ, FilePerms::READ)?;
        wasi_builder.preopened_dir(
            &self.site_packages,
            "site-packages",
            DirPerms::READ,
            FilePerms::READ,
        )?;
        wasi_builder.preopened_dir(work_dir.path(), "work", DirPerms::all(), FilePerms::all())?;
        wasi_builder
            .env("PYTHONHOME", ".")
            .env("PYTHONPATH", "./lib:site-packages")
            .env("PYTHONDONTWRITEBYTECODE", "1")
            .env("MPLBACKEND", "Agg")
            .args(&["python", "work/main.py"]);
        let wasi_ctx = wasi_builder.build_p1();

        let mut store: Store<p1::WasiP1Ctx> = Store::new(&self.engine, wasi_ctx);
        let mut linker: Linker<p1::WasiP1Ctx> = Linker::new(&self.engine);
        p1::add_to_linker_sync(&mut linker, |ctx| ctx)?;

        let instance = linker.instantiate(&mut store, &self.module)?;
        let start = instance.get_typed_func::<(), ()>(&mut store, "_start")?;

        tracing::debug!("executing guest script");
        let outcome = start.call(&mut store, ());
        drop(store);

        if let Err(trap) = outcome {
            if !is_clean_exit(&trap) {
                let message = protocol::read_guest_error(work_dir.path())
                    .unwrap_or_else(|| format!("guest execution failed: {trap}"));
                return Err(ExecError::Guest { message });
            }
        }

        for payload in protocol::read_emitted_figures(work_dir.path())? {
            sink.emit(&payload);
        }
        Ok(protocol::read_captured_text(work_dir.path())?)
    }
}

/// `proc_exit(0)` surfaces as an error from `_start`; treat it as success.
fn is_clean_exit(trap: &wasmtime::Error) -> bool {
    trap.downcast_ref::<wasmtime_wasi::I32Exit>()
        .is_some_and(|exit| exit.0 == 0)
}
