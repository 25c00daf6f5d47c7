//! Session behavior when runtime bootstrap fails.
//!
//! Points the downloader at an unreachable host so every bootstrap attempt
//! fails at the fetch step, then checks that the failure is latched and that
//! no guest execution can happen afterwards.

use plotpad::{BootstrapError, RunRejected, RuntimeConfig, RuntimeState, Session};
use tempfile::TempDir;

fn unreachable_config(cache: &TempDir) -> RuntimeConfig {
    RuntimeConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        cache_dir: Some(cache.path().to_path_buf()),
        ..RuntimeConfig::default()
    }
}

#[tokio::test]
async fn failed_bootstrap_latches_and_blocks_runs() {
    let cache = TempDir::new().unwrap();
    let session = Session::with_config(unreachable_config(&cache));

    let err = session.initialize().await.unwrap_err();
    assert!(matches!(err, BootstrapError::Download(_)));
    assert!(session.state().is_failed());

    assert_eq!(
        session.run_once("print(1)").await,
        Err(RunRejected::NotReady)
    );
    assert!(session.current_result().is_none());
}

#[tokio::test]
async fn failed_bootstrap_is_not_retried() {
    let cache = TempDir::new().unwrap();
    let session = Session::with_config(unreachable_config(&cache));

    session.initialize().await.unwrap_err();
    let second = session.initialize().await.unwrap_err();
    assert!(matches!(second, BootstrapError::Unavailable(_)));
}

#[tokio::test]
async fn progress_subscribers_observe_the_failure() {
    let cache = TempDir::new().unwrap();
    let session = Session::with_config(unreachable_config(&cache));
    let state_rx = session.subscribe();

    session.initialize().await.unwrap_err();
    let state = state_rx.borrow().clone();
    assert!(state.is_failed());
    assert!(state.to_string().contains("initialization failed"));
}

#[tokio::test]
async fn close_before_bootstrap_leaves_state_untouched() {
    let cache = TempDir::new().unwrap();
    let session = Session::with_config(unreachable_config(&cache));
    session.close();

    let err = session.initialize().await.unwrap_err();
    assert!(matches!(err, BootstrapError::Cancelled));
    assert_eq!(session.state(), RuntimeState::Uninitialized);
}
