// Process launcher tests - spawning real child processes
//
// Uses small system binaries as stand-in providers.

use staysearch_core::ServerDescriptor;
use staysearch_core::config::SessionOptions;
use staysearch_core::process::ProcessLauncher;
use staysearch_core::session::{Session, SessionError};
use std::time::Duration;

fn options() -> SessionOptions {
    SessionOptions::default()
        .with_handshake_timeout(Duration::from_secs(2))
        .with_shutdown_timeout(Duration::from_secs(2))
}

#[tokio::test]
async fn missing_command_is_launch_error() {
    let descriptor = ServerDescriptor::new("ghost", "/nonexistent/bin/staysearch-provider");
    let err = Session::open(&ProcessLauncher, &descriptor, options())
        .await
        .expect_err("spawn should fail");

    assert!(matches!(err, SessionError::Launch { .. }));
    assert!(err.is_fatal());
    assert!(err.to_string().contains("ghost"));
}

#[cfg(unix)]
#[tokio::test]
async fn child_process_is_reaped_on_close() {
    let descriptor = ServerDescriptor::new("cat", "cat");
    let session = Session::open(&ProcessLauncher, &descriptor, options())
        .await
        .expect("spawn cat");

    session.close().await;
    assert!(session.is_closed().await);
}

#[cfg(unix)]
#[tokio::test]
async fn provider_that_exits_early_fails_handshake() {
    let descriptor = ServerDescriptor::new("true", "true");
    let session = Session::open(&ProcessLauncher, &descriptor, options())
        .await
        .expect("spawn true");

    let err = session.initialize().await.expect_err("no provider to answer");
    assert!(err.is_fatal());
    session.close().await;
}
