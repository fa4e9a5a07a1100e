// Session lifecycle tests - open, initialize and close against an in-memory provider
//
// Covers channel release, phase ordering and handshake failures.

#[path = "../support/mod.rs"]
mod support;

use serde_json::json;
use staysearch_core::config::SessionOptions;
use staysearch_core::session::{InvocationRequest, Session, SessionError, with_session};
use std::time::Duration;
use support::{DuplexLauncher, FailingLauncher, Reply, airbnb_provider, descriptor, search_payload};

fn options() -> SessionOptions {
    SessionOptions::default()
        .with_handshake_timeout(Duration::from_secs(5))
        .with_request_timeout(Duration::from_secs(5))
        .with_shutdown_timeout(Duration::from_secs(1))
}

#[tokio::test]
async fn open_then_close_releases_channel() {
    let launcher = airbnb_provider(search_payload(vec![]));
    let session = Session::open(&launcher, &descriptor(), options())
        .await
        .expect("open");
    assert_eq!(session.server(), "airbnb");

    session.close().await;

    assert!(session.is_closed().await);
    assert!(launcher.state.is_released());
    assert!(launcher.state.provider_stopped().await);
}

#[tokio::test]
async fn initialize_reports_provider_info_and_sends_initialized() {
    let launcher = airbnb_provider(search_payload(vec![]));
    let session = Session::open(&launcher, &descriptor(), options())
        .await
        .expect("open");

    let info = session.initialize().await.expect("initialize");
    assert_eq!(info.name, "airbnb");
    assert_eq!(info.protocol_version, "2025-06-18");
    assert_eq!(session.server_info().await, Some(info));
    session.close().await;

    assert!(launcher.state.provider_stopped().await);
    let methods = launcher.state.methods();
    assert_eq!(methods[0], "initialize");
    assert_eq!(methods[1], "notifications/initialized");
    let params = &launcher.state.params_of("initialize")[0];
    assert_eq!(params["protocolVersion"], "2025-06-18");
    assert!(params["clientInfo"]["name"].is_string());
}

#[tokio::test]
async fn invoke_before_initialize_is_protocol_error() {
    let launcher = airbnb_provider(search_payload(vec![]));
    let session = Session::open(&launcher, &descriptor(), options())
        .await
        .expect("open");

    let request = InvocationRequest::new("airbnb_search", serde_json::Map::new());
    let result = session.invoke(&request).await;
    assert!(matches!(result, Err(SessionError::Protocol { .. })));

    let discovered = session.discover().await;
    assert!(matches!(discovered, Err(SessionError::Protocol { .. })));

    session.close().await;
    assert!(!launcher.state.methods().contains(&"tools/call".to_string()));
}

#[tokio::test]
async fn second_initialize_is_rejected() {
    let launcher = airbnb_provider(search_payload(vec![]));
    let session = Session::open(&launcher, &descriptor(), options())
        .await
        .expect("open");

    session.initialize().await.expect("first initialize");
    let again = session.initialize().await;
    assert!(matches!(again, Err(SessionError::Protocol { .. })));
    session.close().await;
}

#[tokio::test]
async fn close_twice_is_noop() {
    let launcher = airbnb_provider(search_payload(vec![]));
    let session = Session::open(&launcher, &descriptor(), options())
        .await
        .expect("open");
    session.initialize().await.expect("initialize");

    session.close().await;
    session.close().await;

    assert!(session.is_closed().await);
    assert_eq!(
        launcher.state.launches.load(std::sync::atomic::Ordering::SeqCst),
        1
    );
}

#[tokio::test]
async fn operations_after_close_fail_with_connection_error() {
    let launcher = airbnb_provider(search_payload(vec![]));
    let session = Session::open(&launcher, &descriptor(), options())
        .await
        .expect("open");
    session.initialize().await.expect("initialize");
    session.close().await;

    let result = session.discover().await;
    assert!(matches!(result, Err(SessionError::Connection { .. })));
}

#[tokio::test]
async fn rejected_handshake_is_protocol_error_and_terminal() {
    let launcher = DuplexLauncher::new(|method, _| match method {
        "initialize" => Reply::Error(-32602, "Unsupported protocol version".into()),
        _ => Reply::Result(json!({})),
    });
    let session = Session::open(&launcher, &descriptor(), options())
        .await
        .expect("open");

    let err = session.initialize().await.expect_err("handshake should fail");
    assert!(matches!(err, SessionError::Protocol { .. }));
    assert!(err.is_fatal());
    assert!(err.to_string().contains("Unsupported protocol version"));

    let retry = session.initialize().await;
    assert!(matches!(retry, Err(SessionError::Protocol { .. })));
    session.close().await;
}

#[tokio::test]
async fn handshake_without_protocol_version_is_rejected() {
    let launcher = DuplexLauncher::new(|method, _| match method {
        "initialize" => Reply::Result(json!({
            "protocolVersion": "",
            "serverInfo": {"name": "broken", "version": "0"}
        })),
        _ => Reply::Result(json!({})),
    });
    let session = Session::open(&launcher, &descriptor(), options())
        .await
        .expect("open");

    let result = session.initialize().await;
    assert!(matches!(result, Err(SessionError::Protocol { .. })));
    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn silent_handshake_times_out_as_protocol_error() {
    let launcher = DuplexLauncher::new(|_, _| Reply::Silent);
    let session = Session::open(
        &launcher,
        &descriptor(),
        options().with_handshake_timeout(Duration::from_secs(2)),
    )
    .await
    .expect("open");

    let err = session.initialize().await.expect_err("should time out");
    assert!(matches!(err, SessionError::Protocol { .. }));
    assert!(err.to_string().contains("no handshake response"));
    session.close().await;
}

#[tokio::test]
async fn non_utf8_output_lines_are_skipped() {
    let launcher = DuplexLauncher::new(|method, _| match method {
        "initialize" => Reply::Noisy(
            b"npm notice \xff\xfe progress\n".to_vec(),
            support::initialize_result(),
        ),
        _ => Reply::Silent,
    });
    let session = Session::open(&launcher, &descriptor(), options())
        .await
        .expect("open");

    let info = session.initialize().await.expect("noise must not end the session");
    assert_eq!(info.name, "airbnb");
    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn close_returns_when_release_hangs() {
    let launcher = airbnb_provider(search_payload(vec![])).hanging_on_release();
    let session = Session::open(
        &launcher,
        &descriptor(),
        options().with_shutdown_timeout(Duration::from_secs(2)),
    )
    .await
    .expect("open");
    session.initialize().await.expect("initialize");

    let closed = tokio::time::timeout(Duration::from_secs(10), session.close()).await;

    assert!(closed.is_ok(), "close must give up after the shutdown timeout");
    assert!(session.is_closed().await);
    assert!(!launcher.state.is_released());
    assert!(launcher.state.provider_stopped().await);
}

#[tokio::test]
async fn launch_failure_is_fatal_launch_error() {
    let result = Session::open(&FailingLauncher, &descriptor(), options()).await;
    let err = result.expect_err("launch should fail");
    assert!(matches!(err, SessionError::Launch { .. }));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn with_session_closes_on_error_path() {
    let launcher = airbnb_provider(search_payload(vec![]));

    let outcome = with_session::<_, (), SessionError, _>(
        &launcher,
        &descriptor(),
        options(),
        |session| {
            Box::pin(async move {
                session.initialize().await?;
                Err(SessionError::protocol("airbnb", "body failed"))
            })
        },
    )
    .await;

    assert!(matches!(outcome, Err(SessionError::Protocol { .. })));
    assert!(launcher.state.is_released());
    assert!(launcher.state.provider_stopped().await);
}

#[tokio::test]
async fn with_session_closes_on_success_path() {
    let launcher = airbnb_provider(search_payload(vec![]));

    let count = with_session::<_, usize, SessionError, _>(
        &launcher,
        &descriptor(),
        options(),
        |session| {
            Box::pin(async move {
                session.initialize().await?;
                Ok(session.discover().await?.len())
            })
        },
    )
    .await
    .expect("session body");

    assert_eq!(count, 2);
    assert!(launcher.state.is_released());
}
