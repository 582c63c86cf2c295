//! End-to-end coverage of the session engine over a linked in-memory
//! transport pair, mirroring spec.md §8's scenario style (E1/E3/E6) and
//! testable properties 2–6 and 8.

use std::time::Duration;

use mcp_core::{methods, ErrorKind};
use mcp_session::{request_handler, Session, SessionState};
use mcp_transport::duplex_pair;
use serde_json::json;

async fn connected_pair() -> (Session, Session) {
    let (transport_a, transport_b) = duplex_pair();
    let client = Session::new();
    let server = Session::new();

    server.register_request_handler(
        methods::INITIALIZE,
        request_handler(|_params, _ctx| async {
            Ok(json!({
                "protocolVersion": "2025-06-18",
                "serverInfo": {"name": "test-server", "version": "0.1.0"},
                "capabilities": {},
            }))
        }),
    );

    client.start(transport_a).await.unwrap();
    server.start(transport_b).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    client
        .send_request(
            methods::INITIALIZE,
            Some(json!({
                "protocolVersion": "2025-06-18",
                "clientInfo": {"name": "test-client", "version": "0.1.0"},
                "capabilities": {},
            })),
        )
        .await
        .unwrap();
    client.complete_initialization().unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    (client, server)
}

#[tokio::test]
async fn ping_round_trip() {
    let (client, server) = connected_pair().await;
    server.register_request_handler(
        methods::PING,
        request_handler(|_params, _ctx| async { Ok(json!({})) }),
    );

    let result = client.send_request(methods::PING, None).await.unwrap();
    assert_eq!(result, json!({}));

    client.stop().await.unwrap();
    server.stop().await.unwrap();
}

#[tokio::test]
async fn unregistered_method_returns_method_not_found() {
    let (client, server) = connected_pair().await;
    let _ = server; // server never registers a handler for this method.

    let err = client.send_request("tools/does-not-exist", None).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::MethodNotFound);
}

#[tokio::test]
async fn unregistered_notification_produces_no_outbound_bytes() {
    let (client, server) = connected_pair().await;
    let _ = server;
    // No handler registered anywhere for this; this must not panic, error,
    // or generate a reply the client would otherwise stall waiting on.
    client.send_notification("notifications/nothing_here", None).unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(client.state(), SessionState::Ready);
}

#[tokio::test]
async fn concurrent_requests_each_get_their_own_response() {
    let (client, server) = connected_pair().await;
    server.register_request_handler(
        "echo",
        request_handler(|params, _ctx| async move { Ok(params.unwrap_or(json!(null))) }),
    );

    let a = client.send_request("echo", Some(json!({"n": 1})));
    let b = client.send_request("echo", Some(json!({"n": 2})));
    let c = client.send_request("echo", Some(json!({"n": 3})));
    let (ra, rb, rc) = tokio::join!(a, b, c);

    assert_eq!(ra.unwrap(), json!({"n": 1}));
    assert_eq!(rb.unwrap(), json!({"n": 2}));
    assert_eq!(rc.unwrap(), json!({"n": 3}));
}

#[tokio::test]
async fn stop_fails_every_pending_request_with_connection_closed() {
    let (client, server) = connected_pair().await;
    // A handler that never responds, so the request is still pending when
    // we stop the client session out from under it.
    server.register_request_handler(
        "never_replies",
        request_handler(|_params, _ctx| async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(json!({}))
        }),
    );

    let pending = tokio::spawn({
        let client = client.clone();
        async move { client.send_request("never_replies", None).await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    client.stop().await.unwrap();
    let result = pending.await.unwrap();
    let err = result.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ConnectionClosed);
    assert_eq!(client.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn dropping_the_request_future_cancels_the_peers_handler() {
    // `tokio::time::timeout` drops the inner future when it expires, which
    // is the caller-cancellation path (spec.md §4.5.6 path 1): the client
    // sends `notifications/cancelled`, and the server's still-running
    // handler observes it at its next suspension point (path 2).
    let (client, server) = connected_pair().await;
    let cancelled = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));

    {
        let cancelled = cancelled.clone();
        server.register_request_handler(
            "slow",
            request_handler(move |_params, ctx| {
                let cancelled = cancelled.clone();
                async move {
                    ctx.cancellation.cancelled().await;
                    cancelled.store(true, std::sync::atomic::Ordering::SeqCst);
                    Err(mcp_core::McpError::internal("cancelled"))
                }
            }),
        );
    }

    let outcome = tokio::time::timeout(Duration::from_millis(20), client.send_request("slow", None)).await;
    assert!(outcome.is_err(), "expected the timeout to fire first");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(cancelled.load(std::sync::atomic::Ordering::SeqCst));
}
