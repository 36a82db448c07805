use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chatmem::{CancellationToken, ChatClient, ClientError, ClientOptions, StreamState};

fn client_for(server: &MockServer) -> ChatClient {
    ChatClient::new(ClientOptions::new(format!("{}/api", server.uri()))).expect("client should build")
}

fn sse(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/event-stream")
}

#[tokio::test]
async fn test_streams_deltas_until_done_marker() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat/chatMemory"))
        .and(header("accept", "text/event-stream"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"conversationId": "c-1", "inputMsg": "hi"})))
        .respond_with(sse("data: Hello\n\ndata: world\n\ndata: [DONE]\n\n"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut seen = Vec::new();
    client
        .stream_message_with("c-1", "hi", |delta| seen.push(delta.to_string()))
        .await
        .expect("stream should complete");

    assert_eq!(seen, vec!["Hello", "world"]);
}

#[tokio::test]
async fn test_frames_after_done_marker_are_ignored() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat/chatMemory"))
        .respond_with(sse(
            ": keep-alive\n\nevent: message\ndata: line one\ndata: line two\n\ndata: [DONE]\n\ndata: ignored\n\n",
        ))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut deltas = client.stream_message("c-2", "multi").await.unwrap();

    assert_eq!(deltas.next_delta().await.unwrap().unwrap(), "line one\nline two");
    assert!(deltas.next_delta().await.is_none());
    assert_eq!(deltas.state(), StreamState::Finished);
    assert!(deltas.cancellation_token().is_cancelled());
}

#[tokio::test]
async fn test_missing_done_marker_still_completes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat/chatMemory"))
        .respond_with(sse("data: 你好\n\ndata: 世界\n\n"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut seen = Vec::new();
    let result = client
        .stream_message_with("c-3", "hello", |delta| seen.push(delta.to_string()))
        .await;

    assert!(result.is_ok());
    assert_eq!(seen, vec!["你好", "世界"]);
}

#[tokio::test]
async fn test_server_error_fails_before_any_delta() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat/chatMemory"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let token = CancellationToken::new();
    let mut calls = 0;

    let result = client
        .stream_message_with_token("c-4", "boom", token.clone())
        .await;
    match result {
        Err(ClientError::Status { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "internal server error");
        }
        other => panic!("expected status error, got {:?}", other),
    }
    assert!(token.is_cancelled());

    let result = client
        .stream_message_with("c-4", "boom", |_| calls += 1)
        .await;
    assert!(matches!(result, Err(ClientError::Status { status: 500, .. })));
    assert_eq!(calls, 0);
}

#[tokio::test]
async fn test_no_content_is_missing_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat/chatMemory"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.stream_message("c-5", "anyone?").await;
    assert!(matches!(result, Err(ClientError::MissingBody)));
}

#[tokio::test]
async fn test_cancelled_token_aborts_before_connecting() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat/chatMemory"))
        .respond_with(sse("data: never\n\n"))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let token = CancellationToken::new();
    token.cancel();

    let result = client.stream_message_with_token("c-6", "stop", token).await;
    assert!(matches!(result, Err(ClientError::StreamCancelled)));
}

fn cancel_after(token: &CancellationToken, delay: Duration) {
    let token = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        token.cancel();
    });
}

#[tokio::test]
async fn test_cancel_while_waiting_for_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat/chatMemory"))
        .respond_with(sse("data: too late\n\n").set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let token = CancellationToken::new();
    cancel_after(&token, Duration::from_millis(200));

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        client.stream_message_with_token("c-7", "slow", token.clone()),
    )
    .await
    .expect("cancellation should end the call");

    assert!(matches!(result, Err(ClientError::StreamCancelled)));
    assert!(token.is_cancelled());
}

#[tokio::test]
async fn test_cancel_while_reading_stalled_error_body() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        socket
            .write_all(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 1000\r\n\r\npartial")
            .await
            .unwrap();
        socket.flush().await.unwrap();
        // Hold the connection open without sending the rest of the body.
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(socket);
    });

    let client = ChatClient::new(ClientOptions::new(format!("http://{}/api", addr)))
        .expect("client should build");
    let token = CancellationToken::new();
    cancel_after(&token, Duration::from_millis(200));

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        client.stream_message_with_token("c-8", "stall", token.clone()),
    )
    .await
    .expect("cancellation should end the call");

    assert!(matches!(result, Err(ClientError::StreamCancelled)));
}

#[tokio::test]
async fn test_concurrent_streams_do_not_share_state() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat/chatMemory"))
        .and(body_json(json!({"conversationId": "a", "inputMsg": "x"})))
        .respond_with(sse("data: from a\n\ndata: [DONE]\n\n"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/chat/chatMemory"))
        .and(body_json(json!({"conversationId": "b", "inputMsg": "x"})))
        .respond_with(sse("data: from b\n\ndata: more b\n\ndata: [DONE]\n\n"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut a = Vec::new();
    let mut b = Vec::new();

    let (ra, rb) = tokio::join!(
        client.stream_message_with("a", "x", |d| a.push(d.to_string())),
        client.stream_message_with("b", "x", |d| b.push(d.to_string())),
    );

    assert!(ra.is_ok());
    assert!(rb.is_ok());
    assert_eq!(a, vec!["from a"]);
    assert_eq!(b, vec!["from b", "more b"]);
}
