//! Integration tests for the reqwest transport using WireMock.
//!
//! These exercise the full request/response cycle: request serialization,
//! authentication headers, streamed body decoding and status
//! classification.

use std::time::Duration;

use polishr_client::errors::CREDENTIAL_MESSAGE;
use polishr_client::{PolishError, PolishMode, PolishrClient, SessionStatus};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn frame(content: &str) -> String {
    format!(
        "data: {}\n\n",
        json!({
            "id": "chatcmpl-it",
            "object": "chat.completion.chunk",
            "model": "test-model",
            "choices": [{"index": 0, "delta": {"content": content}, "finish_reason": null}]
        })
    )
}

fn sse_body(deltas: &[&str]) -> String {
    let mut body: String = deltas.iter().map(|d| frame(d)).collect();
    body.push_str("data: [DONE]\n\n");
    body
}

fn client(server: &MockServer) -> PolishrClient {
    PolishrClient::builder()
        .api_key("sk-test-key")
        .endpoint(server.uri())
        .model("test-model")
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_stream_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-test-key"))
        .and(header("Accept", "text/event-stream"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "stream": true,
            "temperature": 0.3
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(&["Hello", ", ", "world"]), "text/event-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let text = client(&server)
        .polish("hello world", PolishMode::Improve)
        .await
        .unwrap();

    assert_eq!(text, "Hello, world");
}

#[tokio::test]
async fn test_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .polish("hello", PolishMode::Improve)
        .await
        .unwrap_err();

    assert!(matches!(err, PolishError::Credential));
    assert_eq!(err.user_message(), CREDENTIAL_MESSAGE);
}

#[tokio::test]
async fn test_rate_limited_with_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "30")
                .set_body_string("slow down"),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .polish("hello", PolishMode::Improve)
        .await
        .unwrap_err();

    match err {
        PolishError::RateLimit { retry_after } => {
            assert_eq!(retry_after, Some(Duration::from_secs(30)));
        }
        other => panic!("Expected RateLimit error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_model_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let err = client(&server)
        .polish("hello", PolishMode::Rephrase)
        .await
        .unwrap_err();

    assert_eq!(
        err.user_message(),
        "Model \"test-model\" not found. Check your settings."
    );
}

#[tokio::test]
async fn test_server_error_with_empty_body_uses_reason_phrase() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server)
        .polish("hello", PolishMode::Improve)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(500));
    assert_eq!(err.user_message(), "API error (500): Internal Server Error");
}

#[tokio::test]
async fn test_server_error_carries_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = client(&server)
        .polish("hello", PolishMode::Improve)
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "API error (503): overloaded");
}

#[tokio::test]
async fn test_request_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(&["late"]), "text/event-stream")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = PolishrClient::builder()
        .api_key("sk-test-key")
        .endpoint(server.uri())
        .model("test-model")
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let err = client.polish("hello", PolishMode::Improve).await.unwrap_err();

    assert!(matches!(err, PolishError::Timeout { .. }), "got {:?}", err);
}

/// Serves one chunked event stream, pausing `gap` before each frame.
async fn spawn_slow_stream(deltas: Vec<&'static str>, gap: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if request.len() >= head_end + 4 + content_length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }

        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ntransfer-encoding: chunked\r\n\r\n",
            )
            .await
            .unwrap();

        let frames = deltas
            .into_iter()
            .map(frame)
            .chain(std::iter::once("data: [DONE]\n\n".to_string()));
        for data in frames {
            tokio::time::sleep(gap).await;
            let chunk = format!("{:x}\r\n{}\r\n", data.len(), data);
            socket.write_all(chunk.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
        }
        socket.write_all(b"0\r\n\r\n").await.unwrap();
        socket.flush().await.unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_timeout_does_not_cut_off_a_live_stream() {
    let endpoint =
        spawn_slow_stream(vec!["w0 ", "w1 ", "w2 ", "w3 ", "w4"], Duration::from_millis(150)).await;

    let client = PolishrClient::builder()
        .api_key("sk-test-key")
        .endpoint(endpoint)
        .model("test-model")
        .timeout(Duration::from_millis(400))
        .build()
        .unwrap();

    let session = client.session();
    session.start(client.request("hello", PolishMode::Improve));

    let done = session.wait_until_settled().await;

    assert_eq!(done.status(), SessionStatus::Completed, "error: {:?}", done.error());
    assert_eq!(done.raw_text(), "w0 w1 w2 w3 w4");
}

#[tokio::test]
async fn test_session_completes_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse_body(&["Fixed subject-verb", " agreement\n\n", "The cat sits", "."]),
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let client = client(&server);
    let session = client.session();
    session.start(client.request("The cat sit.", PolishMode::Improve));

    let done = session.wait_until_settled().await;

    assert_eq!(done.status(), SessionStatus::Completed);
    assert_eq!(done.explanation(), "Fixed subject-verb agreement");
    assert_eq!(done.final_text(), "The cat sits.");
    assert!(done.has_changes());
}

#[tokio::test]
async fn test_session_fails_on_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client(&server);
    let session = client.session();
    session.start(client.request("hello", PolishMode::Improve));

    let done = session.wait_until_settled().await;

    assert_eq!(done.status(), SessionStatus::Failed);
    assert_eq!(done.error(), Some(CREDENTIAL_MESSAGE));
    assert_eq!(client.metrics().get_metrics().errors.get("credential"), Some(&1));
}
