use counselor_core::{
    ChatBackend, ChatRequest, ConversationController, CounselorClient, Message, RequestFailure,
    DEFAULT_GREETING, FALLBACK_MESSAGE,
};
use serde_json::json;
use std::net::TcpListener;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn hello_request() -> ChatRequest {
    ChatRequest {
        query: "Hello".to_string(),
        chat_history: vec![Message::ai(DEFAULT_GREETING), Message::user("Hello")],
    }
}

#[tokio::test]
async fn posts_query_and_history_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "query": "Hello",
            "chat_history": [
                { "text": DEFAULT_GREETING, "sender": "ai" },
                { "text": "Hello", "sender": "user" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "Hi there" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = CounselorClient::new(&server.uri());
    let reply = client.complete(&hello_request()).await.unwrap();

    assert_eq!(reply, "Hi there");
}

#[tokio::test]
async fn non_success_status_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "response": "ignored" })))
        .mount(&server)
        .await;

    let client = CounselorClient::new(&server.uri());
    let err = client.complete(&hello_request()).await.unwrap_err();

    match err {
        RequestFailure::Status(status) => assert_eq!(status.as_u16(), 500),
        other => panic!("expected status failure, got {other:?}"),
    }
}

#[tokio::test]
async fn unparseable_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = CounselorClient::new(&server.uri());
    let err = client.complete(&hello_request()).await.unwrap_err();

    assert!(matches!(err, RequestFailure::Malformed(_)), "got {err:?}");
}

#[tokio::test]
async fn missing_response_field_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "reply": "wrong key" })))
        .mount(&server)
        .await;

    let client = CounselorClient::new(&server.uri());
    let err = client.complete(&hello_request()).await.unwrap_err();

    assert!(matches!(err, RequestFailure::Malformed(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_failure() {
    // Grab a free port, then release it so nothing is listening there
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let client = CounselorClient::new(&format!("http://127.0.0.1:{port}"));
    let err = client.complete(&hello_request()).await.unwrap_err();

    assert!(matches!(err, RequestFailure::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_backend_trips_configured_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "response": "too late" }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client =
        CounselorClient::with_timeout(&server.uri(), Duration::from_millis(100)).unwrap();
    let err = client.complete(&hello_request()).await.unwrap_err();

    assert!(matches!(err, RequestFailure::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn conversation_round_trip_against_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "Hi there" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = CounselorClient::new(&server.uri());
    let mut controller = ConversationController::new(DEFAULT_GREETING);
    controller.send(&client, "Hello").await;

    assert_eq!(
        controller.state().messages,
        vec![
            Message::ai(DEFAULT_GREETING),
            Message::user("Hello"),
            Message::ai("Hi there"),
        ]
    );
    assert!(!controller.is_waiting());
}

#[tokio::test]
async fn conversation_survives_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let client = CounselorClient::new(&server.uri());
    let mut controller = ConversationController::new(DEFAULT_GREETING);

    controller.send(&client, "test").await;
    assert_eq!(
        controller.state().messages.last(),
        Some(&Message::ai(FALLBACK_MESSAGE))
    );
    assert!(!controller.is_waiting());

    // The user can resubmit by hand after a failure
    controller.send(&client, "test again").await;
    assert_eq!(controller.state().messages.len(), 5);
    assert!(!controller.is_waiting());
}
