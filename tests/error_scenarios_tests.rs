//! Error scenario and polling-limit tests for the Picogen client
//!
//! These tests cover HTTP failures, malformed responses, network errors,
//! and the attempt cap of the poll loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use picogen::{
    Picogen, PicogenConfig, PicogenError, PicogenTool, Progress, ProgressStatus, StatusEvent,
};
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(uri: impl Into<String>) -> PicogenConfig {
    PicogenConfig::new(uri, "test_api_key").with_poll_interval(Duration::from_millis(10))
}

fn create_test_client(config: PicogenConfig) -> (Picogen, mpsc::UnboundedReceiver<StatusEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let client = Picogen::with_config(config, Progress::new(Some(Arc::new(tx))))
        .expect("Failed to create test client");
    (client, rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<StatusEvent>) -> Vec<StatusEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn count_status(events: &[StatusEvent], status: ProgressStatus) -> usize {
    events
        .iter()
        .filter(|event| event.data().status == status)
        .count()
}

// Nothing listens on port 1, so connections are refused.
const UNREACHABLE: &str = "http://127.0.0.1:1";

// ============ Submit Failures ============

#[tokio::test]
async fn test_submit_http_error_carries_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/job/generate"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(serde_json::json!({"error": "bad prompt"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, mut rx) = create_test_client(test_config(mock_server.uri()));
    let error = client.generate("").await.unwrap_err();

    match error {
        PicogenError::Http {
            status,
            ref payload,
        } => {
            assert_eq!(status, 400);
            assert_eq!(payload.value()["error"], "bad prompt");
        }
        _ => panic!("Expected Http error, got {:?}", error),
    }

    let events = drain(&mut rx);
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].data().status, ProgressStatus::Error);
    assert_eq!(
        events[1].data().description,
        "Error generating job: {'error': 'bad prompt'}"
    );
    assert!(events[1].data().done);
}

#[tokio::test]
async fn test_submit_malformed_json_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/job/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not valid json {"))
        .mount(&mock_server)
        .await;

    let (client, mut rx) = create_test_client(test_config(mock_server.uri()));
    let error = client.generate("test").await.unwrap_err();

    assert!(matches!(error, PicogenError::Json(_)), "got {:?}", error);
    assert_eq!(count_status(&drain(&mut rx), ProgressStatus::Error), 1);
}

#[tokio::test]
async fn test_submit_empty_array() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/job/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let (client, _rx) = create_test_client(test_config(mock_server.uri()));
    let error = client.generate("test").await.unwrap_err();

    assert!(
        matches!(error, PicogenError::EmptyResponse { ref endpoint } if endpoint == "/job/generate"),
        "got {:?}",
        error
    );
}

#[tokio::test]
async fn test_submit_network_error() {
    let (client, mut rx) = create_test_client(test_config(UNREACHABLE));
    let error = client.generate("test").await.unwrap_err();

    assert!(matches!(error, PicogenError::Network(_)), "got {:?}", error);

    let events = drain(&mut rx);
    assert_eq!(events.len(), 2);
    assert!(events[1]
        .data()
        .description
        .starts_with("Error generating job: Network error:"));
}

// ============ Poll Limits ============

#[tokio::test]
async fn test_poll_exhausts_after_ten_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/job/get/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "id": "abc123",
            "status": "pending",
            "payload": {},
            "result": null,
            "duration_ms": 0,
            "created_at": 1700000000
        }])))
        .expect(10)
        .mount(&mock_server)
        .await;

    let (client, mut rx) = create_test_client(test_config(mock_server.uri()));
    let error = client.poll_job("abc123").await.unwrap_err();

    match error {
        PicogenError::Exhausted {
            ref job_id,
            attempts,
        } => {
            assert_eq!(job_id, "abc123");
            assert_eq!(attempts, 10);
        }
        _ => panic!("Expected Exhausted error, got {:?}", error),
    }
    assert_eq!(error.to_string(), "Failed to get job abc123 after 10 attempts");
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 10);

    let retries = drain(&mut rx)
        .iter()
        .filter(|event| event.data().description == "Retrying get job abc123")
        .count();
    assert_eq!(retries, 9);
}

#[tokio::test]
async fn test_poll_server_error_on_every_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/job/get/abc123"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(serde_json::json!({"error": "boom"})),
        )
        .expect(10)
        .mount(&mock_server)
        .await;

    let (client, mut rx) = create_test_client(test_config(mock_server.uri()));
    let error = client.poll_job("abc123").await.unwrap_err();

    assert!(
        matches!(error, PicogenError::Exhausted { attempts: 10, .. }),
        "got {:?}",
        error
    );

    let events = drain(&mut rx);
    let errors: Vec<&StatusEvent> = events
        .iter()
        .filter(|event| event.data().status == ProgressStatus::Error)
        .collect();
    assert_eq!(errors.len(), 10);
    for event in errors {
        assert_eq!(event.data().description, "Error getting job: {'error': 'boom'}");
    }
}

#[tokio::test]
async fn test_poll_respects_configured_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/job/get/abc123"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let (client, _rx) = create_test_client(
        test_config(mock_server.uri())
            .with_max_attempts(3)
            .with_poll_interval(Duration::from_millis(200)),
    );
    let started = Instant::now();
    let error = client.poll_job("abc123").await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(
        matches!(error, PicogenError::Exhausted { attempts: 3, .. }),
        "got {:?}",
        error
    );
    // Two pauses between three attempts, none after the last
    assert!(
        elapsed >= Duration::from_millis(400) && elapsed < Duration::from_millis(600),
        "elapsed {:?}",
        elapsed
    );
}

// ============ Poll Aborts ============

#[tokio::test]
async fn test_poll_malformed_json_aborts_immediately() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/job/get/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not valid json {"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, mut rx) = create_test_client(test_config(mock_server.uri()));
    let error = client.poll_job("abc123").await.unwrap_err();

    match &error {
        PicogenError::Aborted { job_id, source } => {
            assert_eq!(job_id, "abc123");
            assert!(matches!(**source, PicogenError::Json(_)));
        }
        _ => panic!("Expected Aborted error, got {:?}", error),
    }
    assert!(error.to_string().starts_with("Failed to get job abc123: JSON error:"));

    let events = drain(&mut rx);
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].data().status, ProgressStatus::Error);
}

#[tokio::test]
async fn test_poll_missing_fields_aborts_immediately() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/job/get/abc123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([{"id": "abc123"}])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _rx) = create_test_client(test_config(mock_server.uri()));
    let error = client.poll_job("abc123").await.unwrap_err();

    assert!(matches!(error, PicogenError::Aborted { .. }), "got {:?}", error);
}

#[tokio::test]
async fn test_poll_empty_array_aborts_immediately() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/job/get/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _rx) = create_test_client(test_config(mock_server.uri()));
    let error = client.poll_job("abc123").await.unwrap_err();

    assert_eq!(
        error.to_string(),
        "Failed to get job abc123: Empty response from /job/get/abc123"
    );
}

#[tokio::test]
async fn test_poll_network_error_aborts_immediately() {
    let (client, mut rx) = create_test_client(test_config(UNREACHABLE));
    let error = client.poll_job("abc123").await.unwrap_err();

    match &error {
        PicogenError::Aborted { source, .. } => {
            assert!(matches!(**source, PicogenError::Network(_)));
        }
        _ => panic!("Expected Aborted error, got {:?}", error),
    }

    let events = drain(&mut rx);
    assert_eq!(count_status(&events, ProgressStatus::InProgress), 1);
    assert_eq!(count_status(&events, ProgressStatus::Error), 1);
}

// ============ Tool Error Messages ============

#[tokio::test]
async fn test_generate_image_submit_failure_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/job/generate"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(serde_json::json!({"error": "bad prompt"})),
        )
        .mount(&mock_server)
        .await;

    let tool = PicogenTool::new(test_config(mock_server.uri()));
    let answer = tool.generate_image("", None).await;

    assert_eq!(answer, "Error generating image: {'error': 'bad prompt'}");
}

#[tokio::test]
async fn test_generate_image_plain_text_error_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/job/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let tool = PicogenTool::new(test_config(mock_server.uri()));
    let answer = tool.generate_image("test", None).await;

    assert_eq!(answer, "Error generating image: Internal Server Error");
}

#[tokio::test]
async fn test_generate_image_exhausted_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/job/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": "slow", "cost": 0.5}
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/job/get/slow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "id": "slow",
            "status": "pending",
            "payload": {},
            "result": null,
            "duration_ms": 0,
            "created_at": 1700000000
        }])))
        .expect(3)
        .mount(&mock_server)
        .await;

    let tool = PicogenTool::new(test_config(mock_server.uri()).with_max_attempts(3));
    let answer = tool.generate_image("test", None).await;

    assert_eq!(answer, "Error generating image: Failed to get job slow after 3 attempts");
}

#[tokio::test]
async fn test_generate_image_network_failure_message() {
    let tool = PicogenTool::new(test_config(UNREACHABLE));
    let answer = tool.generate_image("test", None).await;

    assert!(
        answer.starts_with("Error generating image: Network error:"),
        "got {}",
        answer
    );
}
