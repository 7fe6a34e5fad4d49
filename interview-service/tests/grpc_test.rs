//! gRPC integration tests for interview-service.
//!
//! The application runs on ephemeral ports with a mock provider. The test
//! against the real Gemini API is skipped unless GEMINI_API_KEY holds a real
//! key and SKIP_API_TESTS is unset.
//! Run with: cargo test -p interview-service --test grpc_test

use interview_service::config::{GoogleConfig, InterviewConfig, ModelConfig, ServerConfig};
use interview_service::grpc::proto::{
    user_submission_service_client::UserSubmissionServiceClient, HistoryItem, SubmissionRequest,
};
use interview_service::grpc::SERVICE_NAME;
use interview_service::services::providers::gemini::GEMINI_API_BASE;
use interview_service::services::providers::mock::{MockTextProvider, SAMPLE_EVALUATION_REPLY};
use interview_service::services::providers::{ProviderError, TextProvider};
use interview_service::startup::Application;
use secrecy::Secret;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tonic::transport::Channel;
use tonic::Code;
use tonic_health::pb::health_check_response::ServingStatus;
use tonic_health::pb::{health_client::HealthClient, HealthCheckRequest};

/// Check if API tests should be skipped.
fn skip_api_tests() -> bool {
    std::env::var("SKIP_API_TESTS").is_ok()
        || std::env::var("GEMINI_API_KEY")
            .map(|k| k.trim().is_empty() || k == "test-api-key")
            .unwrap_or(true)
}

fn test_config(api_key: &str) -> InterviewConfig {
    InterviewConfig {
        common: service_core::config::Config {
            log_level: "debug".to_string(),
            otlp_endpoint: None,
        },
        server: ServerConfig {
            grpc_port: 0,
            health_port: 0,
        },
        google: GoogleConfig {
            api_key: Secret::new(api_key.to_string()),
            api_base_url: GEMINI_API_BASE.to_string(),
        },
        models: ModelConfig {
            text_model: "gemini-1.5-flash".to_string(),
            timeout_secs: 60,
            max_retries: 0,
        },
    }
}

async fn run(app: Application) -> u16 {
    let grpc_port = app.grpc_port();

    tokio::spawn(async move {
        let _ = app.run_until_stopped().await;
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(200)).await;

    grpc_port
}

/// Spawn the application around `provider` and return the gRPC port.
async fn spawn_app(provider: Arc<dyn TextProvider>) -> u16 {
    let app = Application::build_with_provider(test_config("test-api-key"), provider)
        .await
        .expect("Failed to build application");
    run(app).await
}

async fn create_channel(port: u16) -> Channel {
    let addr = format!("http://localhost:{}", port);

    // Retry connection a few times
    for _ in 0..5 {
        match Channel::from_shared(addr.clone())
            .expect("valid endpoint")
            .connect()
            .await
        {
            Ok(channel) => return channel,
            Err(_) => {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }

    Channel::from_shared(addr)
        .expect("valid endpoint")
        .connect()
        .await
        .expect("Failed to connect to gRPC server")
}

async fn create_client(port: u16) -> UserSubmissionServiceClient<Channel> {
    UserSubmissionServiceClient::new(create_channel(port).await)
}

fn mutex_request() -> SubmissionRequest {
    SubmissionRequest {
        question: "What is a mutex?".to_string(),
        answer: "A lock.".to_string(),
        domain: "systems".to_string(),
        response_id: "resp-1".to_string(),
        history: vec![HistoryItem {
            number: 1,
            question: "What is a process?".to_string(),
            answer: "A running program.".to_string(),
        }],
    }
}

#[tokio::test]
async fn submission_returns_complete_evaluation() {
    let provider = Arc::new(MockTextProvider::replying(SAMPLE_EVALUATION_REPLY));
    let port = spawn_app(provider.clone()).await;
    let mut client = create_client(port).await;

    let result = client
        .submit_user_submission(mutex_request())
        .await
        .expect("Failed to submit")
        .into_inner();

    assert_eq!(result.question, "What is a mutex?");
    assert_eq!(result.answer, "A lock.");
    for field in [
        &result.clarity,
        &result.tone,
        &result.relevance,
        &result.overall_score,
        &result.suggestion,
        &result.next_question,
        &result.explanation,
    ] {
        assert!(!field.is_empty());
    }
    assert_eq!(result.next_question_difficulty, "MEDIUM");

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Q1: What is a process?\nA1: A running program.\n"));
}

#[tokio::test]
async fn missing_reply_fields_come_back_empty() {
    let provider = Arc::new(MockTextProvider::replying(
        r#"```json
{"clarity": 7, "tone": "8", "nextQuestion": "What is a semaphore?", "explanation": null}
```"#,
    ));
    let port = spawn_app(provider).await;
    let mut client = create_client(port).await;

    let result = client
        .submit_user_submission(mutex_request())
        .await
        .expect("Failed to submit")
        .into_inner();

    assert_eq!(result.clarity, "7");
    assert_eq!(result.tone, "8");
    assert_eq!(result.next_question, "What is a semaphore?");
    assert_eq!(result.explanation, "");
    assert_eq!(result.relevance, "");
    assert_eq!(result.suggestion, "");
    assert_eq!(result.next_question_difficulty, "");
}

#[tokio::test]
async fn provider_failure_returns_internal_with_explanation() {
    let provider = Arc::new(MockTextProvider::failing(ProviderError::NetworkError(
        "connection refused".to_string(),
    )));
    let port = spawn_app(provider.clone()).await;
    let mut client = create_client(port).await;

    let status = client
        .submit_user_submission(mutex_request())
        .await
        .expect_err("call should fail");

    assert_eq!(status.code(), Code::Internal);
    assert!(!status.message().is_empty());
    assert!(status.message().contains("connection refused"));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn listener_survives_a_failed_call() {
    let provider = Arc::new(MockTextProvider::scripted(
        vec![Err(ProviderError::MalformedReply("not JSON".to_string()))],
        Ok(SAMPLE_EVALUATION_REPLY.to_string()),
    ));
    let port = spawn_app(provider).await;
    let mut client = create_client(port).await;

    let first = client.submit_user_submission(mutex_request()).await;
    assert_eq!(first.expect_err("first call fails").code(), Code::Internal);

    let second = client
        .submit_user_submission(mutex_request())
        .await
        .expect("second call succeeds")
        .into_inner();
    assert!(!second.next_question.is_empty());
}

#[tokio::test]
async fn concurrent_submissions_are_independent() {
    let provider = Arc::new(
        MockTextProvider::replying(SAMPLE_EVALUATION_REPLY).with_delay(Duration::from_millis(50)),
    );
    let port = spawn_app(provider.clone()).await;
    let client = create_client(port).await;

    let calls = (0..8).map(|i| {
        let mut client = client.clone();
        async move {
            let mut request = mutex_request();
            request.response_id = format!("resp-{}", i);
            client.submit_user_submission(request).await
        }
    });

    let results = spawn_all(calls).await;
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(provider.call_count(), 8);
}

async fn spawn_all<F, T>(calls: impl Iterator<Item = F>) -> Vec<T>
where
    F: std::future::Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let handles: Vec<_> = calls.map(tokio::spawn).collect();
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.expect("task panicked"));
    }
    results
}

#[tokio::test]
async fn health_service_reports_serving() {
    let provider = Arc::new(MockTextProvider::replying(SAMPLE_EVALUATION_REPLY));
    let port = spawn_app(provider).await;
    let mut health = HealthClient::new(create_channel(port).await);

    let response = health
        .check(HealthCheckRequest {
            service: SERVICE_NAME.to_string(),
        })
        .await
        .expect("health check failed")
        .into_inner();

    assert_eq!(response.status, ServingStatus::Serving as i32);
}

#[tokio::test]
async fn health_flips_to_not_serving_when_shutdown_begins() {
    let provider = Arc::new(
        MockTextProvider::replying(SAMPLE_EVALUATION_REPLY)
            .with_delay(Duration::from_millis(1500)),
    );
    let app = Application::build_with_provider(test_config("test-api-key"), provider)
        .await
        .expect("Failed to build application");
    let port = app.grpc_port();

    let (tx, rx) = oneshot::channel::<()>();
    let server = tokio::spawn(app.run_with_shutdown(async move {
        let _ = rx.await;
    }));
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Watch over its own connection; an open stream outlives the GOAWAY
    let mut health = HealthClient::new(create_channel(port).await);
    let mut updates = health
        .watch(HealthCheckRequest {
            service: SERVICE_NAME.to_string(),
        })
        .await
        .expect("watch failed")
        .into_inner();
    let initial = updates
        .message()
        .await
        .expect("watch stream error")
        .expect("watch stream ended");
    assert_eq!(initial.status, ServingStatus::Serving as i32);

    let mut client = create_client(port).await;
    let in_flight =
        tokio::spawn(async move { client.submit_user_submission(mutex_request()).await });
    tokio::time::sleep(Duration::from_millis(200)).await;

    tx.send(()).expect("server still running");

    let update = tokio::time::timeout(Duration::from_secs(1), updates.message())
        .await
        .expect("no health update after shutdown signal")
        .expect("watch stream error")
        .expect("watch stream ended");
    assert_eq!(update.status, ServingStatus::NotServing as i32);
    assert!(!in_flight.is_finished());

    drop(updates);
    drop(health);

    // The in-flight call drains before the server exits
    let result = in_flight.await.expect("call task panicked");
    assert!(result.is_ok());

    let stopped = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop")
        .expect("server task panicked");
    assert!(stopped.is_ok());
}

#[tokio::test]
async fn missing_api_key_fails_without_network_call() {
    let app = Application::build(test_config(""))
        .await
        .expect("Failed to build application");
    let port = run(app).await;
    let mut client = create_client(port).await;

    let status = client
        .submit_user_submission(mutex_request())
        .await
        .expect_err("call should fail");

    assert_eq!(status.code(), Code::Internal);
    assert!(status.message().starts_with("Gemini API error: "));
}

#[tokio::test]
async fn gemini_scores_a_real_submission() {
    if skip_api_tests() {
        eprintln!("Skipping test: SKIP_API_TESTS is set or GEMINI_API_KEY is not valid");
        return;
    }

    let api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
    let app = Application::build(test_config(&api_key))
        .await
        .expect("Failed to build application");
    let port = run(app).await;
    let mut client = create_client(port).await;

    let result = client
        .submit_user_submission(mutex_request())
        .await
        .expect("Gemini call failed")
        .into_inner();

    assert!(!result.overall_score.is_empty());
    assert!(!result.next_question.is_empty());
}
