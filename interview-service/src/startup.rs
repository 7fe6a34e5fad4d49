//! Application startup and lifecycle management.
//!
//! Two listeners run side by side: the gRPC server carrying
//! `UserSubmissionService` (plus health and reflection), and a plain HTTP
//! listener answering liveness, readiness and metrics checks.

use crate::config::InterviewConfig;
use crate::grpc::{
    proto::{user_submission_service_server::UserSubmissionServiceServer, FILE_DESCRIPTOR_SET},
    SubmissionGrpcService, SERVICE_NAME,
};
use crate::services::metrics::get_metrics;
use crate::services::providers::gemini::GeminiTextProvider;
use crate::services::providers::TextProvider;
use crate::services::SubmissionEvaluator;
use axum::{
    extract::State, http::StatusCode, middleware, response::IntoResponse, routing::get, Json,
    Router,
};
use serde_json::json;
use service_core::error::AppError;
use service_core::grpc::{
    create_health_service, create_reflection_service, trace_context_interceptor,
    GrpcServerBuilder,
};
use service_core::middleware::request_id_middleware;
use service_core::retry::RetryConfig;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Body of the liveness check.
pub const LIVENESS_BODY: &str = "gRPC server is running.";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: InterviewConfig,
    pub evaluator: SubmissionEvaluator,
}

/// Liveness check. Static; never touches the provider.
async fn health_check() -> &'static str {
    LIVENESS_BODY
}

/// Readiness check. Local check only; no provider call is made.
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let provider = state.evaluator.provider();
    match provider.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "provider": provider.name(),
                "model": provider.model(),
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "provider": provider.name(),
                "error": e.to_string(),
            })),
        ),
    }
}

/// Metrics endpoint for Prometheus scraping.
async fn metrics_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            break;
        }
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    grpc_port: u16,
    http_listener: TcpListener,
    grpc_listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application backed by the Gemini provider.
    pub async fn build(config: InterviewConfig) -> Result<Self, AppError> {
        let provider = GeminiTextProvider::new(config.gemini())
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

        tracing::info!(
            model = %config.models.text_model,
            timeout_secs = config.models.timeout_secs,
            "Initialized Gemini text provider"
        );

        Self::build_with_provider(config, Arc::new(provider)).await
    }

    /// Build the application around an arbitrary provider.
    ///
    /// Port `0` in the config binds an ephemeral port.
    pub async fn build_with_provider(
        config: InterviewConfig,
        provider: Arc<dyn TextProvider>,
    ) -> Result<Self, AppError> {
        let retry = if config.models.max_retries == 0 {
            RetryConfig::no_retry()
        } else {
            RetryConfig::with_max_retries(config.models.max_retries)
        };
        let evaluator = SubmissionEvaluator::with_retry(provider, retry);

        let http_addr = SocketAddr::from(([0, 0, 0, 0], config.server.health_port));
        let http_listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %http_addr, "Failed to bind health listener");
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        let grpc_addr = SocketAddr::from(([0, 0, 0, 0], config.server.grpc_port));
        let grpc_listener = TcpListener::bind(grpc_addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %grpc_addr, "Failed to bind gRPC listener");
            AppError::from(e)
        })?;
        let grpc_port = grpc_listener.local_addr()?.port();

        tracing::info!(http_port, grpc_port, "Interview service listeners bound");

        Ok(Self {
            http_port,
            grpc_port,
            http_listener,
            grpc_listener,
            state: AppState { config, evaluator },
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Get the gRPC port the server is listening on.
    pub fn grpc_port(&self) -> u16 {
        self.grpc_port
    }

    /// Run until either server fails.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Run both servers until `signal` resolves, then drain in-flight calls
    /// and return.
    pub async fn run_with_shutdown<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let http_router = Router::new()
            .route("/", get(health_check))
            .route("/health", get(health_check))
            .route("/ready", get(readiness_check))
            .route("/metrics", get(metrics_handler))
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(request_id_middleware))
            .with_state(self.state.clone());

        let health = create_health_service(SERVICE_NAME).await;
        let reporter = health.reporter.clone();

        let reflection_service =
            create_reflection_service(&[FILE_DESCRIPTOR_SET]).map_err(|e| {
                std::io::Error::other(format!("Failed to build reflection service: {}", e))
            })?;

        let grpc_trace_layer = TraceLayer::new_for_grpc()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::DEBUG));

        // One provider call per attempt, plus headroom for prompt and reply handling.
        let models = &self.state.config.models;
        let call_budget =
            Duration::from_secs(models.timeout_secs * (u64::from(models.max_retries) + 1) + 10);

        let submission_service = UserSubmissionServiceServer::with_interceptor(
            SubmissionGrpcService::new(self.state.evaluator.clone()),
            trace_context_interceptor,
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let signal_task = tokio::spawn({
            let reporter = reporter.clone();
            async move {
                signal.await;
                tracing::info!("Shutting down; no longer accepting calls");
                reporter.set_not_serving().await;
                let _ = shutdown_tx.send(true);
            }
        });

        let incoming = tokio_stream::wrappers::TcpListenerStream::new(self.grpc_listener);
        let grpc_server = GrpcServerBuilder::new(SERVICE_NAME)
            .with_request_timeout(call_budget)
            .build_server()
            .layer(grpc_trace_layer)
            .add_service(health.server)
            .add_service(reflection_service)
            .add_service(submission_service)
            .serve_with_incoming_shutdown(incoming, wait_for_shutdown(shutdown_rx.clone()));

        let http_server = axum::serve(self.http_listener, http_router)
            .with_graceful_shutdown(wait_for_shutdown(shutdown_rx));

        reporter.set_serving().await;
        tracing::info!(
            grpc_port = self.grpc_port,
            http_port = self.http_port,
            "Interview service ready"
        );

        let result = tokio::try_join!(
            async {
                http_server.await.map_err(|e| {
                    tracing::error!(error = %e, "HTTP server error");
                    std::io::Error::other(format!("HTTP server error: {}", e))
                })
            },
            async {
                grpc_server.await.map_err(|e| {
                    tracing::error!(error = %e, "gRPC server error");
                    std::io::Error::other(format!("gRPC server error: {}", e))
                })
            },
        );

        signal_task.abort();
        result.map(|_| ())
    }
}
