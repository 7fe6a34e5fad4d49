//! `grpc.health.v1` support built on `tonic-health`.
//!
//! Services start as `NOT_SERVING` and flip to `SERVING` once their listeners
//! are bound, then back to `NOT_SERVING` when shutdown begins so load
//! balancers drain them before the process exits.

use std::sync::Arc;
use tokio::sync::Mutex;
use tonic_health::ServingStatus;
use tonic_health::pb::health_server::{Health, HealthServer};
use tonic_health::server::HealthReporter as TonicHealthReporter;

/// Health status for a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Serving,
    NotServing,
}

impl From<HealthStatus> for ServingStatus {
    fn from(status: HealthStatus) -> Self {
        match status {
            HealthStatus::Serving => ServingStatus::Serving,
            HealthStatus::NotServing => ServingStatus::NotServing,
        }
    }
}

/// Cloneable handle that updates the status of one named gRPC service.
#[derive(Clone)]
pub struct HealthReporter {
    inner: Arc<Mutex<TonicHealthReporter>>,
    service_name: String,
}

impl HealthReporter {
    fn new(reporter: TonicHealthReporter, service_name: String) -> Self {
        Self {
            inner: Arc::new(Mutex::new(reporter)),
            service_name,
        }
    }

    /// Name reported in `HealthCheckRequest.service`.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub async fn set_status(&self, status: HealthStatus) {
        tracing::debug!(service = %self.service_name, ?status, "Updating gRPC health status");
        self.inner
            .lock()
            .await
            .set_service_status(&self.service_name, status.into())
            .await;
    }

    pub async fn set_serving(&self) {
        self.set_status(HealthStatus::Serving).await;
    }

    pub async fn set_not_serving(&self) {
        self.set_status(HealthStatus::NotServing).await;
    }
}

/// Health server plus the reporter that drives it.
pub struct HealthComponents<S> {
    pub server: HealthServer<S>,
    pub reporter: HealthReporter,
}

/// Create a health service for `service_name`, initially `NOT_SERVING`.
///
/// `service_name` should be the fully qualified gRPC service name, e.g.
/// `interview.v1.UserSubmissionService`.
pub async fn create_health_service(
    service_name: impl Into<String>,
) -> HealthComponents<impl Health> {
    let service_name = service_name.into();
    let (mut reporter, server) = tonic_health::server::health_reporter();

    reporter
        .set_service_status(&service_name, ServingStatus::NotServing)
        .await;

    HealthComponents {
        server,
        reporter: HealthReporter::new(reporter, service_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_conversion() {
        assert_eq!(
            ServingStatus::from(HealthStatus::Serving),
            ServingStatus::Serving
        );
        assert_eq!(
            ServingStatus::from(HealthStatus::NotServing),
            ServingStatus::NotServing
        );
    }

    #[tokio::test]
    async fn test_reporter_is_bound_to_service_name() {
        let health = create_health_service("test.v1.Echo").await;
        assert_eq!(health.reporter.service_name(), "test.v1.Echo");

        let reporter = health.reporter.clone();
        reporter.set_serving().await;
        reporter.set_not_serving().await;
        assert_eq!(reporter.service_name(), health.reporter.service_name());
    }
}
