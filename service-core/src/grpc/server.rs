//! gRPC server builder utilities.
//!
//! Provides a builder for configuring tonic servers with the transport
//! settings every service shares, and a helper for the reflection service.

use std::time::Duration;

use tonic::transport::Server;
use tonic_reflection::server::Builder as ReflectionBuilder;

/// Builder for configuring a gRPC server with standard transport settings.
#[derive(Debug, Clone)]
pub struct GrpcServerBuilder {
    service_name: String,
    http2_keepalive_interval: Option<Duration>,
    http2_keepalive_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
}

impl GrpcServerBuilder {
    /// Create a new server builder for the given service name.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            http2_keepalive_interval: Some(Duration::from_secs(30)),
            http2_keepalive_timeout: Some(Duration::from_secs(10)),
            request_timeout: None,
        }
    }

    /// Upper bound on how long a single call may run before the server
    /// answers `DEADLINE_EXCEEDED`.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Get the service name.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Build a tonic Server with the configured settings.
    pub fn build_server(&self) -> Server {
        let mut server = Server::builder();

        if let Some(interval) = self.http2_keepalive_interval {
            server = server.http2_keepalive_interval(Some(interval));
        }

        if let Some(timeout) = self.http2_keepalive_timeout {
            server = server.http2_keepalive_timeout(Some(timeout));
        }

        if let Some(timeout) = self.request_timeout {
            server = server.timeout(timeout);
        }

        tracing::debug!(
            service = %self.service_name,
            request_timeout_ms = self.request_timeout.map(|t| t.as_millis() as u64),
            "Configured gRPC server"
        );

        server
    }
}

/// Create a reflection service from encoded file descriptor sets.
///
/// # Example
///
/// ```ignore
/// let reflection_service = create_reflection_service(&[proto::FILE_DESCRIPTOR_SET])?;
/// ```
pub fn create_reflection_service(
    file_descriptor_sets: &[&[u8]],
) -> Result<
    tonic_reflection::server::ServerReflectionServer<
        impl tonic_reflection::server::ServerReflection,
    >,
    tonic_reflection::server::Error,
> {
    let mut builder = ReflectionBuilder::configure();

    for fds in file_descriptor_sets {
        builder = builder.register_encoded_file_descriptor_set(fds);
    }

    builder.build_v1()
}
