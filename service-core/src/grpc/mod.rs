//! gRPC utilities shared by the services.
//!
//! This module provides shared gRPC infrastructure including:
//! - Error conversion from `AppError` to `tonic::Status`
//! - Interceptors for request-id propagation
//! - Health check service implementation
//! - Server builder utilities

pub mod error;
pub mod health;
pub mod interceptors;
pub mod server;

pub use error::{GrpcResult, IntoStatus};
pub use health::{HealthComponents, HealthReporter, HealthStatus, create_health_service};
pub use interceptors::{
    REQUEST_ID_KEY, extract_request_id, inject_request_id, trace_context_interceptor,
};
pub use server::{GrpcServerBuilder, create_reflection_service};

// Re-export commonly used tonic types
pub use tonic::{Code, Request, Response, Status};
