//! service-core: Shared infrastructure for the interview evaluation services.
pub mod config;
pub mod error;
pub mod grpc;
pub mod middleware;
pub mod observability;
pub mod retry;

pub use axum;
pub use tokio;
pub use tonic;
pub use tracing;
