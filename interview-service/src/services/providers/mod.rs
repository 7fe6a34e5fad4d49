//! Text-generation provider abstraction and implementations.
//!
//! The rest of the service only sees [`TextProvider`]: a prompt goes in, a
//! JSON object (or a [`ProviderError`]) comes out. Gemini is the production
//! backend; the mock backs tests.

pub mod gemini;
pub mod json_reply;
pub mod mock;

use async_trait::async_trait;
use serde_json::{Map, Value};
use service_core::retry::Transient;
use thiserror::Error;

pub use json_reply::parse_json_object;

/// Error type for provider operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Empty response")]
    EmptyResponse,

    #[error("Malformed reply: {0}")]
    MalformedReply(String),
}

impl ProviderError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::Unauthorized(_) => "unauthorized",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::ApiError { .. } => "api_error",
            ProviderError::NetworkError(_) => "network",
            ProviderError::Timeout => "timeout",
            ProviderError::ContentFiltered => "content_filtered",
            ProviderError::EmptyResponse => "empty_response",
            ProviderError::MalformedReply(_) => "malformed_reply",
        }
    }
}

impl Transient for ProviderError {
    fn is_transient(&self) -> bool {
        match self {
            ProviderError::RateLimited | ProviderError::NetworkError(_) | ProviderError::Timeout => {
                true
            }
            ProviderError::ApiError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    ContentFilter,
}

/// Raw result of one generation call.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Generated text, if the model produced any.
    pub text: Option<String>,

    /// Input tokens consumed.
    pub input_tokens: i32,

    /// Output tokens generated.
    pub output_tokens: i32,

    /// Finish reason.
    pub finish_reason: FinishReason,
}

/// A reply parsed into a single JSON object.
#[derive(Debug, Clone)]
pub struct JsonReply {
    pub object: Map<String, Value>,
    pub input_tokens: i32,
    pub output_tokens: i32,
}

/// Generation parameters for AI requests.
#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    /// Temperature (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Maximum output tokens.
    pub max_tokens: Option<i32>,

    /// Schema the reply must conform to; also switches the reply to JSON.
    pub output_schema: Option<Value>,
}

impl GenerationParams {
    /// Deterministic sampling constrained to `schema`.
    pub fn structured(schema: Value) -> Self {
        Self {
            temperature: Some(0.0),
            max_tokens: None,
            output_schema: Some(schema),
        }
    }
}

/// Trait for text/JSON generation providers (e.g., Gemini).
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Provider name used in logs, metrics and error messages.
    fn name(&self) -> &'static str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Generate a text response in one round trip.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Generate a response and parse it as exactly one JSON object.
    async fn generate_json(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<JsonReply, ProviderError> {
        let response = self.generate(prompt, params).await?;
        let text = response.text.ok_or(ProviderError::EmptyResponse)?;
        let object = parse_json_object(&text)?;

        Ok(JsonReply {
            object,
            input_tokens: response.input_tokens,
            output_tokens: response.output_tokens,
        })
    }

    /// Readiness check; must not spend generation quota.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
