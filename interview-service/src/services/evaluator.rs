//! Scores one submission through the configured text provider.

use crate::models::{Evaluation, Submission};
use crate::services::metrics;
use crate::services::prompt::build_prompt;
use crate::services::providers::{GenerationParams, ProviderError, TextProvider};
use service_core::retry::{retry_async, RetryConfig};
use std::sync::Arc;
use std::time::Instant;

/// Stateless evaluation pipeline: prompt assembly, one provider call, reply mapping.
///
/// Cheap to clone; every call is independent.
#[derive(Clone)]
pub struct SubmissionEvaluator {
    provider: Arc<dyn TextProvider>,
    params: GenerationParams,
    retry: RetryConfig,
}

impl SubmissionEvaluator {
    /// At-most-once evaluator: provider failures are never retried.
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self::with_retry(provider, RetryConfig::no_retry())
    }

    /// Evaluator that retries transient provider failures per `retry`.
    pub fn with_retry(provider: Arc<dyn TextProvider>, retry: RetryConfig) -> Self {
        Self {
            provider,
            params: GenerationParams::structured(Evaluation::response_schema()),
            retry,
        }
    }

    pub fn provider(&self) -> &dyn TextProvider {
        self.provider.as_ref()
    }

    /// Evaluate `submission`. Missing reply fields come back as `""`; any
    /// provider failure is returned unchanged.
    pub async fn evaluate(&self, submission: &Submission) -> Result<Evaluation, ProviderError> {
        let prompt = build_prompt(submission);
        let provider_name = self.provider.name();
        let model = self.provider.model().to_string();

        tracing::debug!(
            provider = provider_name,
            model = %model,
            prompt_len = prompt.len(),
            history_len = submission.history.len(),
            "Requesting evaluation"
        );

        let started = Instant::now();
        let reply = retry_async(&self.retry, "generate_evaluation", || {
            self.provider.generate_json(&prompt, &self.params)
        })
        .await;
        metrics::record_provider_latency(provider_name, &model, started.elapsed().as_secs_f64());

        match reply {
            Ok(reply) => {
                metrics::record_tokens(&model, reply.input_tokens, reply.output_tokens);
                tracing::info!(
                    provider = provider_name,
                    model = %model,
                    input_tokens = reply.input_tokens,
                    output_tokens = reply.output_tokens,
                    "Evaluation generated"
                );
                Ok(Evaluation::from_reply(&reply.object))
            }
            Err(error) => {
                metrics::record_provider_error(provider_name, error.kind());
                tracing::error!(
                    provider = provider_name,
                    model = %model,
                    error = %error,
                    "Evaluation failed"
                );
                Err(error)
            }
        }
    }
}
