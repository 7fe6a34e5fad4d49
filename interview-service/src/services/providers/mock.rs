//! Mock provider implementation for testing.

use super::{FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// A complete, well-formed evaluation reply.
pub const SAMPLE_EVALUATION_REPLY: &str = r#"{
  "question": "What is a mutex?",
  "answer": "A lock.",
  "clarity": "6",
  "tone": "8",
  "relevance": "7",
  "overallScore": "7",
  "suggestion": "Explain what the lock protects and who may release it.",
  "nextQuestion": "How can two threads deadlock on mutexes?",
  "nextQuestionDifficulty": "MEDIUM",
  "explanation": "Deadlock follows naturally from lock ownership."
}"#;

pub type Outcome = Result<String, ProviderError>;

/// Mock text provider with scripted outcomes.
///
/// Outcomes are consumed in order; once the script is exhausted the fallback
/// outcome is returned for every further call. Every prompt received is
/// recorded for inspection.
pub struct MockTextProvider {
    script: Mutex<VecDeque<Outcome>>,
    fallback: Outcome,
    prompts: Mutex<Vec<String>>,
    delay: Duration,
}

impl MockTextProvider {
    /// Always reply with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::scripted(Vec::new(), Ok(text.into()))
    }

    /// Always fail with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self::scripted(Vec::new(), Err(error))
    }

    /// Play `script` in order, then `fallback` forever.
    pub fn scripted(script: Vec<Outcome>, fallback: Outcome) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            prompts: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    /// Simulate provider latency.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn next_outcome(&self) -> Outcome {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    fn name(&self) -> &'static str {
        "Mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(prompt.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let text = self.next_outcome()?;

        Ok(ProviderResponse {
            input_tokens: prompt.len() as i32 / 4,
            output_tokens: text.len() as i32 / 4,
            text: Some(text),
            finish_reason: FinishReason::Complete,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
