pub mod evaluator;
pub mod metrics;
pub mod prompt;
pub mod providers;

pub use evaluator::SubmissionEvaluator;
pub use providers::{ProviderError, TextProvider};
