use crate::grpc::proto::{
    user_submission_service_server::UserSubmissionService, EvaluationResult, HistoryItem,
    SubmissionRequest,
};
use crate::models::{Evaluation, HistoryTurn, Submission};
use crate::services::metrics::GrpcCallGuard;
use crate::services::SubmissionEvaluator;
use service_core::error::AppError;
use service_core::grpc::{extract_request_id, GrpcResult, IntoStatus};
use tonic::{Request, Response};

/// Fully qualified gRPC service name, as reported by the health service.
pub const SERVICE_NAME: &str = "interview.v1.UserSubmissionService";

pub struct SubmissionGrpcService {
    evaluator: SubmissionEvaluator,
}

impl SubmissionGrpcService {
    pub fn new(evaluator: SubmissionEvaluator) -> Self {
        Self { evaluator }
    }
}

impl From<HistoryItem> for HistoryTurn {
    fn from(item: HistoryItem) -> Self {
        Self {
            number: item.number,
            question: item.question,
            answer: item.answer,
        }
    }
}

impl From<SubmissionRequest> for Submission {
    fn from(req: SubmissionRequest) -> Self {
        Self {
            question: req.question,
            answer: req.answer,
            domain: req.domain,
            response_id: req.response_id,
            history: req.history.into_iter().map(HistoryTurn::from).collect(),
        }
    }
}

impl From<Evaluation> for EvaluationResult {
    fn from(evaluation: Evaluation) -> Self {
        Self {
            question: evaluation.question,
            answer: evaluation.answer,
            clarity: evaluation.clarity,
            tone: evaluation.tone,
            relevance: evaluation.relevance,
            overall_score: evaluation.overall_score,
            suggestion: evaluation.suggestion,
            next_question: evaluation.next_question,
            next_question_difficulty: evaluation.next_question_difficulty,
            explanation: evaluation.explanation,
        }
    }
}

#[tonic::async_trait]
impl UserSubmissionService for SubmissionGrpcService {
    #[tracing::instrument(
        skip(self, request),
        fields(
            method = "SubmitUserSubmission",
            request_id = tracing::field::Empty,
            response_id = tracing::field::Empty,
            domain = tracing::field::Empty,
        )
    )]
    async fn submit_user_submission(
        &self,
        request: Request<SubmissionRequest>,
    ) -> GrpcResult<EvaluationResult> {
        let call = GrpcCallGuard::start("SubmitUserSubmission");

        let span = tracing::Span::current();
        if let Some(request_id) = extract_request_id(&request) {
            span.record("request_id", request_id.as_str());
        }

        let submission = Submission::from(request.into_inner());
        span.record("response_id", submission.response_id.as_str());
        span.record("domain", submission.domain.as_str());

        tracing::info!(
            history_len = submission.history.len(),
            "Evaluating submission"
        );

        let result = self.evaluator.evaluate(&submission).await;

        match result {
            Ok(evaluation) => {
                call.finish("ok");
                Ok(Response::new(evaluation.into()))
            }
            Err(e) => {
                call.finish("error");
                let provider = self.evaluator.provider().name();
                Err(AppError::Upstream(format!("{} API error: {}", provider, e)).into_status())
            }
        }
    }
}
