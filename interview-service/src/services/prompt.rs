//! Instruction block sent to the generation provider.

use crate::models::evaluation::REPLY_FIELDS;
use crate::models::Submission;

/// Assemble the evaluation prompt for `submission`.
///
/// The history block is embedded verbatim; when there is no history the
/// section says so instead of being left blank.
pub fn build_prompt(submission: &Submission) -> String {
    let history_block = submission.history_block();
    let history_section = if history_block.is_empty() {
        "(no previous questions)\n".to_string()
    } else {
        history_block
    };

    let reply_keys = REPLY_FIELDS
        .iter()
        .map(|name| format!("\"{}\"", name))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are a professional technical interviewer conducting an interview in the domain of {domain}.\n\
         \n\
         Your tasks:\n\
         1. Rate the candidate's current answer from 1 to 10 for clarity, tone, relevance and overall quality.\n\
         2. Give one concrete suggestion for improving the answer.\n\
         3. Choose the next interview question, its difficulty, and briefly explain why it was chosen.\n\
         \n\
         Previous interview history:\n\
         {history}\
         \n\
         Current question and answer:\n\
         Q: {question}\n\
         A: {answer}\n\
         \n\
         Reply with exactly one JSON object and nothing else, using these keys: {keys}.\n\
         - \"question\" and \"answer\": copy the current question and answer verbatim.\n\
         - \"clarity\", \"tone\", \"relevance\", \"overallScore\": a whole number from 1 to 10, as a string.\n\
         - \"suggestion\": one improvement tip.\n\
         - \"nextQuestion\": the follow-up question.\n\
         - \"nextQuestionDifficulty\": one of \"EASY\", \"MEDIUM\", \"HARD\".\n\
         - \"explanation\": why the next question was chosen.\n\
         Do not add commentary or Markdown.\n",
        domain = submission.domain,
        history = history_section,
        question = submission.question,
        answer = submission.answer,
        keys = reply_keys,
    )
}
