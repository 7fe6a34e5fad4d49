/// One earlier question/answer turn, as numbered by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
    pub number: i32,
    pub question: String,
    pub answer: String,
}

/// A candidate's answer to the current question, plus every prior turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    pub question: String,
    pub answer: String,
    pub domain: String,
    pub response_id: String,
    /// Chronological; the caller resends the full history on every call.
    pub history: Vec<HistoryTurn>,
}

impl Submission {
    /// Flatten the history into `Q<n>: ...\nA<n>: ...\n` lines, in input order.
    ///
    /// Empty history yields the empty string.
    pub fn history_block(&self) -> String {
        self.history
            .iter()
            .map(|turn| {
                format!(
                    "Q{n}: {q}\nA{n}: {a}\n",
                    n = turn.number,
                    q = turn.question,
                    a = turn.answer
                )
            })
            .collect()
    }
}
