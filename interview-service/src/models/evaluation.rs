use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Difficulty of the proposed follow-up question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }

    /// Case-insensitive parse of `EASY` / `MEDIUM` / `HARD`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured evaluation of one answer.
///
/// Every field is text; a field the model did not produce is `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub question: String,
    pub answer: String,
    pub clarity: String,
    pub tone: String,
    pub relevance: String,
    pub overall_score: String,
    pub suggestion: String,
    pub next_question: String,
    pub next_question_difficulty: String,
    pub explanation: String,
}

/// Reply keys the model is asked to produce, in prompt order.
pub const REPLY_FIELDS: [&str; 10] = [
    "question",
    "answer",
    "clarity",
    "tone",
    "relevance",
    "overallScore",
    "suggestion",
    "nextQuestion",
    "nextQuestionDifficulty",
    "explanation",
];

/// `nextQuestion`, `Nextquestion` and `next_question` all normalize to `nextquestion`.
fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Render a reply value as text. `null` counts as absent.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

impl Evaluation {
    /// Build an evaluation from the model's JSON object, defaulting every
    /// missing field to `""`.
    pub fn from_reply(reply: &Map<String, Value>) -> Self {
        let fields: HashMap<String, &Value> = reply
            .iter()
            .map(|(key, value)| (normalize_key(key), value))
            .collect();

        let field = |name: &str| {
            fields
                .get(&normalize_key(name))
                .map(|value| value_to_text(value))
                .unwrap_or_default()
        };

        let raw_difficulty = field("nextQuestionDifficulty");
        let next_question_difficulty = match Difficulty::parse(&raw_difficulty) {
            Some(difficulty) => difficulty.as_str().to_string(),
            None if raw_difficulty.is_empty() => raw_difficulty,
            None => {
                tracing::warn!(
                    value = %raw_difficulty,
                    "Model returned an unrecognized next question difficulty"
                );
                raw_difficulty
            }
        };

        let evaluation = Self {
            question: field("question"),
            answer: field("answer"),
            clarity: field("clarity"),
            tone: field("tone"),
            relevance: field("relevance"),
            overall_score: field("overallScore"),
            suggestion: field("suggestion"),
            next_question: field("nextQuestion"),
            next_question_difficulty,
            explanation: field("explanation"),
        };

        let missing = evaluation.missing_fields();
        if !missing.is_empty() {
            tracing::warn!(missing = ?missing, "Model reply is missing fields, defaulting to empty");
        }

        evaluation
    }

    /// Parsed difficulty, if the model produced a recognized one.
    pub fn difficulty(&self) -> Option<Difficulty> {
        Difficulty::parse(&self.next_question_difficulty)
    }

    /// Reply keys whose value came back empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let values = [
            &self.question,
            &self.answer,
            &self.clarity,
            &self.tone,
            &self.relevance,
            &self.overall_score,
            &self.suggestion,
            &self.next_question,
            &self.next_question_difficulty,
            &self.explanation,
        ];

        REPLY_FIELDS
            .iter()
            .zip(values)
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| *name)
            .collect()
    }

    /// Gemini `responseSchema` describing the reply object.
    pub fn response_schema() -> Value {
        let mut properties = Map::new();
        for name in REPLY_FIELDS {
            let property = if name == "nextQuestionDifficulty" {
                json!({
                    "type": "STRING",
                    "enum": Difficulty::ALL.map(|d| d.as_str()),
                })
            } else {
                json!({ "type": "STRING" })
            };
            properties.insert(name.to_string(), property);
        }

        json!({
            "type": "OBJECT",
            "properties": properties,
            "required": REPLY_FIELDS,
            "propertyOrdering": REPLY_FIELDS,
        })
    }
}
