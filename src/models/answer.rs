// src/models/answer.rs

use std::{collections::HashMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::question::Choice;

/// Partitions the answer ledger: a question is answered at most once per mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Daily,
    Competitive,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Daily => "daily",
            Mode::Competitive => "competitive",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Mode::Daily),
            "competitive" => Ok(Mode::Competitive),
            other => Err(format!("invalid mode '{}'", other)),
        }
    }
}

/// One entry of a user's answer ledger.
/// `is_correct` is computed at submission time and never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: Uuid,
    #[serde(rename = "type")]
    pub mode: Mode,
    pub choice: Choice,
    pub is_correct: bool,
    /// Seconds.
    pub time_spent: u32,
    pub answered_at: DateTime<Utc>,
}

impl Answer {
    /// Scores `choice` against the catalog's answer key.
    pub fn score(
        question_id: Uuid,
        mode: Mode,
        choice: Choice,
        correct_option: Choice,
        time_spent: u32,
    ) -> Self {
        Self {
            question_id,
            mode,
            choice,
            is_correct: choice == correct_option,
            time_spent,
            answered_at: Utc::now(),
        }
    }
}

/// DTO for `POST /quiz/answer`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub question_id: Uuid,
    pub answer: Choice,
    #[serde(rename = "type")]
    pub mode: Mode,
    /// Seconds; stored as 0 when omitted.
    #[serde(default)]
    pub time_spent: Option<u32>,
    /// Legacy hint from older clients. Never used for scoring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<Choice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerResponse {
    pub message: String,
    pub is_correct: bool,
    pub correct_option: Choice,
}

/// Query string of `GET /quiz/user-answer`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswerQuery {
    #[serde(rename = "type")]
    pub mode: Mode,
    pub question_id: Uuid,
}

/// Response of `GET /quiz/user-answer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAnswer {
    pub answer: Choice,
    pub is_correct: bool,
    pub time_spent: u32,
}

impl From<&Answer> for StoredAnswer {
    fn from(answer: &Answer) -> Self {
        Self {
            answer: answer.choice,
            is_correct: answer.is_correct,
            time_spent: answer.time_spent,
        }
    }
}

/// DTO for `POST /quiz/user-answers-bulk`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkAnswersRequest {
    #[validate(length(max = 500))]
    pub question_ids: Vec<Uuid>,
    #[serde(rename = "type")]
    pub mode: Mode,
}

/// Only answered ids appear as keys; unanswered ids are omitted, never null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkAnswersResponse {
    pub answers: HashMap<Uuid, Choice>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoring_compares_against_the_key() {
        let id = Uuid::new_v4();
        assert!(Answer::score(id, Mode::Daily, Choice::B, Choice::B, 0).is_correct);
        assert!(!Answer::score(id, Mode::Daily, Choice::C, Choice::B, 0).is_correct);
    }

    #[test]
    fn submit_request_accepts_legacy_shape_without_time() {
        let req: SubmitAnswerRequest = serde_json::from_value(serde_json::json!({
            "questionId": Uuid::nil(),
            "answer": "A",
            "type": "competitive",
            "correctOption": "D"
        }))
        .unwrap();
        assert_eq!(req.mode, Mode::Competitive);
        assert_eq!(req.time_spent, None);
        assert_eq!(req.correct_option, Some(Choice::D));
    }

    #[test]
    fn negative_time_is_rejected_at_parse() {
        let parsed = serde_json::from_value::<SubmitAnswerRequest>(serde_json::json!({
            "questionId": Uuid::nil(),
            "answer": "A",
            "type": "daily",
            "timeSpent": -3
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn mode_round_trips_through_text() {
        for mode in [Mode::Daily, Mode::Competitive] {
            assert_eq!(mode.as_str().parse::<Mode>().unwrap(), mode);
        }
        assert!("weekly".parse::<Mode>().is_err());
    }
}
