// src/models/question.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::utils::html::clean_html;

/// One of the four option letters of a multiple-choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    A,
    B,
    C,
    D,
}

impl Choice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Choice::A => "A",
            Choice::B => "B",
            Choice::C => "C",
            Choice::D => "D",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Choice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Choice::A),
            "B" => Ok(Choice::B),
            "C" => Ok(Choice::C),
            "D" => Ok(Choice::D),
            other => Err(format!("invalid choice '{}'", other)),
        }
    }
}

/// The four option texts, serialized as `optionA`..`optionD`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OptionSet {
    #[validate(length(min = 1, max = 500))]
    pub option_a: String,
    #[validate(length(min = 1, max = 500))]
    pub option_b: String,
    #[validate(length(min = 1, max = 500))]
    pub option_c: String,
    #[validate(length(min = 1, max = 500))]
    pub option_d: String,
}

/// Question text, options and answer key. Shared by daily quizzes and topic questions.
/// Also the request body for creating or editing either of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionBody {
    #[validate(length(min = 1, max = 2000))]
    pub question: String,
    #[serde(flatten)]
    #[validate(nested)]
    pub options: OptionSet,
    pub correct_option: Choice,
}

impl QuestionBody {
    /// Strips unsafe markup from every free-text field before it is stored.
    pub fn sanitized(self) -> Self {
        Self {
            question: clean_html(&self.question),
            options: OptionSet {
                option_a: clean_html(&self.options.option_a),
                option_b: clean_html(&self.options.option_b),
                option_c: clean_html(&self.options.option_c),
                option_d: clean_html(&self.options.option_d),
            },
            correct_option: self.correct_option,
        }
    }
}

/// A daily quiz document. The most recently created one is the active one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyQuiz {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(flatten)]
    pub body: QuestionBody,
    pub created_at: DateTime<Utc>,
}

impl DailyQuiz {
    pub fn new(body: QuestionBody) -> Self {
        Self {
            id: Uuid::new_v4(),
            body,
            created_at: Utc::now(),
        }
    }
}

/// A question embedded in a topic. Its id is distinct from the topic's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(flatten)]
    pub body: QuestionBody,
}

impl Question {
    pub fn new(body: QuestionBody) -> Self {
        Self {
            id: Uuid::new_v4(),
            body,
        }
    }
}

/// A named, ordered list of competitive questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
}

/// Listing shape for topics: no questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
}

/// Response of `GET /quiz/daily`.
/// The question and its answer key are only included once the caller has attempted it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStatus {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub has_attempted: bool,
    #[serde(flatten)]
    pub review: Option<QuestionBody>,
}

/// A question as presented before an attempt: no answer key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicQuestion {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub question: String,
    #[serde(flatten)]
    pub options: OptionSet,
}

impl From<&DailyQuiz> for PublicQuestion {
    fn from(quiz: &DailyQuiz) -> Self {
        Self {
            id: quiz.id,
            question: quiz.body.question.clone(),
            options: quiz.body.options.clone(),
        }
    }
}

/// A topic question as seen by one user.
///
/// Unanswered questions use the present shape (no `correctOption`); answered ones use the
/// review shape carrying the answer key, the user's choice and its frozen correctness.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicQuestionView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub question: String,
    #[serde(flatten)]
    pub options: OptionSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

/// Response of `GET /quiz/topic/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub questions: Vec<TopicQuestionView>,
}

/// DTO for creating a topic, optionally with its first questions.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTopicRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    #[validate(nested)]
    pub questions: Vec<QuestionBody>,
}
