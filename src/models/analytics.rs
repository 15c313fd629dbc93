// src/models/analytics.rs

use serde::{Deserialize, Serialize};

use crate::models::answer::{Answer, Mode};

/// Summary of one user's ledger, derived on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_time_consumed: u64,
    pub total_questions_answered: u64,
    pub correct_answers: u64,
    pub wrong_answers: u64,
    /// Percentage rounded to two decimals; 0 when nothing was answered.
    pub accuracy: f64,
    pub daily_quiz_attempts: u64,
    pub competitive_quiz_attempts: u64,
    /// Whole seconds; 0 when nothing was answered.
    pub average_time_per_question: u64,
}

impl Analytics {
    pub fn from_ledger(answers: &[Answer], total_time_consumed: u64) -> Self {
        let total = answers.len() as u64;
        let correct = answers.iter().filter(|a| a.is_correct).count() as u64;
        let count_mode = |mode: Mode| answers.iter().filter(|a| a.mode == mode).count() as u64;

        let (accuracy, average_time_per_question) = if total == 0 {
            (0.0, 0)
        } else {
            let percent = correct as f64 / total as f64 * 100.0;
            (
                (percent * 100.0).round() / 100.0,
                (total_time_consumed as f64 / total as f64).round() as u64,
            )
        };

        Self {
            total_time_consumed,
            total_questions_answered: total,
            correct_answers: correct,
            wrong_answers: total - correct,
            accuracy,
            daily_quiz_attempts: count_mode(Mode::Daily),
            competitive_quiz_attempts: count_mode(Mode::Competitive),
            average_time_per_question,
        }
    }
}
