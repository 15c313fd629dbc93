// src/client/sequencer.rs

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use super::ClientError;
use crate::models::question::{Choice, TopicQuestionView};

/// Outcome shown after a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feedback {
    pub choice: Choice,
    pub is_correct: bool,
    /// Unknown when the answer was re-synced from the ledger after a wrong guess.
    pub correct_option: Option<Choice>,
}

/// Where the current question stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Presenting,
    /// Input is locked while the submission is in flight.
    Submitting,
    Feedback(Feedback),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Sequencing(Stage),
    AllAnswered,
}

/// Sequences one topic's questions for a session without re-fetching the topic.
///
/// Starts at the first unanswered question. Skipped questions come back once the end
/// of the list is reached, and the run only completes when every question has an answer.
#[derive(Debug, Clone)]
pub struct TopicRun {
    questions: Vec<TopicQuestionView>,
    answers: HashMap<Uuid, Choice>,
    skipped: HashSet<Uuid>,
    index: usize,
    phase: Phase,
}

impl TopicRun {
    /// `answers` holds the caller's existing competitive answers for this topic.
    pub fn new(questions: Vec<TopicQuestionView>, answers: HashMap<Uuid, Choice>) -> Self {
        let mut run = Self {
            questions,
            answers,
            skipped: HashSet::new(),
            index: 0,
            phase: Phase::AllAnswered,
        };
        if let Some(first) = run.first_unanswered() {
            run.index = first;
            run.phase = Phase::Sequencing(Stage::Presenting);
        }
        run
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::AllAnswered
    }

    /// Position of the current question in the topic.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn answered_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| self.answers.contains_key(&q.id))
            .count()
    }

    pub fn answer_for(&self, question_id: Uuid) -> Option<Choice> {
        self.answers.get(&question_id).copied()
    }

    pub fn is_skipped(&self, question_id: Uuid) -> bool {
        self.skipped.contains(&question_id)
    }

    /// The question on screen; `None` once everything is answered.
    pub fn current(&self) -> Option<&TopicQuestionView> {
        match self.phase {
            Phase::Sequencing(_) => self.questions.get(self.index),
            Phase::AllAnswered => None,
        }
    }

    fn is_pending(&self, question: &TopicQuestionView) -> bool {
        !self.answers.contains_key(&question.id) || self.skipped.contains(&question.id)
    }

    fn first_unanswered(&self) -> Option<usize> {
        self.questions
            .iter()
            .position(|q| !self.answers.contains_key(&q.id))
    }

    /// Moves to the next pending question after the current one, wrapping to the first
    /// unanswered question when the end of the list is reached.
    fn move_on(&mut self) {
        let after = self
            .questions
            .iter()
            .enumerate()
            .skip(self.index + 1)
            .find(|(_, q)| self.is_pending(q))
            .map(|(i, _)| i);

        match after.or_else(|| self.first_unanswered()) {
            Some(next) => {
                self.index = next;
                self.phase = Phase::Sequencing(Stage::Presenting);
            }
            None => self.phase = Phase::AllAnswered,
        }
    }

    /// Sets the current question aside and presents the next pending one.
    pub fn skip(&mut self) -> Result<(), ClientError> {
        if self.phase != Phase::Sequencing(Stage::Presenting) {
            return Err(ClientError::InvalidTransition(
                "only a presented question can be skipped",
            ));
        }
        let id = self.questions[self.index].id;
        self.skipped.insert(id);
        self.move_on();
        Ok(())
    }

    /// Locks input for the current question and returns its id for submission.
    pub fn lock_current(&mut self) -> Result<Uuid, ClientError> {
        if self.phase != Phase::Sequencing(Stage::Presenting) {
            return Err(ClientError::InvalidTransition(
                "answers can only be submitted for a presented question",
            ));
        }
        self.phase = Phase::Sequencing(Stage::Submitting);
        Ok(self.questions[self.index].id)
    }

    /// Releases the input lock after a failed submission.
    pub fn unlock(&mut self) {
        if self.phase == Phase::Sequencing(Stage::Submitting) {
            self.phase = Phase::Sequencing(Stage::Presenting);
        }
    }

    /// Records an answer and, when it belongs to the current question, shows feedback.
    pub fn record(&mut self, question_id: Uuid, feedback: Feedback) {
        self.answers.insert(question_id, feedback.choice);
        self.skipped.remove(&question_id);

        if let Some(question) = self.questions.iter_mut().find(|q| q.id == question_id) {
            question.user_answer = Some(feedback.choice);
            question.is_correct = Some(feedback.is_correct);
            if feedback.correct_option.is_some() {
                question.correct_option = feedback.correct_option;
            }
        }

        let is_current = self
            .questions
            .get(self.index)
            .is_some_and(|q| q.id == question_id);
        if is_current && matches!(self.phase, Phase::Sequencing(_)) {
            self.phase = Phase::Sequencing(Stage::Feedback(feedback));
        }
    }

    /// Leaves the feedback screen for the next pending question, or completes the run.
    pub fn advance(&mut self) -> Result<(), ClientError> {
        match self.phase {
            Phase::Sequencing(Stage::Feedback(_)) => {
                self.move_on();
                Ok(())
            }
            _ => Err(ClientError::InvalidTransition(
                "there is no answered question to move on from",
            )),
        }
    }
}
