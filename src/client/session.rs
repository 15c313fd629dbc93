// src/client/session.rs

use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use super::{ClientError, Feedback, QuizApi, Stage, Stopwatch, TopicRun};
use crate::models::{
    answer::{Mode, SubmitAnswerRequest},
    question::{Choice, OptionSet, PublicQuestion, TopicQuestionView, TopicSummary},
};

/// How long a notice stays visible before it expires on its own.
pub const NOTICE_TTL_SECS: u64 = 4;

/// A dismissible message for a recoverable failure. Expires on its own.
#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    raised_at: Instant,
}

impl Notice {
    fn new(message: String) -> Self {
        Self {
            message,
            raised_at: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.raised_at.elapsed() >= Duration::from_secs(NOTICE_TTL_SECS)
    }
}

/// The daily question being answered or reviewed.
#[derive(Debug, Clone)]
pub struct DailyRun {
    pub question: PublicQuestion,
    pub stage: Stage,
}

/// One reviewed question: what was asked, what the user chose and the key.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewItem {
    pub question_id: Uuid,
    pub question: String,
    pub options: OptionSet,
    pub choice: Choice,
    pub correct_option: Choice,
    pub is_correct: bool,
}

impl ReviewItem {
    fn from_view(view: TopicQuestionView) -> Option<Self> {
        Some(Self {
            question_id: view.id,
            choice: view.user_answer?,
            correct_option: view.correct_option?,
            is_correct: view.is_correct?,
            question: view.question,
            options: view.options,
        })
    }
}

/// Read-only navigation over a finished topic.
#[derive(Debug, Clone)]
pub struct ReviewDeck {
    items: Vec<ReviewItem>,
    index: usize,
}

impl ReviewDeck {
    pub fn new(items: Vec<ReviewItem>) -> Self {
        Self { items, index: 0 }
    }

    pub fn current(&self) -> Option<&ReviewItem> {
        self.items.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns `false` at the last item.
    pub fn next(&mut self) -> bool {
        if self.index + 1 < self.items.len() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Returns `false` at the first item.
    pub fn prev(&mut self) -> bool {
        if self.index > 0 {
            self.index -= 1;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone)]
pub enum View {
    Idle,
    TopicList(Vec<TopicSummary>),
    /// The daily quiz exists and has not been started.
    DailyPending(Uuid),
    Daily(DailyRun),
    InTopic {
        topic_id: Uuid,
        name: String,
        run: TopicRun,
    },
    Review {
        topic_id: Uuid,
        name: String,
        deck: ReviewDeck,
    },
}

/// Drives one user's quiz screens against a `QuizApi`.
///
/// Failed calls leave the current view untouched and raise a `Notice`; the error is
/// still returned so callers can react to it.
pub struct QuizSession<A: QuizApi> {
    api: A,
    view: View,
    stopwatch: Stopwatch,
    notice: Option<Notice>,
}

impl<A: QuizApi> QuizSession<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            view: View::Idle,
            stopwatch: Stopwatch::default(),
            notice: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn stopwatch(&self) -> &Stopwatch {
        &self.stopwatch
    }

    /// The pending notice, unless it has expired.
    pub fn notice(&self) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|n| !n.is_expired())
            .map(|n| n.message.as_str())
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    fn fail<T>(&mut self, error: ClientError) -> Result<T, ClientError> {
        if error.is_recoverable() {
            tracing::warn!("Quiz request failed: {}", error);
            self.notice = Some(Notice::new(error.to_string()));
        }
        Err(error)
    }

    pub async fn load_topics(&mut self) -> Result<(), ClientError> {
        match self.api.list_topics().await {
            Ok(topics) => {
                self.view = View::TopicList(topics);
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    /// Stops the timer without submitting anything and returns to the topic list.
    pub async fn back_to_topics(&mut self) -> Result<(), ClientError> {
        self.stopwatch.stop();
        self.load_topics().await
    }

    /// Fetches the topic and the user's answers for it once, then starts sequencing.
    pub async fn enter_topic(&mut self, topic_id: Uuid) -> Result<(), ClientError> {
        let topic = match self.api.get_topic(topic_id).await {
            Ok(topic) => topic,
            Err(e) => return self.fail(e),
        };
        let ids: Vec<Uuid> = topic.questions.iter().map(|q| q.id).collect();
        let answers = match self.api.get_answers_bulk(&ids, Mode::Competitive).await {
            Ok(answers) => answers,
            Err(e) => return self.fail(e),
        };

        let run = TopicRun::new(topic.questions, answers);
        if run.is_complete() {
            self.stopwatch.stop();
        } else {
            self.stopwatch.reset();
        }

        tracing::debug!(
            "Entered topic {} at question {} of {}",
            topic.id,
            run.index() + 1,
            run.len()
        );
        self.view = View::InTopic {
            topic_id: topic.id,
            name: topic.name,
            run,
        };
        Ok(())
    }

    /// Shows the daily quiz: a review when already attempted, otherwise a start screen.
    pub async fn open_daily(&mut self) -> Result<(), ClientError> {
        let status = match self.api.daily_status().await {
            Ok(status) => status,
            Err(e) => return self.fail(e),
        };

        let Some(body) = status.review.filter(|_| status.has_attempted) else {
            self.view = View::DailyPending(status.id);
            return Ok(());
        };

        let stored = match self.api.get_answer(status.id, Mode::Daily).await {
            Ok(stored) => stored,
            Err(e) => return self.fail(e),
        };

        self.stopwatch.stop();
        self.view = View::Daily(DailyRun {
            question: PublicQuestion {
                id: status.id,
                question: body.question,
                options: body.options,
            },
            stage: Stage::Feedback(Feedback {
                choice: stored.answer,
                is_correct: stored.is_correct,
                correct_option: Some(body.correct_option),
            }),
        });
        Ok(())
    }

    pub async fn start_daily(&mut self) -> Result<(), ClientError> {
        let question = match self.api.start_daily().await {
            Ok(question) => question,
            Err(e) => return self.fail(e),
        };

        self.stopwatch.reset();
        self.view = View::Daily(DailyRun {
            question,
            stage: Stage::Presenting,
        });
        Ok(())
    }

    /// Submits `choice` for the presented question, daily or topic.
    ///
    /// A duplicate answer re-syncs the stored answer from the server and shows it as
    /// feedback. Other failures unlock the question again.
    pub async fn submit(&mut self, choice: Choice) -> Result<(), ClientError> {
        let (question_id, mode) = match &mut self.view {
            View::Daily(daily) if daily.stage == Stage::Presenting => {
                daily.stage = Stage::Submitting;
                (daily.question.id, Mode::Daily)
            }
            View::InTopic { run, .. } => (run.lock_current()?, Mode::Competitive),
            _ => {
                return Err(ClientError::InvalidTransition(
                    "no question is waiting for an answer",
                ));
            }
        };

        let request = SubmitAnswerRequest {
            question_id,
            answer: choice,
            mode,
            time_spent: Some(self.stopwatch.elapsed_secs()),
            correct_option: None,
        };

        let feedback = match self.api.submit_answer(&request).await {
            Ok(response) => Feedback {
                choice,
                is_correct: response.is_correct,
                correct_option: Some(response.correct_option),
            },
            Err(ClientError::DuplicateAnswer) => {
                tracing::info!("Question {} was already answered, re-syncing", question_id);
                match self.api.get_answer(question_id, mode).await {
                    Ok(stored) => Feedback {
                        choice: stored.answer,
                        is_correct: stored.is_correct,
                        correct_option: stored.is_correct.then_some(stored.answer),
                    },
                    Err(e) => {
                        self.unlock();
                        return self.fail(e);
                    }
                }
            }
            Err(e) => {
                self.unlock();
                return self.fail(e);
            }
        };

        match &mut self.view {
            View::Daily(daily) => {
                daily.stage = Stage::Feedback(feedback);
                self.stopwatch.stop();
            }
            View::InTopic { run, .. } => run.record(question_id, feedback),
            _ => {}
        }
        Ok(())
    }

    fn unlock(&mut self) {
        match &mut self.view {
            View::Daily(daily) if daily.stage == Stage::Submitting => {
                daily.stage = Stage::Presenting;
            }
            View::InTopic { run, .. } => run.unlock(),
            _ => {}
        }
    }

    pub fn skip(&mut self) -> Result<(), ClientError> {
        match &mut self.view {
            View::InTopic { run, .. } => run.skip(),
            _ => Err(ClientError::InvalidTransition("only topic questions can be skipped")),
        }
    }

    /// Leaves the feedback screen. Stops the timer when the topic is done.
    pub fn next(&mut self) -> Result<(), ClientError> {
        match &mut self.view {
            View::InTopic { run, .. } => {
                run.advance()?;
                if run.is_complete() {
                    self.stopwatch.stop();
                }
                Ok(())
            }
            _ => Err(ClientError::InvalidTransition("not inside a topic")),
        }
    }

    /// Opens the review of a finished topic. Re-fetches the topic so every question
    /// carries its answer key; nothing is written.
    pub async fn review(&mut self) -> Result<(), ClientError> {
        let topic_id = match &self.view {
            View::InTopic { topic_id, run, .. } if run.is_complete() => *topic_id,
            View::Review { topic_id, .. } => *topic_id,
            _ => {
                return Err(ClientError::InvalidTransition(
                    "review is available once every question is answered",
                ));
            }
        };

        let topic = match self.api.get_topic(topic_id).await {
            Ok(topic) => topic,
            Err(e) => return self.fail(e),
        };

        let items = topic
            .questions
            .into_iter()
            .filter_map(ReviewItem::from_view)
            .collect();
        self.view = View::Review {
            topic_id: topic.id,
            name: topic.name,
            deck: ReviewDeck::new(items),
        };
        Ok(())
    }

    pub fn review_next(&mut self) -> bool {
        match &mut self.view {
            View::Review { deck, .. } => deck.next(),
            _ => false,
        }
    }

    pub fn review_prev(&mut self) -> bool {
        match &mut self.view {
            View::Review { deck, .. } => deck.prev(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{
            Mutex,
            atomic::{AtomicBool, AtomicUsize, Ordering},
        },
    };

    use async_trait::async_trait;

    use super::*;
    use crate::{
        client::Phase,
        models::{
            analytics::Analytics,
            answer::{StoredAnswer, SubmitAnswerResponse},
            question::{DailyStatus, QuestionBody, TopicView},
        },
    };

    struct FakeQuestion {
        id: Uuid,
        key: Choice,
    }

    /// In-process stand-in for the quiz endpoints.
    #[derive(Default)]
    struct FakeApi {
        topic_id: Uuid,
        questions: Vec<FakeQuestion>,
        ledger: Mutex<HashMap<(Uuid, Mode), (Choice, bool, u32)>>,
        offline: AtomicBool,
        topic_fetches: AtomicUsize,
        daily_id: Uuid,
    }

    impl FakeApi {
        fn with_keys(keys: &[Choice]) -> Self {
            Self {
                topic_id: Uuid::new_v4(),
                questions: keys
                    .iter()
                    .map(|&key| FakeQuestion {
                        id: Uuid::new_v4(),
                        key,
                    })
                    .collect(),
                daily_id: Uuid::new_v4(),
                ..Default::default()
            }
        }

        fn options() -> OptionSet {
            OptionSet {
                option_a: "a".into(),
                option_b: "b".into(),
                option_c: "c".into(),
                option_d: "d".into(),
            }
        }

        fn check_online(&self) -> Result<(), ClientError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(ClientError::Transport("connection refused".into()));
            }
            Ok(())
        }

        fn key_for(&self, id: Uuid) -> Option<Choice> {
            if id == self.daily_id {
                return Some(Choice::D);
            }
            self.questions.iter().find(|q| q.id == id).map(|q| q.key)
        }
    }

    #[async_trait]
    impl QuizApi for FakeApi {
        async fn daily_status(&self) -> Result<DailyStatus, ClientError> {
            self.check_online()?;
            let attempted = self
                .ledger
                .lock()
                .unwrap()
                .contains_key(&(self.daily_id, Mode::Daily));
            Ok(DailyStatus {
                id: self.daily_id,
                has_attempted: attempted,
                review: attempted.then(|| QuestionBody {
                    question: "daily".into(),
                    options: Self::options(),
                    correct_option: Choice::D,
                }),
            })
        }

        async fn start_daily(&self) -> Result<PublicQuestion, ClientError> {
            self.check_online()?;
            Ok(PublicQuestion {
                id: self.daily_id,
                question: "daily".into(),
                options: Self::options(),
            })
        }

        async fn list_topics(&self) -> Result<Vec<TopicSummary>, ClientError> {
            self.check_online()?;
            Ok(vec![TopicSummary {
                id: self.topic_id,
                name: "Arithmetic".into(),
            }])
        }

        async fn get_topic(&self, topic_id: Uuid) -> Result<TopicView, ClientError> {
            self.check_online()?;
            if topic_id != self.topic_id {
                return Err(ClientError::NotFound("Topic not found".into()));
            }
            self.topic_fetches.fetch_add(1, Ordering::SeqCst);
            let ledger = self.ledger.lock().unwrap();
            let questions = self
                .questions
                .iter()
                .enumerate()
                .map(|(i, q)| {
                    let stored = ledger.get(&(q.id, Mode::Competitive));
                    TopicQuestionView {
                        id: q.id,
                        question: format!("q{}", i + 1),
                        options: Self::options(),
                        correct_option: stored.map(|_| q.key),
                        user_answer: stored.map(|s| s.0),
                        is_correct: stored.map(|s| s.1),
                    }
                })
                .collect();
            Ok(TopicView {
                id: self.topic_id,
                name: "Arithmetic".into(),
                questions,
            })
        }

        async fn submit_answer(
            &self,
            request: &SubmitAnswerRequest,
        ) -> Result<SubmitAnswerResponse, ClientError> {
            self.check_online()?;
            let key = self
                .key_for(request.question_id)
                .ok_or(ClientError::NotFound("Question not found".into()))?;
            let mut ledger = self.ledger.lock().unwrap();
            let slot = (request.question_id, request.mode);
            if ledger.contains_key(&slot) {
                return Err(ClientError::DuplicateAnswer);
            }
            let is_correct = request.answer == key;
            ledger.insert(
                slot,
                (request.answer, is_correct, request.time_spent.unwrap_or(0)),
            );
            Ok(SubmitAnswerResponse {
                message: "Answer submitted successfully".into(),
                is_correct,
                correct_option: key,
            })
        }

        async fn get_answer(
            &self,
            question_id: Uuid,
            mode: Mode,
        ) -> Result<StoredAnswer, ClientError> {
            self.check_online()?;
            self.ledger
                .lock()
                .unwrap()
                .get(&(question_id, mode))
                .map(|&(answer, is_correct, time_spent)| StoredAnswer {
                    answer,
                    is_correct,
                    time_spent,
                })
                .ok_or(ClientError::NotFound("Answer not found".into()))
        }

        async fn get_answers_bulk(
            &self,
            question_ids: &[Uuid],
            mode: Mode,
        ) -> Result<HashMap<Uuid, Choice>, ClientError> {
            self.check_online()?;
            let ledger = self.ledger.lock().unwrap();
            Ok(question_ids
                .iter()
                .filter_map(|id| ledger.get(&(*id, mode)).map(|s| (*id, s.0)))
                .collect())
        }

        async fn analytics(&self) -> Result<Analytics, ClientError> {
            Err(ClientError::Rejected {
                status: 501,
                message: "not used".into(),
            })
        }
    }

    fn current_id(session: &QuizSession<FakeApi>) -> Uuid {
        match session.view() {
            View::InTopic { run, .. } => run.current().expect("a question on screen").id,
            other => panic!("expected a topic, got {:?}", other),
        }
    }

    fn run_phase(session: &QuizSession<FakeApi>) -> Phase {
        match session.view() {
            View::InTopic { run, .. } => run.phase(),
            other => panic!("expected a topic, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn skipped_question_is_presented_again_before_completion() {
        let api = FakeApi::with_keys(&[Choice::A, Choice::B, Choice::C]);
        let topic_id = api.topic_id;
        let ids: Vec<Uuid> = api.questions.iter().map(|q| q.id).collect();
        let mut session = QuizSession::new(api);

        session.load_topics().await.unwrap();
        session.enter_topic(topic_id).await.unwrap();
        assert_eq!(current_id(&session), ids[0]);

        session.submit(Choice::A).await.unwrap();
        session.next().unwrap();
        assert_eq!(current_id(&session), ids[1]);

        session.skip().unwrap();
        assert_eq!(current_id(&session), ids[2]);

        session.submit(Choice::A).await.unwrap();
        match run_phase(&session) {
            Phase::Sequencing(Stage::Feedback(fb)) => {
                assert!(!fb.is_correct);
                assert_eq!(fb.correct_option, Some(Choice::C));
            }
            other => panic!("expected feedback, got {:?}", other),
        }
        session.next().unwrap();
        assert_eq!(current_id(&session), ids[1]);
        assert_ne!(run_phase(&session), Phase::AllAnswered);

        session.submit(Choice::B).await.unwrap();
        session.next().unwrap();
        assert_eq!(run_phase(&session), Phase::AllAnswered);
        assert!(!session.stopwatch().is_running());
        // One fetch on entry; sequencing never re-fetches the topic.
        assert_eq!(session.api().topic_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_time_is_sent_with_each_submission() {
        let api = FakeApi::with_keys(&[Choice::A, Choice::B]);
        let topic_id = api.topic_id;
        let first = api.questions[0].id;
        let mut session = QuizSession::new(api);

        session.enter_topic(topic_id).await.unwrap();
        tokio::time::advance(Duration::from_secs(12)).await;
        session.submit(Choice::A).await.unwrap();

        let stored = session.api().ledger.lock().unwrap()[&(first, Mode::Competitive)];
        assert_eq!(stored.2, 12);
    }

    #[tokio::test(start_paused = true)]
    async fn back_to_topics_stops_the_timer_without_submitting() {
        let api = FakeApi::with_keys(&[Choice::A]);
        let topic_id = api.topic_id;
        let mut session = QuizSession::new(api);

        session.enter_topic(topic_id).await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        session.back_to_topics().await.unwrap();

        assert!(matches!(session.view(), View::TopicList(topics) if topics.len() == 1));
        assert!(!session.stopwatch().is_running());
        assert_eq!(session.stopwatch().elapsed_secs(), 5);
        assert!(session.api().ledger.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_answer_resyncs_instead_of_failing() {
        let api = FakeApi::with_keys(&[Choice::C, Choice::A]);
        let topic_id = api.topic_id;
        let first = api.questions[0].id;
        let mut session = QuizSession::new(api);

        session.enter_topic(topic_id).await.unwrap();
        // Answered from another device after the topic was loaded.
        session
            .api()
            .ledger
            .lock()
            .unwrap()
            .insert((first, Mode::Competitive), (Choice::C, true, 3));

        session.submit(Choice::B).await.unwrap();
        match run_phase(&session) {
            Phase::Sequencing(Stage::Feedback(fb)) => {
                assert_eq!(fb.choice, Choice::C);
                assert!(fb.is_correct);
            }
            other => panic!("expected feedback, got {:?}", other),
        }
        assert!(session.notice().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn network_failure_keeps_state_and_raises_an_expiring_notice() {
        let api = FakeApi::with_keys(&[Choice::A, Choice::B]);
        let topic_id = api.topic_id;
        let first = api.questions[0].id;
        let mut session = QuizSession::new(api);

        session.enter_topic(topic_id).await.unwrap();
        session.api().offline.store(true, Ordering::SeqCst);

        let err = session.submit(Choice::A).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(current_id(&session), first);
        assert_eq!(run_phase(&session), Phase::Sequencing(Stage::Presenting));
        assert!(session.notice().is_some());

        tokio::time::advance(Duration::from_secs(NOTICE_TTL_SECS)).await;
        assert!(session.notice().is_none());

        session.api().offline.store(false, Ordering::SeqCst);
        session.submit(Choice::A).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn review_walks_every_answer_without_writing() {
        let api = FakeApi::with_keys(&[Choice::A, Choice::B]);
        let topic_id = api.topic_id;
        let mut session = QuizSession::new(api);

        session.enter_topic(topic_id).await.unwrap();
        assert!(session.review().await.is_err());

        session.submit(Choice::A).await.unwrap();
        session.next().unwrap();
        session.submit(Choice::D).await.unwrap();
        session.next().unwrap();
        session.review().await.unwrap();

        let View::Review { deck, .. } = session.view() else {
            panic!("expected review");
        };
        assert_eq!(deck.len(), 2);
        let first = deck.current().unwrap();
        assert!(first.is_correct);
        assert_eq!(first.correct_option, Choice::A);

        assert!(session.review_next());
        assert!(!session.review_next());
        let View::Review { deck, .. } = session.view() else {
            panic!("expected review");
        };
        let second = deck.current().unwrap();
        assert_eq!(second.choice, Choice::D);
        assert_eq!(second.correct_option, Choice::B);

        assert!(session.review_prev());
        assert!(!session.review_prev());
        assert_eq!(session.api().ledger.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn daily_quiz_moves_from_pending_to_feedback_to_review() {
        let api = FakeApi::with_keys(&[]);
        let daily_id = api.daily_id;
        let mut session = QuizSession::new(api);

        session.open_daily().await.unwrap();
        assert!(matches!(session.view(), View::DailyPending(id) if *id == daily_id));
        assert!(session.skip().is_err());

        session.start_daily().await.unwrap();
        session.submit(Choice::D).await.unwrap();
        assert!(matches!(
            session.view(),
            View::Daily(DailyRun { stage: Stage::Feedback(fb), .. }) if fb.is_correct
        ));
        assert!(!session.stopwatch().is_running());

        session.open_daily().await.unwrap();
        match session.view() {
            View::Daily(daily) => {
                assert_eq!(daily.question.id, daily_id);
                assert_eq!(
                    daily.stage,
                    Stage::Feedback(Feedback {
                        choice: Choice::D,
                        is_correct: true,
                        correct_option: Some(Choice::D),
                    })
                );
            }
            other => panic!("expected daily review, got {:?}", other),
        }
    }
}
