// src/store/mod.rs

//! Persistence seam.
//!
//! Handlers only see `Arc<dyn Store>`. `PgStore` is the production backend; `MemoryStore`
//! keeps everything in process and backs local runs without `DATABASE_URL` and the tests.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        answer::{Answer, Mode},
        content::{App, Channel, Help, Paper},
        question::{DailyQuiz, Question, QuestionBody, Topic, TopicSummary},
        user::{NewUser, User},
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type SharedStore = Arc<dyn Store>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError>;
    /// Hard delete; the user's ledger goes with it.
    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn find_answer(
        &self,
        user_id: Uuid,
        question_id: Uuid,
        mode: Mode,
    ) -> Result<Option<Answer>, AppError>;

    /// Answers among `question_ids` for `mode`; unanswered ids are simply absent.
    async fn find_answers(
        &self,
        user_id: Uuid,
        question_ids: &[Uuid],
        mode: Mode,
    ) -> Result<Vec<Answer>, AppError>;

    /// Whole ledger in submission order.
    async fn list_answers(&self, user_id: Uuid) -> Result<Vec<Answer>, AppError>;

    /// Appends `answer` and adds its `time_spent` to the user's total, atomically.
    ///
    /// Fails with `DuplicateAnswer` when (user, question, mode) is already recorded, also
    /// when a concurrent submission wins the race. Fails with `NotFound` for unknown users.
    async fn record_answer(&self, user_id: Uuid, answer: &Answer) -> Result<(), AppError>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// The most recently created daily quiz.
    async fn active_daily_quiz(&self) -> Result<Option<DailyQuiz>, AppError>;
    async fn find_daily_quiz(&self, id: Uuid) -> Result<Option<DailyQuiz>, AppError>;
    async fn insert_daily_quiz(&self, quiz: &DailyQuiz) -> Result<(), AppError>;
    async fn update_daily_quiz(
        &self,
        id: Uuid,
        body: &QuestionBody,
    ) -> Result<Option<DailyQuiz>, AppError>;
    async fn delete_daily_quiz(&self, id: Uuid) -> Result<bool, AppError>;

    /// Sorted by name.
    async fn list_topics(&self) -> Result<Vec<TopicSummary>, AppError>;
    async fn find_topic(&self, id: Uuid) -> Result<Option<Topic>, AppError>;
    async fn insert_topic(&self, topic: &Topic) -> Result<(), AppError>;
    /// Removes the topic and its questions. Answers referencing them stay in the ledger.
    async fn delete_topic(&self, id: Uuid) -> Result<bool, AppError>;

    /// Appends to the topic's question list; `false` when the topic does not exist.
    async fn insert_question(&self, topic_id: Uuid, question: &Question) -> Result<bool, AppError>;
    async fn update_question(
        &self,
        topic_id: Uuid,
        question_id: Uuid,
        body: &QuestionBody,
    ) -> Result<Option<Question>, AppError>;
    async fn delete_question(&self, topic_id: Uuid, question_id: Uuid) -> Result<bool, AppError>;
    /// Looks up an embedded question by its own id, across all topics.
    async fn find_question(&self, question_id: Uuid) -> Result<Option<Question>, AppError>;
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Newest first.
    async fn list_papers(&self) -> Result<Vec<Paper>, AppError>;
    /// Case-insensitive substring match on the topic name, newest first.
    async fn search_papers(&self, needle: &str) -> Result<Vec<Paper>, AppError>;
    async fn insert_paper(&self, paper: &Paper) -> Result<(), AppError>;
    /// Replaces every field except `created_at`.
    async fn update_paper(&self, paper: &Paper) -> Result<Option<Paper>, AppError>;
    async fn delete_paper(&self, id: Uuid) -> Result<bool, AppError>;

    async fn list_channels(&self) -> Result<Vec<Channel>, AppError>;
    async fn insert_channel(&self, channel: &Channel) -> Result<(), AppError>;
    async fn update_channel(&self, channel: &Channel) -> Result<Option<Channel>, AppError>;
    async fn delete_channel(&self, id: Uuid) -> Result<bool, AppError>;

    async fn list_apps(&self) -> Result<Vec<App>, AppError>;
    async fn insert_app(&self, app: &App) -> Result<(), AppError>;
    async fn update_app(&self, app: &App) -> Result<Option<App>, AppError>;
    async fn delete_app(&self, id: Uuid) -> Result<bool, AppError>;

    /// The most recently written help document.
    async fn current_help(&self) -> Result<Option<Help>, AppError>;
    async fn insert_help(&self, help: &Help) -> Result<(), AppError>;
    async fn update_help(&self, help: &Help) -> Result<Option<Help>, AppError>;
    async fn delete_help(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Everything the HTTP layer needs from persistence.
pub trait Store: UserStore + LedgerStore + CatalogStore + ContentStore {}

impl<T> Store for T where T: UserStore + LedgerStore + CatalogStore + ContentStore {}
