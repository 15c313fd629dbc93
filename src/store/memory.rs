// src/store/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        answer::{Answer, Mode},
        content::{App, Channel, Help, Paper},
        question::{DailyQuiz, Question, QuestionBody, Topic, TopicSummary},
        user::{NewUser, User},
    },
    store::{CatalogStore, ContentStore, LedgerStore, UserStore},
};

/// A user document with its embedded answer ledger.
#[derive(Debug, Clone)]
struct UserDoc {
    user: User,
    answers: Vec<Answer>,
}

#[derive(Debug, Default)]
struct Collections {
    users: HashMap<Uuid, UserDoc>,
    daily_quizzes: Vec<DailyQuiz>,
    topics: Vec<Topic>,
    papers: Vec<Paper>,
    channels: Vec<Channel>,
    apps: Vec<App>,
    help: Vec<Help>,
}

/// In-process document store. Every mutation holds the single write lock, which is what
/// makes `record_answer`'s check-and-append atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T: Clone>(items: &[T], key: impl Fn(&T) -> chrono::DateTime<Utc>) -> Vec<T> {
    let mut sorted = items.to_vec();
    // Stable sort, reversed afterwards so later inserts win ties.
    sorted.sort_by_key(|item| key(item));
    sorted.reverse();
    sorted
}

fn remove_by<T>(items: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> bool {
    let before = items.len();
    items.retain(|item| !matches(item));
    items.len() != before
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut db = self.inner.write().await;

        if db.users.values().any(|doc| doc.user.email == user.email) {
            return Err(AppError::Conflict(format!(
                "User already exists with email '{}'",
                user.email
            )));
        }

        let user = user.into_user();
        db.users.insert(
            user.id,
            UserDoc {
                user: user.clone(),
                answers: Vec::new(),
            },
        );
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let db = self.inner.read().await;
        Ok(db.users.get(&id).map(|doc| doc.user.clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let db = self.inner.read().await;
        Ok(db
            .users
            .values()
            .find(|doc| doc.user.email == email)
            .map(|doc| doc.user.clone()))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError> {
        let mut db = self.inner.write().await;
        match db.users.get_mut(&id) {
            Some(doc) => {
                doc.user.password = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError> {
        let mut db = self.inner.write().await;
        Ok(db.users.remove(&id).is_some())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn find_answer(
        &self,
        user_id: Uuid,
        question_id: Uuid,
        mode: Mode,
    ) -> Result<Option<Answer>, AppError> {
        let db = self.inner.read().await;
        Ok(db.users.get(&user_id).and_then(|doc| {
            doc.answers
                .iter()
                .find(|a| a.question_id == question_id && a.mode == mode)
                .cloned()
        }))
    }

    async fn find_answers(
        &self,
        user_id: Uuid,
        question_ids: &[Uuid],
        mode: Mode,
    ) -> Result<Vec<Answer>, AppError> {
        let db = self.inner.read().await;
        let Some(doc) = db.users.get(&user_id) else {
            return Ok(Vec::new());
        };
        Ok(doc
            .answers
            .iter()
            .filter(|a| a.mode == mode && question_ids.contains(&a.question_id))
            .cloned()
            .collect())
    }

    async fn list_answers(&self, user_id: Uuid) -> Result<Vec<Answer>, AppError> {
        let db = self.inner.read().await;
        Ok(db
            .users
            .get(&user_id)
            .map(|doc| doc.answers.clone())
            .unwrap_or_default())
    }

    async fn record_answer(&self, user_id: Uuid, answer: &Answer) -> Result<(), AppError> {
        let mut db = self.inner.write().await;
        let doc = db
            .users
            .get_mut(&user_id)
            .ok_or(AppError::NotFound("User not found".to_string()))?;

        if doc
            .answers
            .iter()
            .any(|a| a.question_id == answer.question_id && a.mode == answer.mode)
        {
            return Err(AppError::DuplicateAnswer);
        }

        doc.answers.push(answer.clone());
        doc.user.total_time_consumed += u64::from(answer.time_spent);
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn active_daily_quiz(&self) -> Result<Option<DailyQuiz>, AppError> {
        let db = self.inner.read().await;
        Ok(newest_first(&db.daily_quizzes, |q| q.created_at)
            .into_iter()
            .next())
    }

    async fn find_daily_quiz(&self, id: Uuid) -> Result<Option<DailyQuiz>, AppError> {
        let db = self.inner.read().await;
        Ok(db.daily_quizzes.iter().find(|q| q.id == id).cloned())
    }

    async fn insert_daily_quiz(&self, quiz: &DailyQuiz) -> Result<(), AppError> {
        self.inner.write().await.daily_quizzes.push(quiz.clone());
        Ok(())
    }

    async fn update_daily_quiz(
        &self,
        id: Uuid,
        body: &QuestionBody,
    ) -> Result<Option<DailyQuiz>, AppError> {
        let mut db = self.inner.write().await;
        Ok(db.daily_quizzes.iter_mut().find(|q| q.id == id).map(|quiz| {
            quiz.body = body.clone();
            quiz.clone()
        }))
    }

    async fn delete_daily_quiz(&self, id: Uuid) -> Result<bool, AppError> {
        let mut db = self.inner.write().await;
        Ok(remove_by(&mut db.daily_quizzes, |q| q.id == id))
    }

    async fn list_topics(&self) -> Result<Vec<TopicSummary>, AppError> {
        let db = self.inner.read().await;
        let mut topics: Vec<TopicSummary> = db
            .topics
            .iter()
            .map(|t| TopicSummary {
                id: t.id,
                name: t.name.clone(),
            })
            .collect();
        topics.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(topics)
    }

    async fn find_topic(&self, id: Uuid) -> Result<Option<Topic>, AppError> {
        let db = self.inner.read().await;
        Ok(db.topics.iter().find(|t| t.id == id).cloned())
    }

    async fn insert_topic(&self, topic: &Topic) -> Result<(), AppError> {
        self.inner.write().await.topics.push(topic.clone());
        Ok(())
    }

    async fn delete_topic(&self, id: Uuid) -> Result<bool, AppError> {
        let mut db = self.inner.write().await;
        Ok(remove_by(&mut db.topics, |t| t.id == id))
    }

    async fn insert_question(&self, topic_id: Uuid, question: &Question) -> Result<bool, AppError> {
        let mut db = self.inner.write().await;
        match db.topics.iter_mut().find(|t| t.id == topic_id) {
            Some(topic) => {
                topic.questions.push(question.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_question(
        &self,
        topic_id: Uuid,
        question_id: Uuid,
        body: &QuestionBody,
    ) -> Result<Option<Question>, AppError> {
        let mut db = self.inner.write().await;
        Ok(db
            .topics
            .iter_mut()
            .find(|t| t.id == topic_id)
            .and_then(|t| t.questions.iter_mut().find(|q| q.id == question_id))
            .map(|question| {
                question.body = body.clone();
                question.clone()
            }))
    }

    async fn delete_question(&self, topic_id: Uuid, question_id: Uuid) -> Result<bool, AppError> {
        let mut db = self.inner.write().await;
        Ok(match db.topics.iter_mut().find(|t| t.id == topic_id) {
            Some(topic) => remove_by(&mut topic.questions, |q| q.id == question_id),
            None => false,
        })
    }

    async fn find_question(&self, question_id: Uuid) -> Result<Option<Question>, AppError> {
        let db = self.inner.read().await;
        Ok(db
            .topics
            .iter()
            .flat_map(|t| t.questions.iter())
            .find(|q| q.id == question_id)
            .cloned())
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn list_papers(&self) -> Result<Vec<Paper>, AppError> {
        let db = self.inner.read().await;
        Ok(newest_first(&db.papers, |p| p.created_at))
    }

    async fn search_papers(&self, needle: &str) -> Result<Vec<Paper>, AppError> {
        let needle = needle.to_lowercase();
        let db = self.inner.read().await;
        Ok(newest_first(&db.papers, |p| p.created_at)
            .into_iter()
            .filter(|p| p.topic_name.to_lowercase().contains(&needle))
            .collect())
    }

    async fn insert_paper(&self, paper: &Paper) -> Result<(), AppError> {
        self.inner.write().await.papers.push(paper.clone());
        Ok(())
    }

    async fn update_paper(&self, paper: &Paper) -> Result<Option<Paper>, AppError> {
        let mut db = self.inner.write().await;
        Ok(db.papers.iter_mut().find(|p| p.id == paper.id).map(|stored| {
            *stored = Paper {
                created_at: stored.created_at,
                ..paper.clone()
            };
            stored.clone()
        }))
    }

    async fn delete_paper(&self, id: Uuid) -> Result<bool, AppError> {
        let mut db = self.inner.write().await;
        Ok(remove_by(&mut db.papers, |p| p.id == id))
    }

    async fn list_channels(&self) -> Result<Vec<Channel>, AppError> {
        let db = self.inner.read().await;
        Ok(newest_first(&db.channels, |c| c.created_at))
    }

    async fn insert_channel(&self, channel: &Channel) -> Result<(), AppError> {
        self.inner.write().await.channels.push(channel.clone());
        Ok(())
    }

    async fn update_channel(&self, channel: &Channel) -> Result<Option<Channel>, AppError> {
        let mut db = self.inner.write().await;
        Ok(db.channels.iter_mut().find(|c| c.id == channel.id).map(|stored| {
            *stored = Channel {
                created_at: stored.created_at,
                ..channel.clone()
            };
            stored.clone()
        }))
    }

    async fn delete_channel(&self, id: Uuid) -> Result<bool, AppError> {
        let mut db = self.inner.write().await;
        Ok(remove_by(&mut db.channels, |c| c.id == id))
    }

    async fn list_apps(&self) -> Result<Vec<App>, AppError> {
        let db = self.inner.read().await;
        Ok(newest_first(&db.apps, |a| a.created_at))
    }

    async fn insert_app(&self, app: &App) -> Result<(), AppError> {
        self.inner.write().await.apps.push(app.clone());
        Ok(())
    }

    async fn update_app(&self, app: &App) -> Result<Option<App>, AppError> {
        let mut db = self.inner.write().await;
        Ok(db.apps.iter_mut().find(|a| a.id == app.id).map(|stored| {
            *stored = App {
                created_at: stored.created_at,
                ..app.clone()
            };
            stored.clone()
        }))
    }

    async fn delete_app(&self, id: Uuid) -> Result<bool, AppError> {
        let mut db = self.inner.write().await;
        Ok(remove_by(&mut db.apps, |a| a.id == id))
    }

    async fn current_help(&self) -> Result<Option<Help>, AppError> {
        let db = self.inner.read().await;
        Ok(newest_first(&db.help, |h| h.updated_at).into_iter().next())
    }

    async fn insert_help(&self, help: &Help) -> Result<(), AppError> {
        self.inner.write().await.help.push(help.clone());
        Ok(())
    }

    async fn update_help(&self, help: &Help) -> Result<Option<Help>, AppError> {
        let mut db = self.inner.write().await;
        Ok(db.help.iter_mut().find(|h| h.id == help.id).map(|stored| {
            *stored = help.clone();
            stored.clone()
        }))
    }

    async fn delete_help(&self, id: Uuid) -> Result<bool, AppError> {
        let mut db = self.inner.write().await;
        Ok(remove_by(&mut db.help, |h| h.id == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        question::{Choice, OptionSet},
        user::ROLE_USER,
    };
    use std::sync::Arc;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            fullname: "Test".into(),
            email: email.into(),
            password_hash: "hash".into(),
            security_question: "q".into(),
            security_answer_hash: "a".into(),
            role: ROLE_USER.into(),
        }
    }

    fn body(text: &str) -> QuestionBody {
        QuestionBody {
            question: text.into(),
            options: OptionSet {
                option_a: "a".into(),
                option_b: "b".into(),
                option_c: "c".into(),
                option_d: "d".into(),
            },
            correct_option: Choice::A,
        }
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@b.c")).await.unwrap();
        assert!(matches!(
            store.create_user(new_user("a@b.c")).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_submissions_record_exactly_one_answer() {
        let store = Arc::new(MemoryStore::new());
        let user_id = store.create_user(new_user("race@b.c")).await.unwrap().id;
        let question_id = Uuid::new_v4();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let answer = Answer::score(question_id, Mode::Competitive, Choice::A, Choice::A, 3);
                store.record_answer(user_id, &answer).await
            }));
        }

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => ok += 1,
                Err(AppError::DuplicateAnswer) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(ok, 1);
        assert_eq!(store.list_answers(user_id).await.unwrap().len(), 1);
        let stored = store.find_user(user_id).await.unwrap().unwrap();
        assert_eq!(stored.total_time_consumed, 3);
    }

    #[tokio::test]
    async fn same_question_may_be_answered_once_per_mode() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("modes@b.c")).await.unwrap();
        let qid = Uuid::new_v4();

        for mode in [Mode::Daily, Mode::Competitive] {
            let answer = Answer::score(qid, mode, Choice::B, Choice::A, 0);
            store.record_answer(user.id, &answer).await.unwrap();
        }
        assert_eq!(store.list_answers(user.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn latest_daily_quiz_is_active_and_deleting_it_reactivates_the_previous() {
        let store = MemoryStore::new();
        let old = DailyQuiz::new(body("old"));
        let mut new = DailyQuiz::new(body("new"));
        new.created_at = old.created_at + chrono::Duration::seconds(1);

        store.insert_daily_quiz(&old).await.unwrap();
        store.insert_daily_quiz(&new).await.unwrap();
        assert_eq!(store.active_daily_quiz().await.unwrap().unwrap().id, new.id);

        store.delete_daily_quiz(new.id).await.unwrap();
        assert_eq!(store.active_daily_quiz().await.unwrap().unwrap().id, old.id);
    }

    #[tokio::test]
    async fn deleting_a_topic_orphans_but_keeps_answers() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("orphan@b.c")).await.unwrap();
        let question = Question::new(body("q1"));
        let topic = Topic {
            id: Uuid::new_v4(),
            name: "Physics".into(),
            questions: vec![question.clone()],
            created_at: Utc::now(),
        };
        store.insert_topic(&topic).await.unwrap();
        let answer = Answer::score(question.id, Mode::Competitive, Choice::A, Choice::A, 0);
        store.record_answer(user.id, &answer).await.unwrap();

        assert!(store.delete_topic(topic.id).await.unwrap());
        assert!(store.find_question(question.id).await.unwrap().is_none());
        assert_eq!(store.list_answers(user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn paper_search_is_case_insensitive() {
        let store = MemoryStore::new();
        for name in ["Organic Chemistry", "Linear Algebra"] {
            let paper = Paper {
                id: Uuid::new_v4(),
                topic_name: name.into(),
                description: "d".into(),
                pdf_url: "https://example.com/x.pdf".into(),
                created_at: Utc::now(),
            };
            store.insert_paper(&paper).await.unwrap();
        }
        let hits = store.search_papers("CHEM").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].topic_name, "Organic Chemistry");
    }
}
