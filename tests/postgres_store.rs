// tests/postgres_store.rs

//! `PgStore` against a live database. Every test returns early when `DATABASE_URL`
//! is not set, so the suite stays green on machines without Postgres.

use std::sync::Arc;

use chrono::{Duration, Utc};
use quizhub::{
    error::AppError,
    models::{
        answer::{Answer, Mode},
        question::{Choice, DailyQuiz, OptionSet, Question, QuestionBody, Topic},
        user::{NewUser, ROLE_USER, User},
    },
    store::{CatalogStore, LedgerStore, PgStore, UserStore},
};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

async fn pg_store() -> Option<PgStore> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres store test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    Some(PgStore::new(pool))
}

async fn new_user(store: &PgStore) -> User {
    store
        .create_user(NewUser {
            fullname: "Pg User".to_string(),
            email: format!("pg_{}@example.com", Uuid::new_v4()),
            password_hash: "$argon2id$placeholder".to_string(),
            security_question: "First pet?".to_string(),
            security_answer_hash: "$argon2id$placeholder".to_string(),
            role: ROLE_USER.to_string(),
        })
        .await
        .expect("Failed to create user")
}

fn body(text: &str, key: Choice) -> QuestionBody {
    QuestionBody {
        question: text.to_string(),
        options: OptionSet {
            option_a: "first".into(),
            option_b: "second".into(),
            option_c: "third".into(),
            option_d: "fourth".into(),
        },
        correct_option: key,
    }
}

fn topic(keys: &[Choice]) -> Topic {
    Topic {
        id: Uuid::new_v4(),
        name: format!("Topic {}", Uuid::new_v4()),
        questions: keys
            .iter()
            .enumerate()
            .map(|(i, key)| Question::new(body(&format!("q{}", i + 1), *key)))
            .collect(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn duplicate_answer_is_rejected_and_time_counted_once() {
    let Some(store) = pg_store().await else { return };
    let user = new_user(&store).await;
    let question_id = Uuid::new_v4();

    let first = Answer::score(question_id, Mode::Daily, Choice::B, Choice::B, 12);
    store.record_answer(user.id, &first).await.unwrap();

    let second = Answer::score(question_id, Mode::Daily, Choice::C, Choice::B, 30);
    let err = store.record_answer(user.id, &second).await.unwrap_err();
    assert!(matches!(err, AppError::DuplicateAnswer));

    // The same question in the other mode is a separate entry.
    let competitive = Answer::score(question_id, Mode::Competitive, Choice::A, Choice::B, 3);
    store.record_answer(user.id, &competitive).await.unwrap();

    let stored = store
        .find_answer(user.id, question_id, Mode::Daily)
        .await
        .unwrap()
        .expect("daily answer stored");
    assert_eq!(stored.choice, Choice::B);
    assert!(stored.is_correct);

    let user = store.find_user(user.id).await.unwrap().unwrap();
    assert_eq!(user.total_time_consumed, 15);
}

#[tokio::test]
async fn unknown_user_cannot_record() {
    let Some(store) = pg_store().await else { return };
    let answer = Answer::score(Uuid::new_v4(), Mode::Daily, Choice::A, Choice::A, 1);

    let err = store.record_answer(Uuid::new_v4(), &answer).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn concurrent_submissions_store_exactly_one_row() {
    let Some(store) = pg_store().await else { return };
    let store = Arc::new(store);
    let user_id = new_user(&store).await.id;
    let question_id = Uuid::new_v4();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let answer = Answer::score(question_id, Mode::Competitive, Choice::D, Choice::D, 7);
            store.record_answer(user_id, &answer).await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => accepted += 1,
            Err(AppError::DuplicateAnswer) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
    assert_eq!(accepted, 1);

    let ledger = store.list_answers(user_id).await.unwrap();
    assert_eq!(ledger.len(), 1);

    let user = store.find_user(user_id).await.unwrap().unwrap();
    assert_eq!(user.total_time_consumed, 7);
}

#[tokio::test]
async fn bulk_lookup_returns_only_answered_ids_in_submission_order() {
    let Some(store) = pg_store().await else { return };
    let user = new_user(&store).await;
    let (q1, q2, q3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    for (id, choice) in [(q2, Choice::A), (q1, Choice::C)] {
        let answer = Answer::score(id, Mode::Competitive, choice, Choice::C, 0);
        store.record_answer(user.id, &answer).await.unwrap();
    }
    // Other mode must not leak into the competitive lookup.
    let daily = Answer::score(q3, Mode::Daily, Choice::B, Choice::B, 0);
    store.record_answer(user.id, &daily).await.unwrap();

    let found = store
        .find_answers(user.id, &[q1, q2, q3], Mode::Competitive)
        .await
        .unwrap();
    let ids: Vec<Uuid> = found.iter().map(|a| a.question_id).collect();
    assert_eq!(ids, vec![q2, q1]);
    assert!(!found[0].is_correct);
    assert!(found[1].is_correct);

    let none = store
        .find_answers(user.id, &[], Mode::Competitive)
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn newest_daily_quiz_is_active() {
    let Some(store) = pg_store().await else { return };

    // Far enough ahead that rows left by other tests never win.
    let base = Utc::now() + Duration::days(365 * 100);
    let older = DailyQuiz {
        id: Uuid::new_v4(),
        body: body("older", Choice::A),
        created_at: base,
    };
    let newer = DailyQuiz {
        id: Uuid::new_v4(),
        body: body("newer", Choice::B),
        created_at: base + Duration::seconds(1),
    };
    store.insert_daily_quiz(&newer).await.unwrap();
    store.insert_daily_quiz(&older).await.unwrap();

    let active = store.active_daily_quiz().await.unwrap().unwrap();
    assert_eq!(active.id, newer.id);

    // Deleting the active quiz re-activates the previous one.
    assert!(store.delete_daily_quiz(newer.id).await.unwrap());
    let active = store.active_daily_quiz().await.unwrap().unwrap();
    assert_eq!(active.id, older.id);

    assert!(store.delete_daily_quiz(older.id).await.unwrap());
}

#[tokio::test]
async fn topic_questions_keep_insertion_order() {
    let Some(store) = pg_store().await else { return };
    let topic = topic(&[Choice::A, Choice::B, Choice::C]);
    store.insert_topic(&topic).await.unwrap();

    let appended = Question::new(body("q4", Choice::D));
    assert!(store.insert_question(topic.id, &appended).await.unwrap());

    let loaded = store.find_topic(topic.id).await.unwrap().unwrap();
    let texts: Vec<&str> = loaded
        .questions
        .iter()
        .map(|q| q.body.question.as_str())
        .collect();
    assert_eq!(texts, vec!["q1", "q2", "q3", "q4"]);

    let found = store.find_question(appended.id).await.unwrap().unwrap();
    assert_eq!(found.body.correct_option, Choice::D);

    assert!(!store.insert_question(Uuid::new_v4(), &appended).await.unwrap());
    store.delete_topic(topic.id).await.unwrap();
}

#[tokio::test]
async fn answers_survive_topic_deletion() {
    let Some(store) = pg_store().await else { return };
    let user = new_user(&store).await;
    let topic = topic(&[Choice::B]);
    let question_id = topic.questions[0].id;
    store.insert_topic(&topic).await.unwrap();

    let answer = Answer::score(question_id, Mode::Competitive, Choice::B, Choice::B, 4);
    store.record_answer(user.id, &answer).await.unwrap();

    assert!(store.delete_topic(topic.id).await.unwrap());
    assert!(store.find_topic(topic.id).await.unwrap().is_none());
    assert!(store.find_question(question_id).await.unwrap().is_none());

    let ledger = store.list_answers(user.id).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].question_id, question_id);
    assert!(ledger[0].is_correct);
}

#[tokio::test]
async fn deleting_a_user_removes_their_ledger() {
    let Some(store) = pg_store().await else { return };
    let user = new_user(&store).await;
    let answer = Answer::score(Uuid::new_v4(), Mode::Daily, Choice::A, Choice::A, 2);
    store.record_answer(user.id, &answer).await.unwrap();

    assert!(store.delete_user(user.id).await.unwrap());
    assert!(store.list_answers(user.id).await.unwrap().is_empty());
    assert!(store.find_user(user.id).await.unwrap().is_none());
}
