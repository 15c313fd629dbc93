// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use quizhub::{
    config::Config,
    models::user::{NewUser, ROLE_ADMIN},
    routes,
    state::AppState,
    store::{MemoryStore, UserStore},
    utils::hash::hash_password,
};
use serde_json::{Value, json};
use uuid::Uuid;

pub const TEST_SECRET: &str = "test_secret_for_integration_tests";
pub const PASSWORD: &str = "password123";

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

/// Spawns the app on a random port, backed by a fresh in-memory store.
pub async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let state = AppState {
        store: store.clone(),
        config: Config::for_tests(TEST_SECRET),
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
        client: reqwest::Client::new(),
    }
}

/// A unique email per call so tests never collide.
pub fn unique_email(prefix: &str) -> String {
    format!("{}_{}@example.com", prefix, &Uuid::new_v4().to_string()[..8])
}

pub async fn signup(app: &TestApp, email: &str) -> reqwest::Response {
    app.client
        .post(app.url("/api/auth/signup"))
        .json(&json!({
            "fullname": "Test User",
            "email": email,
            "password": PASSWORD,
            "securityQuestion": "First pet?",
            "securityAnswer": "Rex",
        }))
        .send()
        .await
        .expect("Failed to execute request")
}

pub async fn login(app: &TestApp, email: &str, password: &str) -> reqwest::Response {
    app.client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to execute request")
}

/// Registers a fresh user and returns a bearer token.
pub async fn user_token(app: &TestApp) -> String {
    let email = unique_email("user");
    assert_eq!(signup(app, &email).await.status().as_u16(), 201);
    token_for(app, &email).await
}

async fn token_for(app: &TestApp, email: &str) -> String {
    let body: Value = login(app, email, PASSWORD).await.json().await.unwrap();
    body["token"].as_str().expect("token in login response").to_string()
}

/// Creates an admin directly in the store and returns its bearer token.
pub async fn admin_token(app: &TestApp) -> String {
    let email = unique_email("admin");
    app.store
        .create_user(NewUser {
            fullname: "Admin".into(),
            email: email.clone(),
            password_hash: hash_password(PASSWORD).unwrap(),
            security_question: "q".into(),
            security_answer_hash: hash_password("a").unwrap(),
            role: ROLE_ADMIN.into(),
        })
        .await
        .unwrap();
    token_for(app, &email).await
}

pub fn question_body(text: &str, key: &str) -> Value {
    json!({
        "question": text,
        "optionA": "first",
        "optionB": "second",
        "optionC": "third",
        "optionD": "fourth",
        "correctOption": key,
    })
}

/// Creates a topic with one question per key; returns the topic id and question ids.
pub async fn create_topic(app: &TestApp, admin: &str, name: &str, keys: &[&str]) -> (String, Vec<String>) {
    let questions: Vec<Value> = keys
        .iter()
        .enumerate()
        .map(|(i, key)| question_body(&format!("Question {}", i + 1), key))
        .collect();

    let response = app
        .client
        .post(app.url("/api/admin/quiz/topic"))
        .bearer_auth(admin)
        .json(&json!({ "name": name, "questions": questions }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let topic: Value = response.json().await.unwrap();
    let ids = topic["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["_id"].as_str().unwrap().to_string())
        .collect();
    (topic["_id"].as_str().unwrap().to_string(), ids)
}

/// Publishes a daily quiz and returns its id.
pub async fn create_daily(app: &TestApp, admin: &str, key: &str) -> String {
    let response = app
        .client
        .post(app.url("/api/admin/quiz/daily"))
        .bearer_auth(admin)
        .json(&question_body("Daily question", key))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let quiz: Value = response.json().await.unwrap();
    quiz["_id"].as_str().unwrap().to_string()
}

pub async fn submit(
    app: &TestApp,
    token: &str,
    question_id: &str,
    answer: &str,
    mode: &str,
    time_spent: Option<u32>,
) -> reqwest::Response {
    let mut body = json!({ "questionId": question_id, "answer": answer, "type": mode });
    if let Some(seconds) = time_spent {
        body["timeSpent"] = json!(seconds);
    }
    app.client
        .post(app.url("/api/quiz/answer"))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .unwrap()
}

pub async fn get_json(app: &TestApp, token: &str, path: &str) -> (u16, Value) {
    let response = app
        .client
        .get(app.url(path))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap_or(Value::Null))
}
