// src/client/mod.rs

//! Quiz client: an HTTP binding of the quiz endpoints plus the session logic that
//! sequences a topic's questions, keeps time and drives review.

use std::{collections::HashMap, fmt};

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::models::{
    analytics::Analytics,
    answer::{
        BulkAnswersRequest, BulkAnswersResponse, Mode, StoredAnswer, SubmitAnswerRequest,
        SubmitAnswerResponse,
    },
    question::{Choice, DailyStatus, PublicQuestion, TopicSummary, TopicView},
    user::{LoginRequest, LoginResponse, SignupRequest},
};

pub mod sequencer;
pub mod session;
pub mod timer;

pub use sequencer::{Feedback, Phase, Stage, TopicRun};
pub use session::{DailyRun, Notice, QuizSession, ReviewDeck, ReviewItem, View};
pub use timer::Stopwatch;

#[derive(Debug)]
pub enum ClientError {
    /// The request never produced a response (connection refused, timeout, ...).
    Transport(String),
    /// Missing, invalid or expired token.
    Unauthenticated(String),
    NotFound(String),
    /// The question was already answered in this mode.
    DuplicateAnswer,
    /// Any other non-success response.
    Rejected { status: u16, message: String },
    /// A success response whose body did not match the expected shape.
    Decode(String),
    /// The session was asked for a step its current state does not allow.
    InvalidTransition(&'static str),
}

impl ClientError {
    /// Failures the session absorbs by re-syncing or showing a notice.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            ClientError::Unauthenticated(_) | ClientError::InvalidTransition(_)
        )
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(msg) => write!(f, "network error: {}", msg),
            ClientError::Unauthenticated(msg) => write!(f, "not signed in: {}", msg),
            ClientError::NotFound(msg) => write!(f, "not found: {}", msg),
            ClientError::DuplicateAnswer => f.write_str("question already answered"),
            ClientError::Rejected { status, message } => {
                write!(f, "request rejected ({}): {}", status, message)
            }
            ClientError::Decode(msg) => write!(f, "unexpected response: {}", msg),
            ClientError::InvalidTransition(msg) => write!(f, "invalid action: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}

/// Error body rendered by the server: `{"error", "code"}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    code: String,
}

fn classify(status: StatusCode, body: ErrorBody) -> ClientError {
    match body.code.as_str() {
        "duplicate_answer" => ClientError::DuplicateAnswer,
        "not_found" => ClientError::NotFound(body.error),
        "unauthenticated" => ClientError::Unauthenticated(body.error),
        _ if status == StatusCode::UNAUTHORIZED => ClientError::Unauthenticated(body.error),
        _ if status == StatusCode::NOT_FOUND => ClientError::NotFound(body.error),
        _ => ClientError::Rejected {
            status: status.as_u16(),
            message: body.error,
        },
    }
}

/// The quiz endpoints as seen by one signed-in user.
#[async_trait]
pub trait QuizApi: Send + Sync {
    async fn daily_status(&self) -> Result<DailyStatus, ClientError>;
    async fn start_daily(&self) -> Result<PublicQuestion, ClientError>;
    async fn list_topics(&self) -> Result<Vec<TopicSummary>, ClientError>;
    async fn get_topic(&self, topic_id: Uuid) -> Result<TopicView, ClientError>;
    async fn submit_answer(
        &self,
        request: &SubmitAnswerRequest,
    ) -> Result<SubmitAnswerResponse, ClientError>;
    async fn get_answer(&self, question_id: Uuid, mode: Mode)
    -> Result<StoredAnswer, ClientError>;
    /// Only answered ids are present in the result.
    async fn get_answers_bulk(
        &self,
        question_ids: &[Uuid],
        mode: Mode,
    ) -> Result<HashMap<Uuid, Choice>, ClientError>;
    async fn analytics(&self) -> Result<Analytics, ClientError>;
}

/// `QuizApi` over HTTP with bearer authentication.
#[derive(Debug, Clone)]
pub struct HttpQuizClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpQuizClient {
    /// `base_url` is the server root, e.g. `http://localhost:5000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ClientError::Decode(e.to_string()));
        }

        let body = response.json::<ErrorBody>().await.unwrap_or_default();
        Err(classify(status, body))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.authorized(self.http.get(self.url(path))).send().await?;
        Self::parse(response).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self
            .authorized(self.http.post(self.url(path)))
            .json(body)
            .send()
            .await?;
        Self::parse(response).await
    }

    /// Registers an account. Does not sign in.
    pub async fn signup(&self, request: &SignupRequest) -> Result<(), ClientError> {
        let _: serde_json::Value = self.post("/auth/signup", request).await?;
        Ok(())
    }

    /// Signs in and keeps the issued token for subsequent calls.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.post("/auth/login", &request).await?;
        self.token = Some(response.token.clone());
        Ok(response)
    }
}

#[async_trait]
impl QuizApi for HttpQuizClient {
    async fn daily_status(&self) -> Result<DailyStatus, ClientError> {
        self.get("/quiz/daily").await
    }

    async fn start_daily(&self) -> Result<PublicQuestion, ClientError> {
        self.get("/quiz/daily/start").await
    }

    async fn list_topics(&self) -> Result<Vec<TopicSummary>, ClientError> {
        self.get("/quiz/topics").await
    }

    async fn get_topic(&self, topic_id: Uuid) -> Result<TopicView, ClientError> {
        self.get(&format!("/quiz/topic/{}", topic_id)).await
    }

    async fn submit_answer(
        &self,
        request: &SubmitAnswerRequest,
    ) -> Result<SubmitAnswerResponse, ClientError> {
        self.post("/quiz/answer", request).await
    }

    async fn get_answer(
        &self,
        question_id: Uuid,
        mode: Mode,
    ) -> Result<StoredAnswer, ClientError> {
        let response = self
            .authorized(self.http.get(self.url("/quiz/user-answer")))
            .query(&[
                ("type", mode.as_str().to_string()),
                ("questionId", question_id.to_string()),
            ])
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn get_answers_bulk(
        &self,
        question_ids: &[Uuid],
        mode: Mode,
    ) -> Result<HashMap<Uuid, Choice>, ClientError> {
        let request = BulkAnswersRequest {
            question_ids: question_ids.to_vec(),
            mode,
        };
        let response: BulkAnswersResponse = self.post("/quiz/user-answers-bulk", &request).await?;
        Ok(response.answers)
    }

    async fn analytics(&self) -> Result<Analytics, ClientError> {
        self.get("/quiz/analytics").await
    }
}
