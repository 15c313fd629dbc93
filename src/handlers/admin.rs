// src/handlers/admin.rs

//! Catalog and content management. Every route here sits behind `admin_middleware`.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        content::{AppRequest, ChannelRequest, Help, HelpRequest, PaperRequest},
        question::{CreateTopicRequest, DailyQuiz, Question, QuestionBody, Topic},
    },
    store::SharedStore,
    utils::{extract::ValidJson, html::clean_html},
};

fn deleted(what: &str) -> Json<serde_json::Value> {
    Json(json!({ "message": format!("{} deleted successfully", what) }))
}

// --- Daily quiz ---

/// Returns the active daily quiz including its answer key.
pub async fn get_daily_quiz(
    State(store): State<SharedStore>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = store
        .active_daily_quiz()
        .await?
        .ok_or(AppError::NotFound("No daily quiz available".to_string()))?;
    Ok(Json(quiz))
}

/// Publishes a new daily quiz. It becomes the active one; older ones are kept.
pub async fn create_daily_quiz(
    State(store): State<SharedStore>,
    ValidJson(body): ValidJson<QuestionBody>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = DailyQuiz::new(body.sanitized());
    store.insert_daily_quiz(&quiz).await?;

    tracing::info!("Published daily quiz {}", quiz.id);
    Ok((StatusCode::CREATED, Json(quiz)))
}

pub async fn update_daily_quiz(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
    ValidJson(body): ValidJson<QuestionBody>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = store
        .update_daily_quiz(id, &body.sanitized())
        .await?
        .ok_or(AppError::NotFound("Daily quiz not found".to_string()))?;
    Ok(Json(quiz))
}

pub async fn delete_daily_quiz(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !store.delete_daily_quiz(id).await? {
        return Err(AppError::NotFound("Daily quiz not found".to_string()));
    }
    Ok(deleted("Daily quiz"))
}

// --- Topics and questions ---

pub async fn create_topic(
    State(store): State<SharedStore>,
    ValidJson(payload): ValidJson<CreateTopicRequest>,
) -> Result<impl IntoResponse, AppError> {
    let topic = Topic {
        id: Uuid::new_v4(),
        name: clean_html(payload.name.trim()),
        questions: payload
            .questions
            .into_iter()
            .map(|body| Question::new(body.sanitized()))
            .collect(),
        created_at: Utc::now(),
    };
    store.insert_topic(&topic).await?;

    tracing::info!(
        "Created topic {} with {} questions",
        topic.id,
        topic.questions.len()
    );
    Ok((StatusCode::CREATED, Json(topic)))
}

/// Returns the full topic with every answer key.
pub async fn get_topic(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let topic = store
        .find_topic(id)
        .await?
        .ok_or(AppError::NotFound("Topic not found".to_string()))?;
    Ok(Json(topic))
}

pub async fn delete_topic(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !store.delete_topic(id).await? {
        return Err(AppError::NotFound("Topic not found".to_string()));
    }
    Ok(deleted("Topic"))
}

pub async fn add_question(
    State(store): State<SharedStore>,
    Path(topic_id): Path<Uuid>,
    ValidJson(body): ValidJson<QuestionBody>,
) -> Result<impl IntoResponse, AppError> {
    let question = Question::new(body.sanitized());
    if !store.insert_question(topic_id, &question).await? {
        return Err(AppError::NotFound("Topic not found".to_string()));
    }
    Ok((StatusCode::CREATED, Json(question)))
}

/// Replaces a question's text, options and key.
/// Answers already in the ledger keep the correctness they were scored with.
pub async fn update_question(
    State(store): State<SharedStore>,
    Path((topic_id, question_id)): Path<(Uuid, Uuid)>,
    ValidJson(body): ValidJson<QuestionBody>,
) -> Result<impl IntoResponse, AppError> {
    let question = store
        .update_question(topic_id, question_id, &body.sanitized())
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;
    Ok(Json(question))
}

pub async fn delete_question(
    State(store): State<SharedStore>,
    Path((topic_id, question_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    if !store.delete_question(topic_id, question_id).await? {
        return Err(AppError::NotFound("Question not found".to_string()));
    }
    Ok(deleted("Question"))
}

// --- Papers, channels, apps ---

pub async fn create_paper(
    State(store): State<SharedStore>,
    ValidJson(payload): ValidJson<PaperRequest>,
) -> Result<impl IntoResponse, AppError> {
    let paper = payload.into_paper(Uuid::new_v4(), Utc::now());
    store.insert_paper(&paper).await?;
    Ok((StatusCode::CREATED, Json(paper)))
}

pub async fn update_paper(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<PaperRequest>,
) -> Result<impl IntoResponse, AppError> {
    // created_at is ignored by the store on update.
    let paper = store
        .update_paper(&payload.into_paper(id, Utc::now()))
        .await?
        .ok_or(AppError::NotFound("Paper not found".to_string()))?;
    Ok(Json(paper))
}

pub async fn delete_paper(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !store.delete_paper(id).await? {
        return Err(AppError::NotFound("Paper not found".to_string()));
    }
    Ok(deleted("Paper"))
}

pub async fn create_channel(
    State(store): State<SharedStore>,
    ValidJson(payload): ValidJson<ChannelRequest>,
) -> Result<impl IntoResponse, AppError> {
    let channel = payload.into_channel(Uuid::new_v4(), Utc::now());
    store.insert_channel(&channel).await?;
    Ok((StatusCode::CREATED, Json(channel)))
}

pub async fn update_channel(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<ChannelRequest>,
) -> Result<impl IntoResponse, AppError> {
    let channel = store
        .update_channel(&payload.into_channel(id, Utc::now()))
        .await?
        .ok_or(AppError::NotFound("Channel not found".to_string()))?;
    Ok(Json(channel))
}

pub async fn delete_channel(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !store.delete_channel(id).await? {
        return Err(AppError::NotFound("Channel not found".to_string()));
    }
    Ok(deleted("Channel"))
}

pub async fn create_app(
    State(store): State<SharedStore>,
    ValidJson(payload): ValidJson<AppRequest>,
) -> Result<impl IntoResponse, AppError> {
    let app = payload.into_app(Uuid::new_v4(), Utc::now());
    store.insert_app(&app).await?;
    Ok((StatusCode::CREATED, Json(app)))
}

pub async fn update_app(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<AppRequest>,
) -> Result<impl IntoResponse, AppError> {
    let app = store
        .update_app(&payload.into_app(id, Utc::now()))
        .await?
        .ok_or(AppError::NotFound("App not found".to_string()))?;
    Ok(Json(app))
}

pub async fn delete_app(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !store.delete_app(id).await? {
        return Err(AppError::NotFound("App not found".to_string()));
    }
    Ok(deleted("App"))
}

// --- Help ---

/// Uploads a new help document; it replaces the current one for readers.
pub async fn create_help(
    State(store): State<SharedStore>,
    ValidJson(payload): ValidJson<HelpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let help = Help {
        id: Uuid::new_v4(),
        pdf_url: payload.pdf_url,
        updated_at: Utc::now(),
    };
    store.insert_help(&help).await?;
    Ok((StatusCode::CREATED, Json(help)))
}

pub async fn update_help(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<HelpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let help = Help {
        id,
        pdf_url: payload.pdf_url,
        updated_at: Utc::now(),
    };
    let help = store
        .update_help(&help)
        .await?
        .ok_or(AppError::NotFound("Help document not found".to_string()))?;
    Ok(Json(help))
}

pub async fn delete_help(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !store.delete_help(id).await? {
        return Err(AppError::NotFound("Help document not found".to_string()));
    }
    Ok(deleted("Help document"))
}
