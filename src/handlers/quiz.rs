// src/handlers/quiz.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        analytics::Analytics,
        answer::{
            Answer, BulkAnswersRequest, BulkAnswersResponse, Mode, StoredAnswer,
            SubmitAnswerRequest, SubmitAnswerResponse, UserAnswerQuery,
        },
        question::{Choice, DailyStatus, PublicQuestion, TopicQuestionView, TopicView},
    },
    store::SharedStore,
    utils::{extract::ValidJson, jwt::Claims},
};

fn no_daily_quiz() -> AppError {
    AppError::NotFound("No daily quiz available".to_string())
}

/// Returns the active daily quiz's id and whether the caller already answered it.
///
/// The question and its answer key are only included after an attempt, so nothing
/// leaks before submission.
pub async fn get_daily_quiz(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let quiz = store.active_daily_quiz().await?.ok_or_else(no_daily_quiz)?;

    let has_attempted = store
        .find_answer(user_id, quiz.id, Mode::Daily)
        .await?
        .is_some();

    Ok(Json(DailyStatus {
        id: quiz.id,
        has_attempted,
        review: has_attempted.then_some(quiz.body),
    }))
}

/// Returns the active daily question with its options but without the answer key.
pub async fn start_daily_quiz(
    State(store): State<SharedStore>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = store.active_daily_quiz().await?.ok_or_else(no_daily_quiz)?;
    Ok(Json(PublicQuestion::from(&quiz)))
}

/// Lists `{_id, name}` for every topic, sorted by name. No questions.
pub async fn list_topics(State(store): State<SharedStore>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(store.list_topics().await?))
}

/// Returns a topic with its questions as seen by the caller.
///
/// Unanswered questions come without `correctOption`; answered ones carry it together
/// with the caller's choice and its stored correctness.
pub async fn get_topic(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(topic_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let topic = store
        .find_topic(topic_id)
        .await?
        .ok_or(AppError::NotFound("Topic not found".to_string()))?;

    let question_ids: Vec<Uuid> = topic.questions.iter().map(|q| q.id).collect();
    let answered: HashMap<Uuid, Answer> = store
        .find_answers(user_id, &question_ids, Mode::Competitive)
        .await?
        .into_iter()
        .map(|a| (a.question_id, a))
        .collect();

    let questions = topic
        .questions
        .into_iter()
        .map(|q| {
            let answer = answered.get(&q.id);
            TopicQuestionView {
                id: q.id,
                question: q.body.question,
                options: q.body.options,
                correct_option: answer.map(|_| q.body.correct_option),
                user_answer: answer.map(|a| a.choice),
                is_correct: answer.map(|a| a.is_correct),
            }
        })
        .collect();

    Ok(Json(TopicView {
        id: topic.id,
        name: topic.name,
        questions,
    }))
}

/// Resolves the answer key for a question from the catalog.
///
/// Daily answers are only accepted for the active daily quiz.
async fn resolve_correct_option(
    store: &SharedStore,
    question_id: Uuid,
    mode: Mode,
) -> Result<Choice, AppError> {
    match mode {
        Mode::Daily => {
            let active = store.active_daily_quiz().await?.ok_or_else(no_daily_quiz)?;
            if active.id == question_id {
                return Ok(active.body.correct_option);
            }
            match store.find_daily_quiz(question_id).await? {
                Some(_) => Err(AppError::BadRequest(
                    "This daily quiz is no longer active".to_string(),
                )),
                None => Err(AppError::NotFound("Question not found".to_string())),
            }
        }
        Mode::Competitive => store
            .find_question(question_id)
            .await?
            .map(|q| q.body.correct_option)
            .ok_or(AppError::NotFound("Question not found".to_string())),
    }
}

/// Submits one answer for (caller, question, mode).
///
/// * Scores against the catalog's answer key; a client-sent `correctOption` is ignored.
/// * Appends to the ledger and adds `timeSpent` (default 0) to the user's total in one
///   atomic store operation.
/// * A second submission for the same triple fails with `DuplicateAnswer`.
pub async fn submit_answer(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    ValidJson(req): ValidJson<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    // Cheap early exit; the store's conditional insert is what actually enforces it.
    if store
        .find_answer(user_id, req.question_id, req.mode)
        .await?
        .is_some()
    {
        return Err(AppError::DuplicateAnswer);
    }

    let correct_option = resolve_correct_option(&store, req.question_id, req.mode).await?;

    if let Some(hint) = req.correct_option {
        if hint != correct_option {
            tracing::warn!(
                "Ignoring mismatching correctOption hint {} for question {} (user {})",
                hint,
                req.question_id,
                user_id
            );
        }
    }

    let answer = Answer::score(
        req.question_id,
        req.mode,
        req.answer,
        correct_option,
        req.time_spent.unwrap_or(0),
    );

    store.record_answer(user_id, &answer).await?;

    tracing::info!(
        "User {} answered {} question {} ({})",
        user_id,
        req.mode,
        req.question_id,
        if answer.is_correct { "correct" } else { "wrong" }
    );

    Ok(Json(SubmitAnswerResponse {
        message: "Answer submitted successfully".to_string(),
        is_correct: answer.is_correct,
        correct_option,
    }))
}

/// Returns the caller's stored answer for one question, or 404 if unanswered.
pub async fn get_user_answer(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<UserAnswerQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let answer = store
        .find_answer(user_id, query.question_id, query.mode)
        .await?
        .ok_or(AppError::NotFound("Answer not found".to_string()))?;

    Ok(Json(StoredAnswer::from(&answer)))
}

/// Resolves many questions' answers in one round trip.
/// Only answered ids appear in the map.
pub async fn get_user_answers_bulk(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    ValidJson(req): ValidJson<BulkAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let answers = store
        .find_answers(user_id, &req.question_ids, req.mode)
        .await?
        .into_iter()
        .map(|a| (a.question_id, a.choice))
        .collect();

    Ok(Json(BulkAnswersResponse { answers }))
}

/// Summarizes the caller's ledger. Never fails for an existing user with no answers.
pub async fn get_analytics(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let user = store
        .find_user(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;
    let answers = store.list_answers(user_id).await?;

    Ok(Json(Analytics::from_ledger(&answers, user.total_time_consumed)))
}
