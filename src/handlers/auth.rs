// src/handlers/auth.rs

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    config::Config,
    error::AppError,
    models::user::{
        LoginRequest, LoginResponse, NewUser, ROLE_USER, ResetPasswordRequest,
        SecurityQuestionQuery, SignupRequest, UpdatePasswordRequest, UserSummary,
        normalize_email, normalize_security_answer,
    },
    store::SharedStore,
    utils::{
        extract::ValidJson,
        hash::{hash_password, verify_password},
        jwt::{Claims, sign_jwt},
    },
};

/// Registers a new user.
///
/// Hashes the password and the normalized security answer with Argon2.
/// Returns 201 Created, or 409 when the email is already registered.
pub async fn signup(
    State(store): State<SharedStore>,
    ValidJson(payload): ValidJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = normalize_email(&payload.email);

    let new_user = NewUser {
        fullname: payload.fullname.trim().to_string(),
        email: email.clone(),
        password_hash: hash_password(&payload.password)?,
        security_question: payload.security_question.trim().to_string(),
        security_answer_hash: hash_password(&normalize_security_answer(
            &payload.security_answer,
        ))?,
        role: ROLE_USER.to_string(),
    };

    let user = store.create_user(new_user).await?;
    tracing::info!("Registered user {} ({})", user.id, email);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

/// Authenticates a user and returns a JWT token.
pub async fn login(
    State(store): State<SharedStore>,
    State(config): State<Config>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = store
        .find_user_by_email(&normalize_email(&payload.email))
        .await?
        .ok_or(AppError::AuthError("Invalid email or password".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid email or password".to_string()));
    }

    let token = sign_jwt(
        user.id,
        &user.email,
        &user.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        user: UserSummary::from(&user),
    }))
}

pub async fn get_security_question(
    State(store): State<SharedStore>,
    Query(query): Query<SecurityQuestionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user = store
        .find_user_by_email(&normalize_email(&query.email))
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({ "securityQuestion": user.security_question })))
}

/// Resets a forgotten password after checking the security question and answer.
pub async fn reset_password(
    State(store): State<SharedStore>,
    ValidJson(payload): ValidJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = store
        .find_user_by_email(&normalize_email(&payload.email))
        .await?
        .filter(|u| u.security_question == payload.security_question.trim())
        .ok_or(AppError::NotFound(
            "No account matches this email and security question".to_string(),
        ))?;

    let answer = normalize_security_answer(&payload.security_answer);
    if !verify_password(&answer, &user.security_answer)? {
        return Err(AppError::AuthError("Incorrect security answer".to_string()));
    }

    let password_hash = hash_password(&payload.new_password)?;
    if !store.update_password(user.id, &password_hash).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!("Password reset for user {}", user.id);
    Ok(Json(json!({ "message": "Password reset successfully" })))
}

pub async fn update_password(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    ValidJson(payload): ValidJson<UpdatePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let user = store
        .find_user(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    if !verify_password(&payload.current_password, &user.password)? {
        return Err(AppError::AuthError("Current password is incorrect".to_string()));
    }

    let password_hash = hash_password(&payload.new_password)?;
    store.update_password(user_id, &password_hash).await?;

    Ok(Json(json!({ "message": "Password updated successfully" })))
}

/// Deletes the caller's account together with its answer ledger.
pub async fn delete_account(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    if !store.delete_user(user_id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!("Deleted account {}", user_id);
    Ok(Json(json!({ "message": "Account deleted successfully" })))
}
