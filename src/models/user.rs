// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{error::AppError, utils::hash::hash_password};

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// Represents a user account. The answer ledger lives alongside it in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    pub fullname: String,

    /// Unique, trimmed and lower-cased.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub security_question: String,

    /// Argon2 hash of the normalized security answer.
    #[serde(skip)]
    pub security_answer: String,

    /// User role: 'user' or 'admin'.
    pub role: String,

    /// Running sum of seconds spent on answered questions.
    pub total_time_consumed: u64,

    pub created_at: DateTime<Utc>,
}

/// Account fields ready for insertion: already normalized and hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub fullname: String,
    pub email: String,
    pub password_hash: String,
    pub security_question: String,
    pub security_answer_hash: String,
    pub role: String,
}

impl NewUser {
    pub fn into_user(self) -> User {
        User {
            id: Uuid::new_v4(),
            fullname: self.fullname,
            email: self.email,
            password: self.password_hash,
            security_question: self.security_question,
            security_answer: self.security_answer_hash,
            role: self.role,
            total_time_consumed: 0,
            created_at: Utc::now(),
        }
    }
}

impl NewUser {
    /// Admin account created from configuration at start-up.
    ///
    /// The security answer is random and never revealed, so password recovery is
    /// closed for this account.
    pub fn seeded_admin(email: &str, password: &str) -> Result<Self, AppError> {
        Ok(Self {
            fullname: "Administrator".to_string(),
            email: normalize_email(email),
            password_hash: hash_password(password)?,
            security_question: "Recovery disabled for the seeded admin".to_string(),
            security_answer_hash: hash_password(&Uuid::new_v4().to_string())?,
            role: ROLE_ADMIN.to_string(),
        })
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Security answers are compared case-insensitively.
pub fn normalize_security_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// Strips surrounding whitespace before validation sees the value.
fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().to_string())
}

/// DTO for creating a new user (Signup).
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Full name length must be between 1 and 100 characters."
    ))]
    pub fullname: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub password: String,
    #[validate(length(min = 1, max = 200))]
    pub security_question: String,
    #[validate(length(min = 1, max = 200))]
    pub security_answer: String,
}

/// DTO for user login.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SecurityQuestionQuery {
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 200))]
    pub security_question: String,
    #[validate(length(min = 1, max = 200))]
    pub security_answer: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 1, max = 128))]
    pub current_password: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub new_password: String,
}

/// Public part of the account returned at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub role: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            fullname: user.fullname.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub user: UserSummary,
}
