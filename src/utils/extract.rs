// src/utils/extract.rs

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;

/// JSON body extractor that parses and validates in one step.
///
/// Both a malformed body and a failed `validator` rule become `AppError::BadRequest`,
/// so every validation failure reaches the client as a 400 with the usual error body.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        value.validate()?;

        Ok(ValidJson(value))
    }
}
