// src/handlers/content.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    models::content::PaperSearchQuery,
    store::SharedStore,
};

/// Lists all papers, newest first.
pub async fn list_papers(State(store): State<SharedStore>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(store.list_papers().await?))
}

/// Case-insensitive substring search on the paper's topic name.
/// An empty query lists everything.
pub async fn search_papers(
    State(store): State<SharedStore>,
    Query(query): Query<PaperSearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let needle = query.q.trim();
    let papers = if needle.is_empty() {
        store.list_papers().await?
    } else {
        store.search_papers(needle).await?
    };

    Ok(Json(papers))
}

pub async fn list_channels(
    State(store): State<SharedStore>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(store.list_channels().await?))
}

pub async fn list_apps(State(store): State<SharedStore>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(store.list_apps().await?))
}

/// Returns the current help document, or `{}` when none was uploaded.
pub async fn get_help(State(store): State<SharedStore>) -> Result<impl IntoResponse, AppError> {
    let help = match store.current_help().await? {
        Some(help) => serde_json::to_value(help)?,
        None => json!({}),
    };

    Ok(Json(help))
}
