// src/routes.rs

use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{admin, auth, content, quiz},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Assembles the main application router.
///
/// * Nests every sub-router under `/api`; only signup, login, password recovery and
///   `/health` are public.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store and config).
pub fn create_router(state: AppState) -> Router {
    let auth_layer = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/security-question", get(auth::get_security_question))
        .route("/reset-password", post(auth::reset_password))
        .merge(
            Router::new()
                .route("/update-password", post(auth::update_password))
                .route("/delete-account", delete(auth::delete_account))
                .layer(auth_layer.clone()),
        );

    let quiz_routes = Router::new()
        .route("/daily", get(quiz::get_daily_quiz))
        .route("/daily/start", get(quiz::start_daily_quiz))
        .route("/topics", get(quiz::list_topics))
        .route("/topic/{id}", get(quiz::get_topic))
        .route("/answer", post(quiz::submit_answer))
        .route("/user-answer", get(quiz::get_user_answer))
        .route("/user-answers-bulk", post(quiz::get_user_answers_bulk))
        .route("/analytics", get(quiz::get_analytics))
        .layer(auth_layer.clone());

    let content_routes = Router::new()
        .route("/papers", get(content::list_papers))
        .route("/papers/search", get(content::search_papers))
        .route("/channels", get(content::list_channels))
        .route("/apps", get(content::list_apps))
        .route("/help", get(content::get_help))
        .layer(auth_layer.clone());

    let admin_routes = Router::new()
        .route(
            "/quiz/daily",
            get(admin::get_daily_quiz).post(admin::create_daily_quiz),
        )
        .route(
            "/quiz/daily/{id}",
            put(admin::update_daily_quiz).delete(admin::delete_daily_quiz),
        )
        .route("/quiz/topic", post(admin::create_topic))
        .route(
            "/quiz/topic/{id}",
            get(admin::get_topic).delete(admin::delete_topic),
        )
        .route("/quiz/topic/{id}/question", post(admin::add_question))
        .route(
            "/quiz/topic/{id}/question/{question_id}",
            put(admin::update_question).delete(admin::delete_question),
        )
        .route("/papers", post(admin::create_paper))
        .route(
            "/papers/{id}",
            put(admin::update_paper).delete(admin::delete_paper),
        )
        .route("/channels", post(admin::create_channel))
        .route(
            "/channels/{id}",
            put(admin::update_channel).delete(admin::delete_channel),
        )
        .route("/apps", post(admin::create_app))
        .route("/apps/{id}", put(admin::update_app).delete(admin::delete_app))
        .route("/help", post(admin::create_help))
        .route("/help/{id}", put(admin::update_help).delete(admin::delete_help))
        // Auth runs first (outermost), then the admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(auth_layer);

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/quiz", quiz_routes)
        .nest("/admin", admin_routes)
        .merge(content_routes);

    Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .nest("/api", api)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
