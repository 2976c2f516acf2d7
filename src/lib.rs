//! classpulse — live-quiz session and response-aggregation engine.
//!
//! An instructor starts a quiz from an immutable question set and advances
//! through its questions while students submit answers concurrently.
//! Observers follow the aggregate either by polling or over an SSE stream.
//! The in-memory ledger is the authority for who has answered; the durable
//! store backs analytics and recovery.

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

pub mod config;
pub mod error;
pub mod state;
pub mod store;

pub mod models {
    pub mod question;
    pub mod response;
    pub mod view;
}

pub mod engine {
    pub mod aggregator;
    pub mod broadcast;
    pub mod ledger;
    pub mod registry;
}

pub mod services {
    pub mod quiz;
}

pub mod handlers {
    pub mod quiz;
}

pub mod validation {
    pub mod quiz;
}

use state::AppState;

/// Builds the application router. Serialization to HTTP frames is all that
/// happens here; every decision lives in the services and the engine.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/api/quiz/session", get(handlers::quiz::current_session))
        .route("/api/quiz/{set_id}/start", post(handlers::quiz::start_quiz))
        .route("/api/quiz/advance", post(handlers::quiz::advance))
        .route("/api/quiz/submit", post(handlers::quiz::submit))
        .route("/api/quiz/live", get(handlers::quiz::live))
        .route("/api/quiz/live/stream", get(handlers::quiz::live_stream))
        .route("/api/quiz/analysis", get(handlers::quiz::analysis))
        .route(
            "/api/quiz/session/{session_id}",
            delete(handlers::quiz::delete_session),
        )
        .route("/api/debug", get(handlers::quiz::debug_state))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
