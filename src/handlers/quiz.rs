use std::convert::Infallible;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
};
use futures::stream::Stream;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use crate::{
    engine::aggregator,
    engine::broadcast::SessionEvent,
    error::Result,
    services::quiz as quiz_service,
    state::AppState,
};

/// The request payload for advancing the current session.
#[derive(Deserialize)]
pub struct AdvanceRequest {
    pub session_id: String,
}

/// The request payload for a student response.
#[derive(Deserialize)]
pub struct SubmitRequest {
    pub student: String,
    pub option: String,
}

/// Starts a quiz session from a question set.
#[axum::debug_handler]
pub async fn start_quiz(
    State(state): State<AppState>,
    Path(set_id): Path<String>,
) -> Result<Response> {
    let info = quiz_service::start_session(&state, &set_id).await?;

    let response = sonic_rs::to_string(&info).unwrap();
    Ok((StatusCode::CREATED, response).into_response())
}

/// Returns the current session, if any.
#[axum::debug_handler]
pub async fn current_session(State(state): State<AppState>) -> Result<Response> {
    let info = quiz_service::current_session(&state).await?;
    Ok((StatusCode::OK, sonic_rs::to_string(&info).unwrap()).into_response())
}

/// Advances the current session to its next question.
#[axum::debug_handler]
pub async fn advance(
    State(state): State<AppState>,
    Json(req): Json<AdvanceRequest>,
) -> Result<Response> {
    let index = quiz_service::advance(&state, &req.session_id).await?;

    let response = sonic_rs::to_string(&sonic_rs::json!({
        "session_id": req.session_id,
        "question_index": index
    }))
    .unwrap();
    Ok((StatusCode::OK, response).into_response())
}

/// Ingests one student response for the active question.
#[axum::debug_handler]
pub async fn submit(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> Result<Response> {
    let outcome = quiz_service::submit(&state, &req.student, &req.option).await?;
    Ok((StatusCode::OK, sonic_rs::to_string(&outcome).unwrap()).into_response())
}

/// Pull mode: a stateless snapshot of the live view. Safe to poll.
#[axum::debug_handler]
pub async fn live(State(state): State<AppState>) -> Result<Response> {
    let view = quiz_service::live_view(&state).await?;
    Ok((StatusCode::OK, sonic_rs::to_string(&view).unwrap()).into_response())
}

/// Push mode: an SSE stream that sends the live view on connect and again on
/// every accepted response or question change. A slow observer that lags the
/// event channel coalesces to the next full view; it never backs up
/// ingestion.
pub async fn live_stream(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let (session, receiver) = quiz_service::subscribe(&state).await?;

    let stream = futures::stream::unfold(
        (state, session, receiver, false),
        |(state, session, mut receiver, mut sent_initial)| async move {
            loop {
                if sent_initial {
                    match receiver.recv().await {
                        Ok(SessionEvent::SessionEnded) => return None,
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, "observer lagged; coalescing missed updates");
                        }
                        Err(RecvError::Closed) => return None,
                    }
                } else {
                    sent_initial = true;
                }

                match aggregator::live_view(&state, &session).await {
                    Ok(view) => {
                        let event = Event::default()
                            .event("live")
                            .data(sonic_rs::to_string(&view).unwrap());
                        return Some((Ok(event), (state, session, receiver, sent_initial)));
                    }
                    Err(e) => {
                        // Keep the subscription alive; retry on the next event.
                        tracing::warn!(error = %e, "failed to build live view for stream");
                    }
                }
            }
        },
    );

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// End-of-quiz analysis for the current session.
#[axum::debug_handler]
pub async fn analysis(State(state): State<AppState>) -> Result<Response> {
    let view = quiz_service::analysis_view(&state).await?;
    Ok((StatusCode::OK, sonic_rs::to_string(&view).unwrap()).into_response())
}

/// Deletes a session by id.
#[axum::debug_handler]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response> {
    quiz_service::delete_session(&state, &session_id).await?;
    Ok((StatusCode::OK, r#"{"message":"Session deleted successfully"}"#).into_response())
}

/// Registry state, for debugging.
#[axum::debug_handler]
pub async fn debug_state(State(state): State<AppState>) -> Result<Response> {
    let (current, sessions) = state.registry.debug_snapshot().await;

    let response = sonic_rs::to_string(&sonic_rs::json!({
        "current_session_id": current,
        "active_sessions": sessions
    }))
    .unwrap();
    Ok((StatusCode::OK, response).into_response())
}
