use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;

use crate::engine::aggregator;
use crate::engine::broadcast::SessionEvent;
use crate::engine::registry::LiveSession;
use crate::error::{AppError, Result};
use crate::models::response::ResponseRecord;
use crate::models::view::{AnalysisView, LiveView, SessionInfo, SubmitOutcome};
use crate::state::AppState;
use crate::store;
use crate::validation::quiz as validation;

fn session_info(session: &LiveSession) -> SessionInfo {
    SessionInfo {
        session_id: session.id.clone(),
        set_id: session.set_id.clone(),
        question_index: session.current_index(),
        total_questions: session.question_count(),
        created_at: session.created_at,
    }
}

/// Starts a new quiz session from a stored question set and makes it current.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `set_id` - The question set to snapshot into the session.
///
/// # Returns
///
/// A `Result` containing the new session's `SessionInfo`.
pub async fn start_session(state: &AppState, set_id: &str) -> Result<SessionInfo> {
    validation::validate_set_id(set_id)?;

    // The question set is snapshotted here and never re-read.
    let questions = store::with_timeout(
        state.config.store_timeout(),
        state.store.get_question_set(set_id),
    )
    .await?
    .ok_or(AppError::NotFound)?;

    let session = state.registry.start_session(set_id, questions).await?;
    tracing::info!(
        session_id = %session.id,
        set_id,
        total_questions = session.question_count(),
        "quiz session started"
    );
    Ok(session_info(&session))
}

/// The current session, or `NotFound` when none is live.
pub async fn current_session(state: &AppState) -> Result<SessionInfo> {
    let session = state
        .registry
        .current_session()
        .await
        .ok_or(AppError::NotFound)?;
    Ok(session_info(&session))
}

/// Moves the current session to its next question.
pub async fn advance(state: &AppState, session_id: &str) -> Result<usize> {
    let index = state.registry.advance(session_id).await?;
    tracing::info!(session_id, question_index = index, "advanced to next question");
    Ok(index)
}

/// Ingests one student response for the active question.
///
/// The in-memory accept decision is authoritative. The durable append runs
/// in the background; its failure is logged and never reverses an acceptance.
pub async fn submit(state: &AppState, student: &str, option: &str) -> Result<SubmitOutcome> {
    let choice = validation::parse_choice(option)?;
    let student = validation::normalize_student(student)?;

    let session = state
        .registry
        .current_session()
        .await
        .ok_or(AppError::NotFound)?;

    let slot = session.current_slot();
    let question = &slot.question;
    let now = Utc::now();

    // Atomic duplicate-check-then-append. The lock never spans an await.
    let correct = {
        let mut ledger = slot.ledger.lock().unwrap();
        ledger.submit(&student, choice, question.correct, now)?
    };

    if correct {
        let score = session.record_point(&student);
        tracing::debug!(student = %student, score, "correct response");
    }

    // Fan-out happens outside the ledger lock and never waits for delivery.
    session.events.publish(SessionEvent::ResponseAccepted {
        question_id: question.id.clone(),
    });

    // Durability path: fire and forget, bounded by the store timeout.
    let record = ResponseRecord {
        set_id: session.set_id.clone(),
        question_id: question.id.clone(),
        student: student.clone(),
        answer: choice,
        is_correct: correct,
        timestamp: now,
    };
    let store = state.store.clone();
    let timeout = state.config.store_timeout();
    tokio::spawn(async move {
        if let Err(e) = store::with_timeout(timeout, store.append_response(&record)).await {
            tracing::warn!(
                error = %e,
                student = %record.student,
                question_id = %record.question_id,
                "durable write failed; in-memory ledger remains authoritative"
            );
        }
    });

    Ok(SubmitOutcome {
        student,
        option: choice,
        correct,
        timestamp: now,
        question_id: question.id.clone(),
        question_text: question.text.clone(),
    })
}

/// Pull-mode snapshot of the live view for the current session.
pub async fn live_view(state: &AppState) -> Result<LiveView> {
    let session = state
        .registry
        .current_session()
        .await
        .ok_or(AppError::NotFound)?;
    aggregator::live_view(state, &session).await
}

/// End-of-quiz analysis for the current session.
pub async fn analysis_view(state: &AppState) -> Result<AnalysisView> {
    let session = state
        .registry
        .current_session()
        .await
        .ok_or(AppError::NotFound)?;
    aggregator::analysis_view(state, &session).await
}

/// Explicitly deletes a session by id.
pub async fn delete_session(state: &AppState, session_id: &str) -> Result<()> {
    if state.registry.remove(session_id).await {
        tracing::info!(session_id, "quiz session deleted");
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}

/// A push-mode subscription to the current session: the session handle plus
/// a receiver of its events. Dropping the receiver unregisters the observer.
pub async fn subscribe(
    state: &AppState,
) -> Result<(Arc<LiveSession>, broadcast::Receiver<SessionEvent>)> {
    let session = state
        .registry
        .current_session()
        .await
        .ok_or(AppError::NotFound)?;
    let receiver = session.events.subscribe();
    Ok((session, receiver))
}
