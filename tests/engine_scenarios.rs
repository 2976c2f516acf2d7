use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use classpulse::config::Config;
use classpulse::engine::broadcast::SessionEvent;
use classpulse::error::AppError;
use classpulse::models::question::{Choice, Question};
use classpulse::models::response::ResponseRecord;
use classpulse::services::quiz;
use classpulse::state::AppState;
use classpulse::store::ResponseStore;
use classpulse::store::memory::MemoryStore;

fn question(id: &str, correct: Choice) -> Question {
    Question {
        id: id.to_string(),
        text: format!("Question {id}"),
        options: [
            "one".to_string(),
            "two".to_string(),
            "three".to_string(),
            "four".to_string(),
        ],
        correct,
    }
}

/// State over a memory store seeded with a two-question set:
/// Q1 correct = A, Q2 correct = B.
fn test_state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    store.seed_question_set(
        "set-1",
        vec![question("q1", Choice::A), question("q2", Choice::B)],
    );
    let state = AppState::with_store(Config::default(), store.clone());
    (state, store)
}

/// Gives spawned durable writes a chance to land.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn full_quiz_scenario_scores_match_durable_truth() {
    let (state, _store) = test_state();
    let info = quiz::start_session(&state, "set-1").await.unwrap();
    assert_eq!(info.question_index, 0);
    assert_eq!(info.total_questions, 2);

    // Q1: alice answers A, which is correct.
    let outcome = quiz::submit(&state, "alice", "A").await.unwrap();
    assert!(outcome.correct);
    assert_eq!(outcome.question_id, "q1");

    // A second answer from alice for Q1 is a conflict, whatever the option.
    let err = quiz::submit(&state, "alice", "B").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Q2: alice answers C, which is wrong.
    quiz::advance(&state, &info.session_id).await.unwrap();
    let outcome = quiz::submit(&state, "alice", "C").await.unwrap();
    assert!(!outcome.correct);
    assert_eq!(outcome.question_id, "q2");

    settle().await;

    let analysis = quiz::analysis_view(&state).await.unwrap();
    let alice = &analysis.per_student["alice"];
    assert_eq!(alice.score, 1);
    assert_eq!(alice.total_questions, 2);
    assert_eq!(alice.percentage, 50.0);
    assert_eq!(analysis.totals.student_count, 1);
    assert_eq!(analysis.totals.response_count, 2);
}

#[tokio::test]
async fn concurrent_duplicate_submissions_accept_exactly_one() {
    let (state, _store) = test_state();
    quiz::start_session(&state, "set-1").await.unwrap();

    let first = {
        let state = state.clone();
        tokio::spawn(async move { quiz::submit(&state, "bob", "A").await })
    };
    let second = {
        let state = state.clone();
        tokio::spawn(async move { quiz::submit(&state, "bob", "D").await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let accepted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(AppError::Conflict(_)))));
}

#[tokio::test]
async fn starting_an_empty_set_leaves_no_session_behind() {
    let (state, store) = test_state();
    store.seed_question_set("empty", Vec::new());

    let err = quiz::start_session(&state, "empty").await.unwrap_err();
    assert!(matches!(err, AppError::EmptyQuestionSet));
    assert!(matches!(
        quiz::current_session(&state).await.unwrap_err(),
        AppError::NotFound
    ));
}

#[tokio::test]
async fn starting_an_unknown_set_is_not_found() {
    let (state, _store) = test_state();
    let err = quiz::start_session(&state, "missing").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn invalid_option_and_blank_student_are_invalid_input() {
    let (state, _store) = test_state();
    quiz::start_session(&state, "set-1").await.unwrap();

    assert!(matches!(
        quiz::submit(&state, "carol", "E").await.unwrap_err(),
        AppError::InvalidInput(_)
    ));
    assert!(matches!(
        quiz::submit(&state, "   ", "A").await.unwrap_err(),
        AppError::InvalidInput(_)
    ));

    // Lower case with whitespace is normalized, not rejected.
    let outcome = quiz::submit(&state, " carol ", " a ").await.unwrap();
    assert_eq!(outcome.student, "carol");
    assert_eq!(outcome.option, Choice::A);
}

#[tokio::test]
async fn live_view_shows_a_submission_before_its_durable_write_lands() {
    let (state, store) = test_state();
    quiz::start_session(&state, "set-1").await.unwrap();

    // Take the store down: the append fails in the background and the scan
    // falls back to memory.
    store.set_offline(true);
    quiz::submit(&state, "alice", "A").await.unwrap();

    let view = quiz::live_view(&state).await.unwrap();
    assert_eq!(view.total_responses, 1);
    assert_eq!(view.responses[0].student, "alice");
    assert!(view.responses[0].correct);
}

#[tokio::test]
async fn live_view_prefers_store_timestamps_and_drops_stale_duplicates() {
    let (state, store) = test_state();
    quiz::start_session(&state, "set-1").await.unwrap();

    // Stale durable data: two rows for the same student. Only the latest
    // must be displayed.
    let early = Utc::now() - chrono::Duration::minutes(10);
    let late = Utc::now() - chrono::Duration::minutes(1);
    for (at, answer) in [(early, Choice::B), (late, Choice::C)] {
        store
            .append_response(&ResponseRecord {
                set_id: "set-1".to_string(),
                question_id: "q1".to_string(),
                student: "ghost".to_string(),
                answer,
                is_correct: false,
                timestamp: at,
            })
            .await
            .unwrap();
    }

    let view = quiz::live_view(&state).await.unwrap();
    assert_eq!(view.total_responses, 1);
    assert_eq!(view.responses[0].option, Choice::C);
    assert_eq!(view.responses[0].timestamp, late);
}

#[tokio::test]
async fn analysis_recovers_from_the_store_after_a_restart() {
    let store = Arc::new(MemoryStore::new());
    store.seed_question_set(
        "set-1",
        vec![question("q1", Choice::A), question("q2", Choice::B)],
    );
    store
        .append_response(&ResponseRecord {
            set_id: "set-1".to_string(),
            question_id: "q1".to_string(),
            student: "alice".to_string(),
            answer: Choice::A,
            is_correct: true,
            timestamp: Utc::now(),
        })
        .await
        .unwrap();

    // A fresh process: empty registry and ledgers, same durable store.
    let state = AppState::with_store(Config::default(), store.clone());
    quiz::start_session(&state, "set-1").await.unwrap();

    let view = quiz::live_view(&state).await.unwrap();
    assert_eq!(view.total_responses, 1);
    assert_eq!(view.responses[0].student, "alice");

    let analysis = quiz::analysis_view(&state).await.unwrap();
    assert_eq!(analysis.per_student["alice"].score, 1);
    assert_eq!(analysis.per_question[0].correct_responses, 1);
}

#[tokio::test]
async fn scoreboard_only_students_still_appear_in_analysis() {
    let (state, store) = test_state();
    quiz::start_session(&state, "set-1").await.unwrap();

    // The durable write fails, but the in-memory acceptance stands.
    store.set_offline(true);
    quiz::submit(&state, "alice", "A").await.unwrap();
    settle().await;
    store.set_offline(false);

    let analysis = quiz::analysis_view(&state).await.unwrap();
    let alice = &analysis.per_student["alice"];
    // The store has no rows to vouch for the point.
    assert_eq!(alice.score, 0);
    assert_eq!(analysis.totals.student_count, 1);
}

#[tokio::test]
async fn analysis_without_a_store_is_store_unavailable() {
    let (state, store) = test_state();
    quiz::start_session(&state, "set-1").await.unwrap();

    store.set_offline(true);
    let err = quiz::analysis_view(&state).await.unwrap_err();
    assert!(matches!(err, AppError::StoreUnavailable(_)));

    // The session itself is unaffected and recovers with the store.
    store.set_offline(false);
    quiz::analysis_view(&state).await.unwrap();
}

#[tokio::test]
async fn submit_and_advance_publish_events_to_observers() {
    let (state, _store) = test_state();
    let info = quiz::start_session(&state, "set-1").await.unwrap();

    let (_session, mut receiver) = quiz::subscribe(&state).await.unwrap();
    let (_session2, dropped) = quiz::subscribe(&state).await.unwrap();
    drop(dropped);

    quiz::submit(&state, "alice", "A").await.unwrap();
    match receiver.try_recv().unwrap() {
        SessionEvent::ResponseAccepted { question_id } => assert_eq!(question_id, "q1"),
        other => panic!("unexpected event: {other:?}"),
    }

    quiz::advance(&state, &info.session_id).await.unwrap();
    match receiver.try_recv().unwrap() {
        SessionEvent::QuestionAdvanced { index } => assert_eq!(index, 1),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn deleting_the_current_session_ends_it_for_observers() {
    let (state, _store) = test_state();
    let info = quiz::start_session(&state, "set-1").await.unwrap();
    let (_session, mut receiver) = quiz::subscribe(&state).await.unwrap();

    quiz::delete_session(&state, &info.session_id).await.unwrap();
    assert!(matches!(
        receiver.try_recv().unwrap(),
        SessionEvent::SessionEnded
    ));
    assert!(matches!(
        quiz::current_session(&state).await.unwrap_err(),
        AppError::NotFound
    ));
    assert!(matches!(
        quiz::delete_session(&state, &info.session_id).await.unwrap_err(),
        AppError::NotFound
    ));
}

#[tokio::test]
async fn live_view_serializes_with_expected_shape() {
    let (state, _store) = test_state();
    quiz::start_session(&state, "set-1").await.unwrap();
    quiz::submit(&state, "alice", "D").await.unwrap();

    let view = quiz::live_view(&state).await.unwrap();
    let value = serde_json::to_value(&view).unwrap();
    assert_eq!(value["question_id"], "q1");
    assert_eq!(value["total_responses"], 1);
    assert_eq!(value["responses"][0]["student"], "alice");
    assert_eq!(value["responses"][0]["option"], "D");
    assert_eq!(value["responses"][0]["correct"], false);
}
