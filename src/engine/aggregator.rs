use std::collections::{BTreeMap, HashMap, HashSet};

use crate::engine::registry::LiveSession;
use crate::error::Result;
use crate::models::response::{ResponseFilter, ResponseRecord};
use crate::models::view::{
    AnalysisTotals, AnalysisView, LiveResponse, LiveView, QuestionBreakdown, StudentPerformance,
};
use crate::state::AppState;
use crate::store;

/// Materializes the live view of the active question.
///
/// Two-tier read: the in-memory ledger is authoritative for participation and
/// correctness (a just-accepted response is visible before its durable write
/// lands), while the durable store is authoritative for timestamps and for
/// recovery after a restart. A store failure degrades to the memory-only
/// view with a warning; it is never an error to the caller.
pub async fn live_view(state: &AppState, session: &LiveSession) -> Result<LiveView> {
    let index = session.current_index();
    let slot = &session.slots()[index];
    let question = &slot.question;

    let entries = slot.ledger.lock().unwrap().entries();

    let filter = ResponseFilter::for_question(&question.id);
    let stored = match store::with_timeout(
        state.config.store_timeout(),
        state.store.scan_responses(&filter),
    )
    .await
    {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(
                error = %e,
                question_id = %question.id,
                "store scan failed; serving live view from memory only"
            );
            Vec::new()
        }
    };

    // Latest durable row per student; older rows are stale duplicates.
    let mut latest_stored: HashMap<String, ResponseRecord> = HashMap::new();
    for record in stored {
        match latest_stored.get(&record.student) {
            Some(existing) if existing.timestamp >= record.timestamp => {}
            _ => {
                latest_stored.insert(record.student.clone(), record);
            }
        }
    }

    let mut responses = Vec::with_capacity(entries.len());
    let mut seen: HashSet<String> = HashSet::new();
    for entry in &entries {
        let timestamp = latest_stored
            .get(&entry.student)
            .map_or(entry.at, |record| record.timestamp);
        seen.insert(entry.student.clone());
        responses.push(LiveResponse {
            student: entry.student.clone(),
            option: entry.choice,
            correct: entry.correct,
            timestamp,
        });
    }

    // Students only present durably, e.g. after a restart emptied the ledger.
    for (student, record) in latest_stored {
        if !seen.contains(&student) {
            responses.push(LiveResponse {
                student,
                option: record.answer,
                correct: record.is_correct,
                timestamp: record.timestamp,
            });
        }
    }

    responses.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    Ok(LiveView {
        session_id: session.id.clone(),
        question_index: index,
        question_id: question.id.clone(),
        question_text: question.text.clone(),
        total_responses: responses.len(),
        responses,
    })
}

/// Builds the end-of-quiz analysis.
///
/// Scores are recomputed from durable rows rather than trusted from the
/// volatile scoreboard, so analysis stays correct across process restarts.
/// The student universe is the union of scoreboard entries and every student
/// with a durable response for the session's set.
pub async fn analysis_view(state: &AppState, session: &LiveSession) -> Result<AnalysisView> {
    let total_questions = session.question_count();

    let filter = ResponseFilter::for_set(&session.set_id);
    let stored = store::with_timeout(
        state.config.store_timeout(),
        state.store.scan_responses(&filter),
    )
    .await?;

    let mut students: HashSet<String> = HashSet::new();
    let mut correct_counts: HashMap<String, u32> = HashMap::new();
    let mut per_question_counts: HashMap<String, (u32, u32)> = HashMap::new();

    for record in &stored {
        students.insert(record.student.clone());
        let counters = per_question_counts
            .entry(record.question_id.clone())
            .or_default();
        counters.0 += 1;
        if record.is_correct {
            counters.1 += 1;
            *correct_counts.entry(record.student.clone()).or_default() += 1;
        }
    }

    // Scoreboard-only students (durable write lagging or failed) still show
    // up, with whatever the store can vouch for.
    for student in session.scoreboard().into_keys() {
        students.insert(student);
    }

    let mut per_student: BTreeMap<String, StudentPerformance> = BTreeMap::new();
    for student in &students {
        let score = correct_counts.get(student).copied().unwrap_or(0);
        per_student.insert(
            student.clone(),
            StudentPerformance {
                score,
                total_questions,
                percentage: percentage(score, total_questions),
            },
        );
    }

    let per_question: Vec<QuestionBreakdown> = session
        .slots()
        .iter()
        .map(|slot| {
            let (total, correct) = per_question_counts
                .get(&slot.question.id)
                .copied()
                .unwrap_or((0, 0));
            QuestionBreakdown {
                question_id: slot.question.id.clone(),
                text: slot.question.text.clone(),
                correct_choice: slot.question.correct,
                total_responses: total,
                correct_responses: correct,
                correct_rate: rate(correct, total),
            }
        })
        .collect();

    let student_count = students.len();
    let denominator = student_count.max(1) as f64;
    let average_score =
        per_student.values().map(|p| f64::from(p.score)).sum::<f64>() / denominator;
    let average_percentage =
        per_student.values().map(|p| p.percentage).sum::<f64>() / denominator;

    Ok(AnalysisView {
        per_student,
        per_question,
        totals: AnalysisTotals {
            student_count,
            response_count: stored.len(),
            average_score,
            average_percentage,
        },
    })
}

/// `100 * score / total`, `0` for an empty set. Never divides by zero.
fn percentage(score: u32, total_questions: usize) -> f64 {
    if total_questions == 0 {
        return 0.0;
    }
    f64::from(score) * 100.0 / total_questions as f64
}

/// Share of correct responses in percent, `0` with no responses.
fn rate(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(correct) * 100.0 / f64::from(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_of_empty_set_is_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(3, 0), 0.0);
    }

    #[test]
    fn percentage_is_score_over_total() {
        assert_eq!(percentage(1, 2), 50.0);
        assert_eq!(percentage(3, 4), 75.0);
    }

    #[test]
    fn rate_of_unanswered_question_is_zero() {
        assert_eq!(rate(0, 0), 0.0);
        assert_eq!(rate(2, 4), 50.0);
    }
}
