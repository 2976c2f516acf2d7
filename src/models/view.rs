use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::question::Choice;

/// Summary of a session exposed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub set_id: String,
    /// 0-based index of the active question.
    pub question_index: usize,
    pub total_questions: usize,
    pub created_at: DateTime<Utc>,
}

/// The echo returned to a student whose submission was accepted.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub student: String,
    pub option: Choice,
    pub correct: bool,
    pub timestamp: DateTime<Utc>,
    pub question_id: String,
    pub question_text: String,
}

/// One displayed response in the live view.
#[derive(Debug, Clone, Serialize)]
pub struct LiveResponse {
    pub student: String,
    pub option: Choice,
    pub correct: bool,
    pub timestamp: DateTime<Utc>,
}

/// The materialized view of live responses to the active question.
#[derive(Debug, Clone, Serialize)]
pub struct LiveView {
    pub session_id: String,
    pub question_index: usize,
    pub question_id: String,
    pub question_text: String,
    pub total_responses: usize,
    /// Most recent response first.
    pub responses: Vec<LiveResponse>,
}

/// Per-student performance within the session's question set.
#[derive(Debug, Clone, Serialize)]
pub struct StudentPerformance {
    pub score: u32,
    pub total_questions: usize,
    /// `100 * score / total_questions`, `0` for an empty set.
    pub percentage: f64,
}

/// Per-question aggregate across every durable response.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionBreakdown {
    pub question_id: String,
    pub text: String,
    pub correct_choice: Choice,
    pub total_responses: u32,
    pub correct_responses: u32,
    /// Share of correct responses in percent, `0` with no responses.
    pub correct_rate: f64,
}

/// Overall statistics for the analysis view.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisTotals {
    pub student_count: usize,
    pub response_count: usize,
    pub average_score: f64,
    pub average_percentage: f64,
}

/// The end-of-quiz analysis, recomputed from durable responses.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisView {
    pub per_student: BTreeMap<String, StudentPerformance>,
    pub per_question: Vec<QuestionBreakdown>,
    pub totals: AnalysisTotals,
}
