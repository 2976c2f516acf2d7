use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::question::Choice;

/// A durable response record. Append-only; the engine never mutates or
/// deletes one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// The question set the response belongs to.
    pub set_id: String,
    /// The question the response answers.
    pub question_id: String,
    /// The student's display name.
    pub student: String,
    /// The chosen option.
    pub answer: Choice,
    /// Whether the answer matched the correct option at ingestion time.
    pub is_correct: bool,
    /// When the response was accepted.
    pub timestamp: DateTime<Utc>,
}

/// A filter for scanning durable responses. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ResponseFilter {
    pub set_id: Option<String>,
    pub question_id: Option<String>,
    pub student: Option<String>,
    pub is_correct: Option<bool>,
}

impl ResponseFilter {
    /// Matches every response to one question.
    pub fn for_question(question_id: &str) -> Self {
        Self {
            question_id: Some(question_id.to_string()),
            ..Self::default()
        }
    }

    /// Matches every response within one question set.
    pub fn for_set(set_id: &str) -> Self {
        Self {
            set_id: Some(set_id.to_string()),
            ..Self::default()
        }
    }

    /// Whether a record passes the filter.
    pub fn matches(&self, record: &ResponseRecord) -> bool {
        self.set_id.as_deref().map_or(true, |v| v == record.set_id)
            && self
                .question_id
                .as_deref()
                .map_or(true, |v| v == record.question_id)
            && self.student.as_deref().map_or(true, |v| v == record.student)
            && self.is_correct.map_or(true, |v| v == record.is_correct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(student: &str, correct: bool) -> ResponseRecord {
        ResponseRecord {
            set_id: "set-1".to_string(),
            question_id: "q1".to_string(),
            student: student.to_string(),
            answer: Choice::A,
            is_correct: correct,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(ResponseFilter::default().matches(&record("alice", true)));
    }

    #[test]
    fn filter_fields_are_conjunctive() {
        let filter = ResponseFilter {
            set_id: Some("set-1".to_string()),
            is_correct: Some(true),
            ..ResponseFilter::default()
        };
        assert!(filter.matches(&record("alice", true)));
        assert!(!filter.matches(&record("alice", false)));
    }
}
