use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::question::Choice;

/// One accepted response, in arrival order.
#[derive(Debug, Clone)]
pub struct AcceptedEntry {
    pub student: String,
    pub choice: Choice,
    pub correct: bool,
    pub at: DateTime<Utc>,
}

/// Per-question deduplicated collection of student responses.
///
/// The duplicate check scans every bucket: a student who answered B must not
/// be allowed to also answer C.
#[derive(Debug)]
pub struct ResponseLedger {
    buckets: BTreeMap<Choice, Vec<String>>,
    accepted: Vec<AcceptedEntry>,
}

impl ResponseLedger {
    pub fn new() -> Self {
        let mut buckets = BTreeMap::new();
        for choice in Choice::ALL {
            buckets.insert(choice, Vec::new());
        }
        Self {
            buckets,
            accepted: Vec::new(),
        }
    }

    /// Records a response and decides its correctness. This is the single
    /// authoritative point for scoring and for the durable record written
    /// afterwards.
    pub fn submit(
        &mut self,
        student: &str,
        choice: Choice,
        correct_choice: Choice,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        if self.contains(student) {
            return Err(AppError::Conflict(format!(
                "Student '{student}' has already responded to this question"
            )));
        }

        let correct = choice == correct_choice;
        self.buckets
            .entry(choice)
            .or_default()
            .push(student.to_string());
        self.accepted.push(AcceptedEntry {
            student: student.to_string(),
            choice,
            correct,
            at: now,
        });
        Ok(correct)
    }

    /// Whether a student already appears under any option.
    pub fn contains(&self, student: &str) -> bool {
        self.buckets
            .values()
            .any(|bucket| bucket.iter().any(|s| s == student))
    }

    /// A point-in-time owned copy of the option buckets.
    pub fn snapshot(&self) -> BTreeMap<Choice, Vec<String>> {
        self.buckets.clone()
    }

    /// Accepted responses in arrival order.
    pub fn entries(&self) -> Vec<AcceptedEntry> {
        self.accepted.clone()
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

impl Default for ResponseLedger {
    fn default() -> Self {
        Self::new()
    }
}
