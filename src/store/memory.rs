use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::question::Question;
use crate::models::response::{ResponseFilter, ResponseRecord};
use crate::store::ResponseStore;

/// In-memory store used when no `DATABASE_URL` is configured, and in tests.
/// Records live only as long as the process.
#[derive(Default)]
pub struct MemoryStore {
    question_sets: Mutex<HashMap<String, Vec<Question>>>,
    responses: Mutex<Vec<ResponseRecord>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a question set under the given id.
    pub fn seed_question_set(&self, set_id: &str, questions: Vec<Question>) {
        self.question_sets
            .lock()
            .unwrap()
            .insert(set_id.to_string(), questions);
    }

    /// Simulates a store outage: every call fails with `StoreUnavailable`
    /// until the store is brought back online.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable(
                "memory store is offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ResponseStore for MemoryStore {
    async fn append_response(&self, record: &ResponseRecord) -> Result<()> {
        self.check_online()?;
        self.responses.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn scan_responses(&self, filter: &ResponseFilter) -> Result<Vec<ResponseRecord>> {
        self.check_online()?;
        let mut matches: Vec<ResponseRecord> = self
            .responses
            .lock()
            .unwrap()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(matches)
    }

    async fn get_question_set(&self, set_id: &str) -> Result<Option<Vec<Question>>> {
        self.check_online()?;
        Ok(self.question_sets.lock().unwrap().get(set_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::Choice;
    use chrono::Utc;

    fn record(student: &str, question_id: &str) -> ResponseRecord {
        ResponseRecord {
            set_id: "set-1".to_string(),
            question_id: question_id.to_string(),
            student: student.to_string(),
            answer: Choice::A,
            is_correct: true,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn scan_applies_filter() {
        let store = MemoryStore::new();
        store.append_response(&record("alice", "q1")).await.unwrap();
        store.append_response(&record("bob", "q2")).await.unwrap();

        let hits = store
            .scan_responses(&ResponseFilter::for_question("q1"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].student, "alice");
    }

    #[tokio::test]
    async fn offline_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_offline(true);

        let err = store.append_response(&record("alice", "q1")).await.unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));

        store.set_offline(false);
        store.append_response(&record("alice", "q1")).await.unwrap();
    }
}
