use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::engine::broadcast::{EventHub, SessionEvent};
use crate::engine::ledger::ResponseLedger;
use crate::error::{AppError, Result};
use crate::models::question::Question;

/// A question snapshotted into a session, together with its ledger. The
/// question itself never changes after session start, so an in-flight submit
/// always observes a consistent `(question, correct)` pair.
#[derive(Debug)]
pub struct QuestionSlot {
    pub question: Question,
    pub ledger: Mutex<ResponseLedger>,
}

/// One live quiz run. Questions are fixed at creation; only the index, the
/// ledgers and the scoreboard mutate afterwards.
#[derive(Debug)]
pub struct LiveSession {
    pub id: String,
    pub set_id: String,
    pub created_at: DateTime<Utc>,
    questions: Vec<QuestionSlot>,
    current_index: AtomicUsize,
    scores: Mutex<HashMap<String, u32>>,
    /// Fan-out to push-mode observers, decoupled from ingestion.
    pub events: EventHub,
}

impl LiveSession {
    /// Only the registry creates sessions; `questions` is non-empty here.
    fn new(set_id: &str, questions: Vec<Question>, created_at: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        let id = format!(
            "quiz_{}_{}_{}",
            set_id,
            created_at.format("%Y%m%d_%H%M%S"),
            &suffix[..8]
        );

        let questions = questions
            .into_iter()
            .map(|question| QuestionSlot {
                question,
                ledger: Mutex::new(ResponseLedger::new()),
            })
            .collect();

        Self {
            id,
            set_id: set_id.to_string(),
            created_at,
            questions,
            current_index: AtomicUsize::new(0),
            scores: Mutex::new(HashMap::new()),
            events: EventHub::new(),
        }
    }

    /// 0-based index of the active question, always within range.
    pub fn current_index(&self) -> usize {
        self.current_index.load(Ordering::SeqCst)
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn slots(&self) -> &[QuestionSlot] {
        &self.questions
    }

    /// The slot of the active question.
    pub fn current_slot(&self) -> &QuestionSlot {
        &self.questions[self.current_index()]
    }

    /// Bumps the scoreboard after an accepted correct response and returns
    /// the student's new score.
    pub fn record_point(&self, student: &str) -> u32 {
        let mut scores = self.scores.lock().unwrap();
        let entry = scores.entry(student.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// An owned copy of the in-session scoreboard.
    pub fn scoreboard(&self) -> HashMap<String, u32> {
        self.scores.lock().unwrap().clone()
    }

    /// Saturating increment: advancing on the last question is a no-op.
    fn advance_index(&self) -> usize {
        let last = self.questions.len() - 1;
        let _ = self
            .current_index
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |index| {
                (index < last).then_some(index + 1)
            });
        self.current_index()
    }
}

struct RegistryInner {
    sessions: HashMap<String, Arc<LiveSession>>,
    current: Option<String>,
}

/// Owns every live session and the single "current" pointer. All lifecycle
/// transitions (start, advance, delete, reap) go through here.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RwLock<RegistryInner>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegistryInner {
                sessions: HashMap::new(),
                current: None,
            })),
            ttl,
        }
    }

    /// Creates a session from a snapshotted question set and makes it
    /// current. The previous current session stays retrievable by its id
    /// until the reaper gets to it.
    pub async fn start_session(
        &self,
        set_id: &str,
        questions: Vec<Question>,
    ) -> Result<Arc<LiveSession>> {
        if questions.is_empty() {
            return Err(AppError::EmptyQuestionSet);
        }

        let session = Arc::new(LiveSession::new(set_id, questions, Utc::now()));
        let mut inner = self.inner.write().await;
        inner.sessions.insert(session.id.clone(), session.clone());
        inner.current = Some(session.id.clone());
        Ok(session)
    }

    /// The session the current pointer references, after an opportunistic
    /// reap. `None` when no session is live or the target was reaped.
    pub async fn current_session(&self) -> Option<Arc<LiveSession>> {
        self.reap(Utc::now()).await;
        let inner = self.inner.read().await;
        let id = inner.current.as_ref()?;
        inner.sessions.get(id).cloned()
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<LiveSession>> {
        self.inner.read().await.sessions.get(session_id).cloned()
    }

    /// Advances the active question, clamped at the last index. Only the
    /// current session may advance; a stale id is rejected, not ignored.
    pub async fn advance(&self, session_id: &str) -> Result<usize> {
        let session = {
            let inner = self.inner.read().await;
            let session = inner
                .sessions
                .get(session_id)
                .cloned()
                .ok_or(AppError::NotFound)?;
            if inner.current.as_deref() != Some(session_id) {
                return Err(AppError::Conflict(format!(
                    "Session '{session_id}' is not the current session"
                )));
            }
            session
        };

        let index = session.advance_index();
        session.events.publish(SessionEvent::QuestionAdvanced { index });
        Ok(index)
    }

    /// Removes a session (explicit delete). Clears the current pointer if it
    /// pointed at the removed session. Returns whether anything was removed.
    pub async fn remove(&self, session_id: &str) -> bool {
        let mut inner = self.inner.write().await;
        match inner.sessions.remove(session_id) {
            Some(session) => {
                if inner.current.as_deref() == Some(session_id) {
                    inner.current = None;
                }
                session.events.publish(SessionEvent::SessionEnded);
                true
            }
            None => false,
        }
    }

    /// Drops every session strictly older than the TTL, measured against the
    /// given wall clock. A session created exactly one TTL ago survives.
    pub async fn reap(&self, now: DateTime<Utc>) -> usize {
        let mut inner = self.inner.write().await;
        let ttl = self.ttl;
        let expired: Vec<String> = inner
            .sessions
            .iter()
            .filter(|(_, session)| now - session.created_at > ttl)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            if let Some(session) = inner.sessions.remove(id) {
                session.events.publish(SessionEvent::SessionEnded);
                tracing::info!(session_id = %id, "reaped expired quiz session");
            }
            if inner.current.as_deref() == Some(id.as_str()) {
                inner.current = None;
            }
        }
        expired.len()
    }

    /// Current pointer plus the ids of every registered session, for the
    /// debug endpoint.
    pub async fn debug_snapshot(&self) -> (Option<String>, Vec<String>) {
        let inner = self.inner.read().await;
        let mut ids: Vec<String> = inner.sessions.keys().cloned().collect();
        ids.sort();
        (inner.current.clone(), ids)
    }
}
