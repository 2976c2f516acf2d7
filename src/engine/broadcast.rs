use tokio::sync::broadcast;

/// Capacity of each session's event channel. A receiver that falls further
/// behind than this sees `Lagged` and resynchronizes from the next full view.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Events published by a live session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A response was accepted for the given question.
    ResponseAccepted { question_id: String },
    /// The instructor advanced to the question at `index`.
    QuestionAdvanced { index: usize },
    /// The session was deleted or reaped.
    SessionEnded,
}

/// Fan-out channel for one session's observers. Publishing never blocks and
/// never fails; with no subscribers the event is simply dropped.
#[derive(Debug)]
pub struct EventHub {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, event: SessionEvent) {
        // Err only means nobody is listening right now.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}
