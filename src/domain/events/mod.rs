use crate::domain::entities::RoomPost;
use serde_json::{json, Value};

/// Something that happened to the shared thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    Post(RoomPost),
    /// Liveness heartbeat, carries no business data
    Ping { ts: i64 },
}

impl RoomEvent {
    /// Event-kind label written to the push stream
    pub fn kind(&self) -> &'static str {
        match self {
            RoomEvent::Post(_) => "post",
            RoomEvent::Ping { .. } => "ping",
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            RoomEvent::Post(post) => serde_json::to_value(post).unwrap_or_else(|e| {
                tracing::error!(post_id = %post.id, "Failed to serialize post: {}", e);
                Value::Null
            }),
            RoomEvent::Ping { ts } => json!({ "ts": ts }),
        }
    }
}

/// A unit written to one viewer's stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionFrame {
    /// Sent once when the stream opens
    Hello { ts: i64 },
    Event(RoomEvent),
}

impl SessionFrame {
    pub fn kind(&self) -> &'static str {
        match self {
            SessionFrame::Hello { .. } => "hello",
            SessionFrame::Event(event) => event.kind(),
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            SessionFrame::Hello { ts } => json!({ "ok": true, "ts": ts }),
            SessionFrame::Event(event) => event.payload(),
        }
    }

    pub fn is_ping(&self) -> bool {
        matches!(self, SessionFrame::Event(RoomEvent::Ping { .. }))
    }
}

impl From<RoomEvent> for SessionFrame {
    fn from(event: RoomEvent) -> Self {
        SessionFrame::Event(event)
    }
}
