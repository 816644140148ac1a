use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

/// Channel the host runtime listens on for meeting state events.
pub const MEETING_EVENT_CHANNEL: &str = "ZoomMeetingState";

/// Fire-and-forget notifications broadcast to the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingEvent {
    MeetingStarted,
    MeetingEnded,
}

impl MeetingEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MeetingStarted => "meeting-started",
            Self::MeetingEnded => "meeting-ended",
        }
    }

    /// Payload as emitted on [`MEETING_EVENT_CHANNEL`]: `{"event": "..."}`.
    pub fn payload(&self) -> EventPayload {
        EventPayload {
            event: self.as_str(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EventPayload {
    pub event: &'static str,
}

impl EventPayload {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Trait for receiving events from the core.
/// Implementations must be Send + Sync (called from SDK threads).
pub trait MeetingEventListener: Send + Sync {
    fn on_event(&self, event: MeetingEvent);
}

/// Internal event emitter that dispatches to registered listeners.
#[derive(Clone, Default)]
pub struct EventEmitter {
    listeners: Arc<RwLock<Vec<Arc<dyn MeetingEventListener>>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: Arc<dyn MeetingEventListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub fn emit(&self, event: MeetingEvent) {
        tracing::info!(channel = MEETING_EVENT_CHANNEL, "emit {}", event.as_str());
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        for listener in listeners.iter() {
            listener.on_event(event);
        }
    }
}
