//! Event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` in the application state.
//! Publishing never blocks a request handler: if nobody subscribed the
//! event is simply dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use mediagrid_core::types::DbId;

// ---------------------------------------------------------------------------
// JobEvent
// ---------------------------------------------------------------------------

/// Event names published on the bus.
pub const EVENT_JOB_CREATED: &str = "runner-job.created";
pub const EVENT_JOB_ACCEPTED: &str = "runner-job.accepted";
pub const EVENT_JOB_COMPLETED: &str = "runner-job.completed";
pub const EVENT_JOB_ERRORED: &str = "runner-job.errored";
pub const EVENT_JOB_ABORTED: &str = "runner-job.aborted";
pub const EVENT_JOB_CANCELLED: &str = "runner-job.cancelled";

/// A job lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEvent {
    /// One of the `EVENT_JOB_*` names.
    pub event_type: String,

    pub job_uuid: Uuid,

    /// Job type label, e.g. `"vod-hls-transcoding"`.
    pub job_type: String,

    /// Runner involved in the transition, when one was.
    pub runner_id: Option<DbId>,

    /// Free-form JSON carrying event-specific data.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl JobEvent {
    pub fn new(event_type: &str, job_uuid: Uuid, job_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.to_string(),
            job_uuid,
            job_type: job_type.into(),
            runner_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_runner(mut self, runner_id: DbId) -> Self {
        self.runner_id = Some(runner_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out bus for [`JobEvent`]s.
pub struct EventBus {
    sender: broadcast::Sender<JobEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity. When the buffer is
    /// full the oldest un-consumed messages are dropped and slow receivers
    /// observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers. With zero receivers
    /// the event is silently dropped.
    pub fn publish(&self, event: JobEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
