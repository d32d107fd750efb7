//! Event types for the song-assembly pipeline
//!
//! Every pipeline run broadcasts its state transitions and recovered
//! degradations so the delivery layer can surface progress without
//! being part of the pipeline. Events are serializable for transport.

use crate::error::{DegradedReason, TaxonomyCode};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Per-request pipeline state machine.
///
/// `Failed` is reachable from every non-terminal state; `Complete` and
/// `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// Request accepted, nothing started
    Pending,
    /// Mood classification in progress
    Analyzing,
    /// Resolving generation parameters
    Mapping,
    /// Music and voice generation running concurrently
    Generating,
    /// Combining tracks into the final artifact
    Mixing,
    /// Artifact produced and persisted
    Complete,
    /// Run aborted on a fatal error
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Complete | RunState::Failed)
    }
}

/// Pipeline events broadcast over the [`EventBus`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    /// Run moved to a new stage
    RunStateChanged {
        /// Request UUID this run belongs to
        request_id: Uuid,
        /// State before the transition
        old_state: RunState,
        /// State after the transition
        new_state: RunState,
        /// When the transition occurred
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A recovered fallback was taken; the run continues
    RunDegraded {
        /// Request UUID this run belongs to
        request_id: Uuid,
        /// Which fallback path was taken
        reason: DegradedReason,
        /// Human-readable detail for logs/UI
        detail: String,
    },

    /// Run finished successfully (possibly degraded)
    RunCompleted {
        /// Request UUID this run belongs to
        request_id: Uuid,
        /// Artifact UUID for retrieval
        artifact_id: Uuid,
        /// True final duration of the mixed song
        duration_seconds: f64,
        /// Whether any fallback path was taken
        degraded: bool,
    },

    /// Run aborted with a fatal error
    RunFailed {
        /// Request UUID this run belongs to
        request_id: Uuid,
        /// Taxonomy code of the originating error
        code: TaxonomyCode,
        /// Error message
        message: String,
    },
}

/// Broadcast bus for pipeline events.
///
/// Thin wrapper around `tokio::sync::broadcast`; emitting with no
/// subscribers is not an error (the pipeline never depends on
/// listeners being present).
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PipelineEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers. Lagging or absent subscribers
    /// are ignored.
    pub fn emit(&self, event: PipelineEvent) {
        let _ = self.tx.send(event);
    }
}
