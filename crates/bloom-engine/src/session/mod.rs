//! Session summaries and how they reach the persistence gateway.
//!
//! An activity produces one `SessionSummary` per finished (or abandoned)
//! round. The recorder hands it to the gateway; when the gateway refuses
//! (offline, signed out) the summary is staged in the local store and a
//! later `flush` retries it.

mod store;

pub use store::{KeyValueStore, MemoryStore, SessionStash, STASH_KEY};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no signed-in user to attach the session to")]
    Unauthenticated,
    #[error("persistence gateway unreachable: {0}")]
    Unreachable(String),
    #[error("local store failed: {0}")]
    Storage(String),
    #[error("session record could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// What an activity reports when a round ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Stable activity identifier, e.g. "emotion-maze".
    pub activity: String,
    pub score: u32,
    pub duration_secs: f32,
    /// False when the round was abandoned (timeout, navigation).
    pub completed: bool,
    /// Activity-specific payload, stored verbatim.
    #[serde(default)]
    pub metrics: serde_json::Value,
}

impl SessionSummary {
    pub fn new(activity: impl Into<String>, score: u32, duration_secs: f32, completed: bool) -> Self {
        Self {
            activity: activity.into(),
            score,
            duration_secs,
            completed,
            metrics: serde_json::Value::Null,
        }
    }

    pub fn with_metrics(mut self, metrics: serde_json::Value) -> Self {
        self.metrics = metrics;
        self
    }
}

/// The hosted backend that stores sessions against the signed-in user.
pub trait SessionGateway {
    fn save(&mut self, summary: &SessionSummary) -> Result<(), SessionError>;
}

/// Gateway used before the host wires a real one: always offline.
#[derive(Debug, Default)]
pub struct OfflineGateway;

impl SessionGateway for OfflineGateway {
    fn save(&mut self, _summary: &SessionSummary) -> Result<(), SessionError> {
        Err(SessionError::Unreachable("no gateway configured".into()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// Gateway refused; the record waits in the local store.
    Staged,
    /// Neither the gateway nor the local store took the record.
    Lost,
}

/// Save with local fallback. Never fails the activity.
pub fn record_session(
    summary: &SessionSummary,
    gateway: &mut dyn SessionGateway,
    stash: &mut SessionStash<'_>,
) -> SaveOutcome {
    match gateway.save(summary) {
        Ok(()) => {
            log::info!("session saved: {} score={}", summary.activity, summary.score);
            SaveOutcome::Saved
        }
        Err(err) => {
            log::warn!("session save failed ({}), staging locally", err);
            match stash.stage(summary) {
                Ok(()) => SaveOutcome::Staged,
                Err(err) => {
                    log::warn!("session could not be staged: {}", err);
                    SaveOutcome::Lost
                }
            }
        }
    }
}
