use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("level {level}: {reason}")]
    InvalidLevel { level: usize, reason: String },
}

/// Per-activity tuning loaded from JSON at runtime.
/// Every field is optional; activities fall back to their built-in ladder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityManifest {
    /// Activity identifier this manifest is meant for (informational).
    #[serde(default)]
    pub activity: Option<String>,
    /// Level ladder, easiest first.
    #[serde(default)]
    pub levels: Vec<LevelDescriptor>,
    /// Seconds the automated helper "thinks" before touching a cell.
    #[serde(default)]
    pub helper_delay_secs: Option<f32>,
    /// Seed for reproducible sessions (clinician review). Random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Narration on level start.
    #[serde(default = "default_narrate")]
    pub narrate: bool,
}

/// One rung of a level ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    /// Board edge length in cells.
    pub grid_size: usize,
    /// Countdown for the level, if it has one.
    #[serde(default)]
    pub time_limit_secs: Option<f32>,
}

fn default_narrate() -> bool {
    true
}

impl ActivityManifest {
    /// Parse a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
