use crate::api::types::GameEvent;
use crate::content::manifest::{ActivityManifest, ManifestError};
use crate::input::queue::InputQueue;
use crate::media::MediaService;
use crate::session::SessionSummary;

/// Configuration for the engine, provided by the activity.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Fixed timestep in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// World width in game units.
    pub world_width: f32,
    /// World height in game units.
    pub world_height: f32,
    /// Maximum number of game events kept per frame (default: 32).
    pub max_events: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            world_width: 800.0,
            world_height: 600.0,
            max_events: 32,
        }
    }
}

/// The core contract every activity must fulfill.
pub trait Game {
    /// Return engine configuration. Called once before init.
    fn config(&self) -> GameConfig {
        GameConfig::default()
    }

    /// Apply a manifest loaded by the host. Called before or between rounds.
    fn configure(&mut self, _manifest: &ActivityManifest) -> Result<(), ManifestError> {
        Ok(())
    }

    /// Setup initial state.
    fn init(&mut self, ctx: &mut EngineContext);

    /// One fixed step: react to input, advance timers, check win conditions.
    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue);

    /// Display state for the host page (grid, phase, score, ...).
    fn snapshot(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    /// Teardown before the page navigates away. Cancel every pending timer here.
    fn shutdown(&mut self, _ctx: &mut EngineContext) {}
}

/// Slots per frame kept free for engine notices (session saved/staged/lost)
/// on top of the activity's `max_events`.
pub const ENGINE_RESERVED_EVENTS: usize = 4;

/// Mutable access to engine state, passed to Game::init and Game::update.
pub struct EngineContext {
    /// Seconds per `update` call.
    pub dt: f32,
    pub media: MediaService,
    pub events: Vec<GameEvent>,
    sessions: Vec<SessionSummary>,
    max_events: usize,
}

impl EngineContext {
    pub fn new() -> Self {
        Self::with_config(&GameConfig::default())
    }

    pub fn with_config(config: &GameConfig) -> Self {
        Self {
            dt: config.fixed_dt,
            media: MediaService::new(),
            events: Vec::with_capacity(config.max_events + ENGINE_RESERVED_EVENTS),
            sessions: Vec::new(),
            max_events: config.max_events,
        }
    }

    /// Emit a game event to be forwarded to the host.
    /// Events past `max_events` in one frame are dropped.
    pub fn emit_event(&mut self, event: GameEvent) {
        if self.events.len() < self.max_events {
            self.events.push(event);
        } else {
            log::warn!("event buffer full, dropping kind {}", event.kind);
        }
    }

    /// Emit an engine notice. Uses the reserved slots, so a frame the activity
    /// filled still reports it.
    pub fn emit_engine_event(&mut self, event: GameEvent) {
        if self.events.len() < self.max_events + ENGINE_RESERVED_EVENTS {
            self.events.push(event);
        } else {
            log::warn!("engine event buffer full, dropping kind {}", event.kind);
        }
    }

    /// Hand a finished round to the runner for persistence.
    pub fn submit_session(&mut self, summary: SessionSummary) {
        self.sessions.push(summary);
    }

    /// Summaries submitted since the last call.
    pub fn take_sessions(&mut self) -> Vec<SessionSummary> {
        std::mem::take(&mut self.sessions)
    }

    /// Clear per-frame transient data.
    pub fn clear_frame_data(&mut self) {
        self.events.clear();
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new()
    }
}
