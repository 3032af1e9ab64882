pub mod api;
pub mod board;
pub mod content;
pub mod core;
pub mod input;
pub mod media;
pub mod session;

// Re-export key types at crate root for convenience
pub use api::game::{Game, GameConfig, EngineContext, ENGINE_RESERVED_EVENTS};
pub use api::types::{
    GameEvent, EVENT_SESSION_SAVED, EVENT_SESSION_STAGED, EVENT_SESSIONS_FLUSHED, EVENT_SESSION_LOST,
};
pub use board::layout::GridLayout;
pub use content::levels::LevelLadder;
pub use content::manifest::{ActivityManifest, LevelDescriptor, ManifestError};
pub use core::rng::Rng;
pub use core::schedule::{Scheduler, TaskHandle};
pub use core::time::FixedTimestep;
pub use input::queue::{keys, InputEvent, InputQueue};
pub use media::{Chime, MediaCommand, MediaService, Waveform};
pub use session::{
    record_session, KeyValueStore, MemoryStore, OfflineGateway, SaveOutcome, SessionError,
    SessionGateway, SessionStash, SessionSummary,
};
