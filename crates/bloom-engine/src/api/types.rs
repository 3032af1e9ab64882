use bytemuck::{Pod, Zeroable};

/// An event communicated from Rust to the host page.
/// Generic container: `kind` identifies the event, `a/b/c` carry payload.
/// Laid out as four f32s so the host can read the whole frame's events
/// as one flat `Float32Array`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GameEvent {
    pub kind: f32,
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl GameEvent {
    pub const FLOATS: usize = 4;

    pub fn new(kind: f32, a: f32, b: f32, c: f32) -> Self {
        Self { kind, a, b, c }
    }
}

// Event kinds at 100 and above belong to the engine; activities use 1..100.

/// A session summary reached the persistence gateway. `a` = score.
pub const EVENT_SESSION_SAVED: f32 = 100.0;
/// The gateway refused; the summary is staged locally. `a` = staged count.
pub const EVENT_SESSION_STAGED: f32 = 101.0;
/// Staged summaries were sent. `a` = number sent.
pub const EVENT_SESSIONS_FLUSHED: f32 = 102.0;
/// A summary could not be saved or staged.
pub const EVENT_SESSION_LOST: f32 = 103.0;
