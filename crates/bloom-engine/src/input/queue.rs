use glam::Vec2;

/// Browser `keyCode` values the activities respond to.
pub mod keys {
    pub const ENTER: u32 = 13;
    pub const ESCAPE: u32 = 27;
    pub const SPACE: u32 = 32;
    pub const ARROW_LEFT: u32 = 37;
    pub const ARROW_UP: u32 = 38;
    pub const ARROW_RIGHT: u32 = 39;
    pub const ARROW_DOWN: u32 = 40;
    pub const A: u32 = 65;
    pub const D: u32 = 68;
    pub const S: u32 = 83;
    pub const W: u32 = 87;
}

/// Input event types the engine understands.
/// Carries no activity-specific meaning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A touch/click began at world coordinates (x, y).
    PointerDown { x: f32, y: f32 },
    /// A touch/click ended at world coordinates (x, y).
    PointerUp { x: f32, y: f32 },
    /// A touch/cursor moved to world coordinates (x, y).
    PointerMove { x: f32, y: f32 },
    /// A key was pressed.
    KeyDown { key_code: u32 },
    /// A key was released.
    KeyUp { key_code: u32 },
    /// A custom event from the UI layer (mode buttons, "next level", etc.).
    /// `kind` identifies the event type; `a`, `b`, `c` carry arbitrary data.
    Custom { kind: u32, a: f32, b: f32, c: f32 },
}

impl InputEvent {
    /// World position of a pointer press, if this is one.
    pub fn pointer_down(&self) -> Option<Vec2> {
        match *self {
            InputEvent::PointerDown { x, y } => Some(Vec2::new(x, y)),
            _ => None,
        }
    }

    /// Whether this event counts as a user gesture for browser autoplay rules.
    pub fn is_gesture(&self) -> bool {
        matches!(
            self,
            InputEvent::PointerDown { .. } | InputEvent::PointerUp { .. } | InputEvent::KeyDown { .. }
        )
    }

    /// Unit grid step for arrow keys and WASD, as (dx, dy) with y pointing down.
    pub fn step_direction(&self) -> Option<(i32, i32)> {
        let InputEvent::KeyDown { key_code } = *self else {
            return None;
        };
        match key_code {
            keys::ARROW_LEFT | keys::A => Some((-1, 0)),
            keys::ARROW_RIGHT | keys::D => Some((1, 0)),
            keys::ARROW_UP | keys::W => Some((0, -1)),
            keys::ARROW_DOWN | keys::S => Some((0, 1)),
            _ => None,
        }
    }
}

/// A queue of input events.
/// JS pushes events between frames; the runner drains them after each frame.
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    /// Push a new input event (called from JS via wasm-bindgen).
    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Drain all pending events. Returns a Vec and clears the queue.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    /// Iterate over pending events without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &InputEvent> {
        self.events.iter()
    }

    /// Custom events of a given kind, with their payloads.
    pub fn custom(&self, wanted: u32) -> impl Iterator<Item = (f32, f32, f32)> + '_ {
        self.events.iter().filter_map(move |e| match *e {
            InputEvent::Custom { kind, a, b, c } if kind == wanted => Some((a, b, c)),
            _ => None,
        })
    }

    pub fn has_gesture(&self) -> bool {
        self.events.iter().any(InputEvent::is_gesture)
    }

    /// Check if there are pending events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
