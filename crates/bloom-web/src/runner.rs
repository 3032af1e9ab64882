use bloom_engine::{
    record_session, ActivityManifest, EngineContext, FixedTimestep, Game, GameConfig, GameEvent,
    InputEvent, InputQueue, KeyValueStore, MediaCommand, MemoryStore, OfflineGateway, SaveOutcome,
    SessionGateway, SessionStash, ENGINE_RESERVED_EVENTS, EVENT_SESSIONS_FLUSHED, EVENT_SESSION_LOST,
    EVENT_SESSION_SAVED, EVENT_SESSION_STAGED,
};

/// Generic activity runner that wires up the engine loop.
///
/// Each activity crate creates a `thread_local!` GameRunner and exports free
/// functions via `#[wasm_bindgen]`, because wasm-bindgen cannot export
/// generic structs directly.
pub struct GameRunner<G: Game> {
    game: G,
    ctx: EngineContext,
    input: InputQueue,
    timestep: FixedTimestep,
    config: GameConfig,
    initialized: bool,
    gateway: Box<dyn SessionGateway>,
    store: Box<dyn KeyValueStore>,
    /// Media commands waiting for the host to pick them up.
    media_outbox: Vec<MediaCommand>,
}

impl<G: Game> GameRunner<G> {
    pub fn new(game: G) -> Self {
        let config = game.config();
        Self {
            timestep: FixedTimestep::new(config.fixed_dt),
            ctx: EngineContext::with_config(&config),
            game,
            input: InputQueue::new(),
            config,
            initialized: false,
            gateway: Box::new(OfflineGateway),
            store: Box::new(MemoryStore::new()),
            media_outbox: Vec::new(),
        }
    }

    /// Initialize the activity. Call once after construction (and after shutdown to restart).
    pub fn init(&mut self) {
        self.config = self.game.config();
        self.timestep = FixedTimestep::new(self.config.fixed_dt);
        self.ctx.dt = self.timestep.dt();
        self.game.init(&mut self.ctx);
        self.initialized = true;
    }

    pub fn set_gateway(&mut self, gateway: Box<dyn SessionGateway>) {
        self.gateway = gateway;
    }

    pub fn set_store(&mut self, store: Box<dyn KeyValueStore>) {
        self.store = store;
    }

    /// Push an input event into the queue.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Parse and apply an activity manifest. Returns false if it was rejected.
    pub fn load_manifest(&mut self, json: &str) -> bool {
        let applied = ActivityManifest::from_json(json)
            .map_err(Into::into)
            .and_then(|manifest| self.game.configure(&manifest));
        match applied {
            Ok(()) => true,
            Err(err) => {
                log::warn!("manifest rejected: {}", err);
                false
            }
        }
    }

    /// Run one frame: fixed-step updates, then persistence and media hand-off.
    pub fn tick(&mut self, dt: f32) {
        if !self.initialized {
            return;
        }

        self.ctx.clear_frame_data();

        if self.input.has_gesture() {
            self.ctx.media.unlock();
        }

        let steps = self.timestep.accumulate(dt);
        if steps > 0 {
            // Input belongs to the first step only; later catch-up steps see none.
            let input = std::mem::take(&mut self.input);
            self.game.update(&mut self.ctx, &input);
            let idle = InputQueue::new();
            for _ in 1..steps {
                self.game.update(&mut self.ctx, &idle);
            }
        }

        self.persist_sessions();
        self.media_outbox.extend(self.ctx.media.drain());
    }

    fn persist_sessions(&mut self) {
        for summary in self.ctx.take_sessions() {
            let mut stash = SessionStash::new(self.store.as_mut());
            let outcome = record_session(&summary, self.gateway.as_mut(), &mut stash);
            let event = match outcome {
                SaveOutcome::Saved => GameEvent::new(EVENT_SESSION_SAVED, summary.score as f32, 0.0, 0.0),
                SaveOutcome::Staged => GameEvent::new(EVENT_SESSION_STAGED, stash.len() as f32, 0.0, 0.0),
                SaveOutcome::Lost => GameEvent::new(EVENT_SESSION_LOST, 0.0, 0.0, 0.0),
            };
            self.ctx.emit_engine_event(event);
        }
    }

    /// Retry staged sessions. Returns how many reached the gateway.
    pub fn flush_sessions(&mut self) -> u32 {
        let mut stash = SessionStash::new(self.store.as_mut());
        match stash.flush(self.gateway.as_mut()) {
            Ok(sent) => {
                if sent > 0 {
                    self.ctx.emit_engine_event(GameEvent::new(EVENT_SESSIONS_FLUSHED, sent as f32, 0.0, 0.0));
                }
                sent as u32
            }
            Err(err) => {
                log::warn!("session flush failed: {}", err);
                0
            }
        }
    }

    pub fn staged_sessions(&mut self) -> u32 {
        SessionStash::new(self.store.as_mut()).len() as u32
    }

    /// Explicit unlock from the host (e.g. a "start" button handler).
    pub fn unlock_audio(&mut self) {
        self.ctx.media.unlock();
        self.media_outbox.extend(self.ctx.media.drain());
    }

    /// Mute toggle from the host's settings; takes effect this frame.
    pub fn set_muted(&mut self, muted: bool) {
        self.ctx.media.set_muted(muted);
        self.media_outbox.extend(self.ctx.media.drain());
    }

    /// Teardown before navigating away: the activity cancels its timers and
    /// the media layer is silenced. `init` starts a fresh run.
    pub fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        self.game.shutdown(&mut self.ctx);
        self.persist_sessions();
        self.ctx.media.shutdown();
        self.media_outbox.extend(self.ctx.media.drain());
        self.input.drain();
        self.initialized = false;
    }

    // ---- Accessors read by the host ----

    pub fn game_events_ptr(&self) -> *const f32 {
        bytemuck::cast_slice::<GameEvent, f32>(&self.ctx.events).as_ptr()
    }

    pub fn game_events_len(&self) -> u32 {
        self.ctx.events.len() as u32
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.ctx.events
    }

    /// JSON array of pending media commands; clears the outbox.
    pub fn take_media_json(&mut self) -> String {
        let commands = std::mem::take(&mut self.media_outbox);
        serde_json::to_string(&commands).unwrap_or_else(|err| {
            log::warn!("media commands not encodable: {}", err);
            "[]".to_string()
        })
    }

    pub fn snapshot_json(&self) -> String {
        self.game.snapshot().to_string()
    }

    pub fn world_width(&self) -> f32 {
        self.config.world_width
    }

    pub fn world_height(&self) -> f32 {
        self.config.world_height
    }

    /// Event buffer capacity the host should expect, engine slots included.
    pub fn max_events(&self) -> u32 {
        (self.config.max_events + ENGINE_RESERVED_EVENTS) as u32
    }

    pub fn game(&self) -> &G {
        &self.game
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloom_engine::{SessionError, SessionSummary};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Counts updates and the input each one saw; submits a session on custom event 1.
    #[derive(Default)]
    struct CountingGame {
        updates: u32,
        inputs_seen: Vec<usize>,
        shut_down: bool,
    }

    impl Game for CountingGame {
        fn config(&self) -> GameConfig {
            GameConfig { fixed_dt: 0.1, ..GameConfig::default() }
        }

        fn init(&mut self, _ctx: &mut EngineContext) {}

        fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
            self.updates += 1;
            self.inputs_seen.push(input.len());
            if input.custom(1).next().is_some() {
                ctx.submit_session(SessionSummary::new("counter", 7, 1.0, true));
            }
            if input.custom(2).next().is_some() {
                for i in 0..64 {
                    ctx.emit_event(GameEvent::new(1.0, i as f32, 0.0, 0.0));
                }
                ctx.submit_session(SessionSummary::new("counter", 1, 1.0, false));
            }
        }

        fn snapshot(&self) -> serde_json::Value {
            serde_json::json!({ "updates": self.updates })
        }

        fn shutdown(&mut self, _ctx: &mut EngineContext) {
            self.shut_down = true;
        }
    }

    struct SharedGateway(Rc<RefCell<Vec<SessionSummary>>>, bool);

    impl SessionGateway for SharedGateway {
        fn save(&mut self, summary: &SessionSummary) -> Result<(), SessionError> {
            if !self.1 {
                return Err(SessionError::Unauthenticated);
            }
            self.0.borrow_mut().push(summary.clone());
            Ok(())
        }
    }

    fn runner() -> GameRunner<CountingGame> {
        let mut r = GameRunner::new(CountingGame::default());
        r.init();
        r
    }

    #[test]
    fn input_reaches_only_the_first_catch_up_step() {
        let mut r = runner();
        r.push_input(InputEvent::KeyDown { key_code: 40 });
        r.tick(0.35);
        assert_eq!(r.game().inputs_seen, vec![1, 0, 0]);
    }

    #[test]
    fn input_waits_for_a_step() {
        let mut r = runner();
        r.push_input(InputEvent::KeyDown { key_code: 40 });
        r.tick(0.05);
        assert_eq!(r.game().updates, 0);
        r.tick(0.06);
        assert_eq!(r.game().inputs_seen, vec![1]);
    }

    #[test]
    fn offline_session_is_staged_then_flushed() {
        let saved = Rc::new(RefCell::new(Vec::new()));
        let mut r = runner();
        r.set_gateway(Box::new(SharedGateway(saved.clone(), false)));
        r.push_input(InputEvent::Custom { kind: 1, a: 0.0, b: 0.0, c: 0.0 });
        r.tick(0.1);
        assert_eq!(r.events()[0].kind, EVENT_SESSION_STAGED);
        assert_eq!(r.staged_sessions(), 1);

        r.set_gateway(Box::new(SharedGateway(saved.clone(), true)));
        assert_eq!(r.flush_sessions(), 1);
        assert_eq!(saved.borrow().len(), 1);
        assert_eq!(r.staged_sessions(), 0);
    }

    #[test]
    fn staged_notice_survives_a_full_event_frame() {
        let mut r = runner();
        r.push_input(InputEvent::Custom { kind: 2, a: 0.0, b: 0.0, c: 0.0 });
        r.tick(0.1);
        let events = r.events();
        assert_eq!(events.last().map(|e| e.kind), Some(EVENT_SESSION_STAGED));
        assert_eq!(events.len(), GameConfig::default().max_events + 1);
        assert_eq!(r.max_events() as usize, GameConfig::default().max_events + ENGINE_RESERVED_EVENTS);
    }

    #[test]
    fn gesture_unlocks_media() {
        let mut r = runner();
        r.ctx.media.chime(bloom_engine::Chime::Gentle);
        r.tick(0.1);
        assert_eq!(r.take_media_json(), "[]");
        r.push_input(InputEvent::PointerDown { x: 0.0, y: 0.0 });
        r.tick(0.1);
        assert!(r.take_media_json().contains("\"tone\""));
    }

    #[test]
    fn muting_stops_audio_immediately() {
        let mut r = runner();
        r.set_muted(true);
        assert!(r.take_media_json().contains("stop_all"));
        r.push_input(InputEvent::PointerDown { x: 0.0, y: 0.0 });
        r.ctx.media.chime(bloom_engine::Chime::Gentle);
        r.tick(0.1);
        assert_eq!(r.take_media_json(), "[]");
    }

    #[test]
    fn shutdown_stops_ticking() {
        let mut r = runner();
        r.shutdown();
        assert!(r.game().shut_down);
        r.tick(1.0);
        assert_eq!(r.game().updates, 0);
        assert!(r.take_media_json().contains("stop_all"));
    }

    #[test]
    fn rejected_manifest_reports_false() {
        let mut r = runner();
        assert!(!r.load_manifest("{ not json"));
        assert!(r.load_manifest(r#"{ "levels": [] }"#));
        assert_eq!(r.snapshot_json(), r#"{"updates":0}"#);
    }
}
