use bloom_engine::*;
use glam::Vec2;
use serde_json::json;

use crate::maze::{Maze, MazeSize};

const ACTIVITY: &str = "emotion-maze";
const WORLD_W: f32 = 800.0;
const WORLD_H: f32 = 600.0;
const BOARD_MARGIN: f32 = 24.0;
const SEED: u64 = 0x5EED_CA1F;

/// Default ladder: odd sizes, growing.
const DEFAULT_SIZES: [usize; 5] = [7, 9, 11, 13, 15];
/// Below this the start sits on (or next to) the goal.
const MIN_PLAYABLE_SIZE: usize = 5;

/// Pause on the "level cleared" card before the next maze loads.
const LEVEL_CARD_SECS: f32 = 2.0;
const LEVEL_POINTS: u32 = 50;
const MIN_LEVEL_POINTS: u32 = 10;

// Custom event kinds (host → Rust)
pub const CUSTOM_START: u32 = 1;
pub const CUSTOM_NEXT_LEVEL: u32 = 2;
pub const CUSTOM_RESTART: u32 = 3;

// Game event kinds (Rust → host)
pub const EVENT_PHASE: f32 = 1.0;
pub const EVENT_MOVED: f32 = 2.0;
pub const EVENT_BUMP: f32 = 3.0;
pub const EVENT_LEVEL_CLEARED: f32 = 4.0;
pub const EVENT_COMPLETE: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Intro,
    Playing,
    LevelCleared,
    Complete,
}

impl Phase {
    fn code(self) -> f32 {
        match self {
            Phase::Intro => 0.0,
            Phase::Playing => 1.0,
            Phase::LevelCleared => 2.0,
            Phase::Complete => 3.0,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Phase::Intro => "intro",
            Phase::Playing => "playing",
            Phase::LevelCleared => "level_cleared",
            Phase::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MazeTask {
    NextLevel,
}

/// Per-run counters reported in the session summary.
#[derive(Debug, Default, Clone)]
struct RunStats {
    moves: u32,
    bumps: u32,
    level_bumps: u32,
    level_secs: f32,
    total_secs: f32,
    level_times: Vec<f32>,
}

pub struct EmotionMaze {
    ladder: LevelLadder,
    rng: Rng,
    maze: Maze,
    player: (usize, usize),
    layout: GridLayout,
    phase: Phase,
    timers: Scheduler<MazeTask>,
    next_level: Option<TaskHandle>,
    narrate: bool,
    stats: RunStats,
    score: u32,
}

impl EmotionMaze {
    pub fn new() -> Self {
        let levels = DEFAULT_SIZES
            .iter()
            .map(|&grid_size| LevelDescriptor { grid_size, time_limit_secs: None })
            .collect();
        let mut rng = Rng::new(SEED);
        let maze = Maze::generate(MazeSize::MIN, &mut rng);
        Self {
            ladder: LevelLadder::new(levels),
            layout: Self::layout_for(&maze),
            player: maze.start(),
            maze,
            rng,
            phase: Phase::Intro,
            timers: Scheduler::new(),
            next_level: None,
            narrate: true,
            stats: RunStats::default(),
            score: 0,
        }
    }

    fn layout_for(maze: &Maze) -> GridLayout {
        GridLayout::fit(maze.size(), maze.size(), Vec2::new(WORLD_W, WORLD_H), BOARD_MARGIN)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn player(&self) -> (usize, usize) {
        self.player
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    fn set_phase(&mut self, ctx: &mut EngineContext, phase: Phase) {
        self.phase = phase;
        ctx.emit_event(GameEvent::new(EVENT_PHASE, phase.code(), self.ladder.number() as f32, 0.0));
    }

    /// Generate the maze for the current rung and put the player on the start.
    fn start_level(&mut self, ctx: &mut EngineContext) {
        let size = match MazeSize::new(self.ladder.current().grid_size) {
            Ok(size) => size,
            Err(err) => {
                log::error!("level {}: {}; using smallest maze", self.ladder.number(), err);
                MazeSize::MIN
            }
        };
        self.maze = Maze::generate(size, &mut self.rng);
        self.layout = Self::layout_for(&self.maze);
        self.player = self.maze.start();
        self.stats.level_bumps = 0;
        self.stats.level_secs = 0.0;
        self.set_phase(ctx, Phase::Playing);
        if self.narrate {
            ctx.media.speak(format!(
                "Level {}. Take your time and find the way to the star.",
                self.ladder.number()
            ));
        }
        log::info!("{}: level {} ({}x{})", ACTIVITY, self.ladder.number(), size.get(), size.get());
    }

    fn begin_run(&mut self, ctx: &mut EngineContext) {
        self.timers.cancel_all();
        self.next_level = None;
        self.ladder.restart();
        self.stats = RunStats::default();
        self.score = 0;
        self.start_level(ctx);
    }

    fn try_step(&mut self, ctx: &mut EngineContext, dx: i32, dy: i32) {
        let (x, y) = self.player;
        let target = x
            .checked_add_signed(dx as isize)
            .zip(y.checked_add_signed(dy as isize));
        match target {
            Some((nx, ny)) if self.maze.is_open(nx, ny) => {
                self.player = (nx, ny);
                self.stats.moves += 1;
                ctx.emit_event(GameEvent::new(EVENT_MOVED, nx as f32, ny as f32, self.stats.moves as f32));
                if self.player == self.maze.end() {
                    self.clear_level(ctx);
                }
            }
            _ => {
                self.stats.bumps += 1;
                self.stats.level_bumps += 1;
                ctx.media.chime(Chime::Bump);
                ctx.emit_event(GameEvent::new(EVENT_BUMP, x as f32, y as f32, 0.0));
            }
        }
    }

    /// Tap on a neighbouring tile moves there; taps elsewhere are ignored.
    fn handle_tap(&mut self, ctx: &mut EngineContext, pos: Vec2) {
        let Some((cx, cy)) = self.layout.world_to_cell(pos) else {
            return;
        };
        let dx = cx as i32 - self.player.0 as i32;
        let dy = cy as i32 - self.player.1 as i32;
        if dx.abs() + dy.abs() == 1 {
            self.try_step(ctx, dx, dy);
        }
    }

    fn clear_level(&mut self, ctx: &mut EngineContext) {
        let earned = (LEVEL_POINTS * self.ladder.number() as u32)
            .saturating_sub(self.stats.level_bumps)
            .max(MIN_LEVEL_POINTS);
        self.score += earned;
        self.stats.level_times.push(self.stats.level_secs);
        ctx.media.chime(Chime::Success);
        ctx.emit_event(GameEvent::new(
            EVENT_LEVEL_CLEARED,
            self.ladder.number() as f32,
            earned as f32,
            self.stats.level_secs,
        ));

        if self.ladder.is_final() {
            self.complete(ctx);
        } else {
            self.set_phase(ctx, Phase::LevelCleared);
            self.next_level = Some(self.timers.once(LEVEL_CARD_SECS, MazeTask::NextLevel));
        }
    }

    fn advance_level(&mut self, ctx: &mut EngineContext) {
        if let Some(handle) = self.next_level.take() {
            self.timers.cancel(handle);
        }
        if self.ladder.advance() {
            self.start_level(ctx);
        }
    }

    fn summary(&self, completed: bool) -> SessionSummary {
        SessionSummary::new(ACTIVITY, self.score, self.stats.total_secs, completed).with_metrics(json!({
            "levels_cleared": self.stats.level_times.len(),
            "levels_total": self.ladder.len(),
            "moves": self.stats.moves,
            "bumps": self.stats.bumps,
            "level_times_secs": self.stats.level_times,
        }))
    }

    fn complete(&mut self, ctx: &mut EngineContext) {
        self.set_phase(ctx, Phase::Complete);
        ctx.emit_event(GameEvent::new(EVENT_COMPLETE, self.score as f32, self.stats.moves as f32, self.stats.total_secs));
        ctx.submit_session(self.summary(true));
        log::info!("{}: complete, score {}", ACTIVITY, self.score);
    }
}

impl Default for EmotionMaze {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for EmotionMaze {
    fn config(&self) -> GameConfig {
        GameConfig {
            world_width: WORLD_W,
            world_height: WORLD_H,
            ..GameConfig::default()
        }
    }

    fn configure(&mut self, manifest: &ActivityManifest) -> Result<(), ManifestError> {
        for (i, level) in manifest.levels.iter().enumerate() {
            let invalid = |reason: String| ManifestError::InvalidLevel { level: i + 1, reason };
            MazeSize::new(level.grid_size).map_err(|e| invalid(e.to_string()))?;
            if level.grid_size < MIN_PLAYABLE_SIZE {
                return Err(invalid(format!("maze size {} is too small to play", level.grid_size)));
            }
        }
        if !manifest.levels.is_empty() {
            self.ladder = LevelLadder::new(manifest.levels.clone());
        }
        if let Some(seed) = manifest.seed {
            self.rng = Rng::new(seed);
        }
        self.narrate = manifest.narrate;
        Ok(())
    }

    fn init(&mut self, ctx: &mut EngineContext) {
        self.timers.cancel_all();
        self.next_level = None;
        self.set_phase(ctx, Phase::Intro);
        if self.narrate {
            ctx.media.speak("Let's find the way through the maze together.");
        }
        log::info!("{}: ready", ACTIVITY);
    }

    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
        let dt = ctx.dt;

        if input.custom(CUSTOM_RESTART).next().is_some() {
            self.begin_run(ctx);
            return;
        }

        for task in self.timers.advance(dt) {
            match task {
                MazeTask::NextLevel => {
                    self.next_level = None;
                    self.advance_level(ctx);
                }
            }
        }

        match self.phase {
            Phase::Intro => {
                let start_key = input.iter().any(|e| {
                    matches!(e, InputEvent::KeyDown { key_code } if *key_code == keys::ENTER || *key_code == keys::SPACE)
                });
                if start_key || input.custom(CUSTOM_START).next().is_some() {
                    self.begin_run(ctx);
                }
            }
            Phase::Playing => {
                self.stats.level_secs += dt;
                self.stats.total_secs += dt;
                for event in input.iter() {
                    if self.phase != Phase::Playing {
                        break;
                    }
                    if let Some((dx, dy)) = event.step_direction() {
                        self.try_step(ctx, dx, dy);
                    } else if let Some(pos) = event.pointer_down() {
                        self.handle_tap(ctx, pos);
                    }
                }
            }
            Phase::LevelCleared => {
                if input.custom(CUSTOM_NEXT_LEVEL).next().is_some() {
                    self.advance_level(ctx);
                }
            }
            Phase::Complete => {}
        }
    }

    fn snapshot(&self) -> serde_json::Value {
        json!({
            "phase": self.phase.name(),
            "level": self.ladder.number(),
            "levels": self.ladder.len(),
            "size": self.maze.size(),
            "rows": self.maze.rows(),
            "player": [self.player.0, self.player.1],
            "goal": [self.maze.end().0, self.maze.end().1],
            "moves": self.stats.moves,
            "score": self.score,
            "cell_size": self.layout.cell_size,
            "origin": [self.layout.origin.x, self.layout.origin.y],
        })
    }

    fn shutdown(&mut self, ctx: &mut EngineContext) {
        self.timers.cancel_all();
        self.next_level = None;
        if self.phase == Phase::Playing && self.stats.moves > 0 {
            ctx.submit_session(self.summary(false));
        }
        self.phase = Phase::Intro;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn press(kind: u32) -> InputQueue {
        let mut q = InputQueue::new();
        q.push(InputEvent::Custom { kind, a: 0.0, b: 0.0, c: 0.0 });
        q
    }

    fn started(manifest: Option<&str>) -> (EmotionMaze, EngineContext) {
        let mut game = EmotionMaze::new();
        if let Some(json) = manifest {
            game.configure(&ActivityManifest::from_json(json).unwrap()).unwrap();
        }
        let mut ctx = EngineContext::with_config(&game.config());
        game.init(&mut ctx);
        game.update(&mut ctx, &press(CUSTOM_START));
        (game, ctx)
    }

    /// Arrow-key route from the player to the goal (BFS over open tiles).
    fn route(game: &EmotionMaze) -> Vec<u32> {
        let maze = game.maze();
        let n = maze.size();
        let mut prev: Vec<Option<((usize, usize), u32)>> = vec![None; n * n];
        let start = game.player();
        let mut queue = VecDeque::from([start]);
        let steps = [
            (0i32, -1i32, keys::ARROW_UP),
            (1, 0, keys::ARROW_RIGHT),
            (0, 1, keys::ARROW_DOWN),
            (-1, 0, keys::ARROW_LEFT),
        ];
        while let Some((x, y)) = queue.pop_front() {
            if (x, y) == maze.end() {
                break;
            }
            for (dx, dy, key) in steps {
                let nx = (x as i32 + dx) as usize;
                let ny = (y as i32 + dy) as usize;
                if maze.is_open(nx, ny) && (nx, ny) != start && prev[ny * n + nx].is_none() {
                    prev[ny * n + nx] = Some(((x, y), key));
                    queue.push_back((nx, ny));
                }
            }
        }
        let mut keys_rev = Vec::new();
        let mut at = maze.end();
        while at != start {
            let (from, key) = prev[at.1 * n + at.0].unwrap();
            keys_rev.push(key);
            at = from;
        }
        keys_rev.reverse();
        keys_rev
    }

    fn walk(game: &mut EmotionMaze, ctx: &mut EngineContext, keys_seq: &[u32]) {
        for &key_code in keys_seq {
            let mut q = InputQueue::new();
            q.push(InputEvent::KeyDown { key_code });
            game.update(ctx, &q);
        }
    }

    #[test]
    fn starts_in_intro_and_enters_first_level() {
        let mut game = EmotionMaze::new();
        let mut ctx = EngineContext::new();
        game.init(&mut ctx);
        assert_eq!(game.phase(), Phase::Intro);
        game.update(&mut ctx, &press(CUSTOM_START));
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.maze().size(), DEFAULT_SIZES[0]);
        assert_eq!(game.player(), (1, 1));
    }

    #[test]
    fn walls_block_and_count_bumps() {
        let (mut game, mut ctx) = started(None);
        // (1, 0) is the outer wall.
        walk(&mut game, &mut ctx, &[keys::ARROW_UP]);
        assert_eq!(game.player(), (1, 1));
        assert_eq!(game.stats.bumps, 1);
        assert!(ctx.events.iter().any(|e| e.kind == EVENT_BUMP));
    }

    #[test]
    fn reaching_goal_clears_level_and_auto_advances() {
        let (mut game, mut ctx) = started(None);
        let path = route(&game);
        walk(&mut game, &mut ctx, &path);
        assert_eq!(game.phase(), Phase::LevelCleared);
        assert_eq!(game.score(), LEVEL_POINTS);

        let idle = InputQueue::new();
        let steps = (LEVEL_CARD_SECS / ctx.dt) as usize + 2;
        for _ in 0..steps {
            game.update(&mut ctx, &idle);
        }
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.maze().size(), DEFAULT_SIZES[1]);
    }

    #[test]
    fn next_level_button_skips_the_wait() {
        let (mut game, mut ctx) = started(None);
        let path = route(&game);
        walk(&mut game, &mut ctx, &path);
        game.update(&mut ctx, &press(CUSTOM_NEXT_LEVEL));
        assert_eq!(game.phase(), Phase::Playing);
        assert!(game.timers.is_empty());
    }

    #[test]
    fn tapping_an_adjacent_tile_moves_there() {
        let (mut game, mut ctx) = started(None);
        let (x, y) = game.player();
        let open = if game.maze().is_open(x + 1, y) { (x + 1, y) } else { (x, y + 1) };
        let mut q = InputQueue::new();
        let pos = game.layout.cell_center(open.0, open.1);
        q.push(InputEvent::PointerDown { x: pos.x, y: pos.y });
        game.update(&mut ctx, &q);
        assert_eq!(game.player(), open);
    }

    #[test]
    fn finishing_last_level_submits_summary() {
        let (mut game, mut ctx) = started(Some(r#"{ "levels": [ { "grid_size": 5 }, { "grid_size": 7 } ], "seed": 4 }"#));
        for _ in 0..2 {
            let path = route(&game);
            walk(&mut game, &mut ctx, &path);
            if game.phase() == Phase::LevelCleared {
                game.update(&mut ctx, &press(CUSTOM_NEXT_LEVEL));
            }
        }
        assert_eq!(game.phase(), Phase::Complete);
        let sessions = ctx.take_sessions();
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].completed);
        assert_eq!(sessions[0].activity, ACTIVITY);
        assert_eq!(sessions[0].metrics["levels_cleared"], 2);
    }

    #[test]
    fn manifest_with_even_size_is_rejected() {
        let mut game = EmotionMaze::new();
        let manifest = ActivityManifest::from_json(r#"{ "levels": [ { "grid_size": 9 }, { "grid_size": 8 } ] }"#).unwrap();
        match game.configure(&manifest) {
            Err(ManifestError::InvalidLevel { level, .. }) => assert_eq!(level, 2),
            other => panic!("expected InvalidLevel, got {:?}", other),
        }
        assert_eq!(game.ladder.len(), DEFAULT_SIZES.len());
    }

    #[test]
    fn manifest_with_unplayable_size_is_rejected() {
        let mut game = EmotionMaze::new();
        let manifest = ActivityManifest::from_json(r#"{ "levels": [ { "grid_size": 3 } ] }"#).unwrap();
        assert!(game.configure(&manifest).is_err());
    }

    #[test]
    fn shutdown_mid_level_records_abandoned_session() {
        let (mut game, mut ctx) = started(None);
        walk(&mut game, &mut ctx, &[keys::ARROW_RIGHT, keys::ARROW_DOWN]);
        game.shutdown(&mut ctx);
        let sessions = ctx.take_sessions();
        assert_eq!(sessions.len(), 1);
        assert!(!sessions[0].completed);
        assert!(game.timers.is_empty());
    }

    #[test]
    fn snapshot_reports_grid_and_player() {
        let (game, _ctx) = started(None);
        let snap = game.snapshot();
        assert_eq!(snap["phase"], "playing");
        assert_eq!(snap["rows"].as_array().unwrap().len(), DEFAULT_SIZES[0]);
        assert_eq!(snap["player"][0], 1);
    }
}
