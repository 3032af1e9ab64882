use bloom_engine::*;
use glam::Vec2;
use serde_json::json;

use crate::helper::{choose_cell, HelperDriver, DEFAULT_DELAY_SECS};
use crate::participants::{ParticipantId, PlayMode, Roster};
use crate::pattern::{PatternBoard, PatternError, TargetPattern};

const ACTIVITY: &str = "pattern-together";
const WORLD_W: f32 = 800.0;
const WORLD_H: f32 = 600.0;
const BOARD_MARGIN: f32 = 48.0;
const SEED: u64 = 0xB10_0A7E;

/// Default ladder: (edge length, seconds on the clock).
const DEFAULT_LEVELS: [(usize, f32); 3] = [(2, 60.0), (3, 50.0), (4, 40.0)];
const MAX_GRID_SIZE: usize = 6;
/// Longest countdown a manifest may ask for.
const MAX_TIME_LIMIT_SECS: f32 = 3600.0;

const LEVEL_CARD_SECS: f32 = 2.0;
const LEVEL_POINTS: u32 = 100;

// Custom event kinds (host → Rust)
/// a = mode code (0 solo, 1 with helper, 2 pair, 3 trio)
pub const CUSTOM_SELECT_MODE: u32 = 1;
/// a = column, b = row, c = human index (negative: whoever has the turn)
pub const CUSTOM_TOUCH: u32 = 2;
/// a = human index
pub const CUSTOM_SET_ACTIVE_PLAYER: u32 = 3;
pub const CUSTOM_NEXT_LEVEL: u32 = 4;
pub const CUSTOM_BACK_TO_MENU: u32 = 5;

// Game event kinds (Rust → host)
pub const EVENT_PHASE: f32 = 1.0;
pub const EVENT_CELL: f32 = 2.0;
pub const EVENT_TIMER: f32 = 3.0;
pub const EVENT_TIMEOUT: f32 = 4.0;
pub const EVENT_LEVEL_CLEARED: f32 = 5.0;
pub const EVENT_COMPLETE: f32 = 6.0;
pub const EVENT_TURN: f32 = 7.0;
pub const EVENT_HELPER_TOUCH: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ModeSelect,
    Playing,
    LevelCleared,
    Complete,
}

impl Phase {
    fn code(self) -> f32 {
        match self {
            Phase::ModeSelect => 0.0,
            Phase::Playing => 1.0,
            Phase::LevelCleared => 2.0,
            Phase::Complete => 3.0,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Phase::ModeSelect => "mode_select",
            Phase::Playing => "playing",
            Phase::LevelCleared => "level_cleared",
            Phase::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundTask {
    Second,
    HelperMove,
    NextLevel,
}

#[derive(Debug, Default, Clone)]
struct RoundStats {
    touches: u32,
    helper_touches: u32,
    levels_cleared: u32,
    total_secs: f32,
}

pub struct PatternTogether {
    ladder: LevelLadder,
    rng: Rng,
    mode: PlayMode,
    roster: Roster,
    board: Option<PatternBoard>,
    layout: GridLayout,
    phase: Phase,
    timers: Scheduler<RoundTask>,
    countdown: Option<TaskHandle>,
    seconds_left: Option<u32>,
    helper: Option<HelperDriver>,
    helper_delay: f32,
    narrate: bool,
    stats: RoundStats,
    score: u32,
}

impl PatternTogether {
    pub fn new() -> Self {
        let levels = DEFAULT_LEVELS
            .iter()
            .map(|&(grid_size, secs)| LevelDescriptor { grid_size, time_limit_secs: Some(secs) })
            .collect();
        Self {
            ladder: LevelLadder::new(levels),
            rng: Rng::new(SEED),
            mode: PlayMode::Solo,
            roster: Roster::for_mode(PlayMode::Solo),
            board: None,
            layout: Self::layout_for(DEFAULT_LEVELS[0].0),
            phase: Phase::ModeSelect,
            timers: Scheduler::new(),
            countdown: None,
            seconds_left: None,
            helper: None,
            helper_delay: DEFAULT_DELAY_SECS,
            narrate: true,
            stats: RoundStats::default(),
            score: 0,
        }
    }

    fn layout_for(size: usize) -> GridLayout {
        GridLayout::fit(size, size, Vec2::new(WORLD_W, WORLD_H), BOARD_MARGIN)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    pub fn board(&self) -> Option<&PatternBoard> {
        self.board.as_ref()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn seconds_left(&self) -> Option<u32> {
        self.seconds_left
    }

    fn set_phase(&mut self, ctx: &mut EngineContext, phase: Phase) {
        self.phase = phase;
        ctx.emit_event(GameEvent::new(
            EVENT_PHASE,
            phase.code(),
            self.ladder.number() as f32,
            self.mode.code() as f32,
        ));
    }

    /// Drop every pending timer along with the handles that point at them.
    fn stop_timers(&mut self) {
        if let Some(helper) = self.helper.as_mut() {
            helper.cancel(&mut self.timers);
        }
        self.timers.cancel_all();
        self.countdown = None;
    }

    fn begin_round(&mut self, ctx: &mut EngineContext, mode: PlayMode) {
        self.stop_timers();
        self.mode = mode;
        self.roster = Roster::for_mode(mode);
        self.helper = self
            .roster
            .helper()
            .map(|id| HelperDriver::new(id, self.helper_delay));
        self.ladder.restart();
        self.stats = RoundStats::default();
        self.score = 0;
        log::info!("{}: round started in {} mode", ACTIVITY, mode.name());
        self.start_level(ctx);
    }

    /// Fresh target and blank board for the current rung, clock and helper armed.
    fn start_level(&mut self, ctx: &mut EngineContext) {
        self.stop_timers();
        let level = self.ladder.current();
        let size = level.grid_size.clamp(1, MAX_GRID_SIZE);
        let target = TargetPattern::generate(size, size, &mut self.rng);
        self.board = Some(PatternBoard::new(target, self.mode.quorum()));
        self.layout = Self::layout_for(size);

        self.seconds_left = level
            .time_limit_secs
            .map(|secs| secs.ceil().clamp(1.0, MAX_TIME_LIMIT_SECS) as u32);
        if let Some(secs) = self.seconds_left {
            self.countdown = Some(self.timers.every(1.0, RoundTask::Second));
            ctx.emit_event(GameEvent::new(EVENT_TIMER, secs as f32, 0.0, 0.0));
        }
        if let Some(helper) = self.helper.as_mut() {
            helper.arm(&mut self.timers, RoundTask::HelperMove);
        }

        self.set_phase(ctx, Phase::Playing);
        if self.narrate {
            let line = match self.mode {
                PlayMode::Solo => "Tap the squares to copy the picture.",
                PlayMode::WithHelper => "Copy the picture together with your helper. Touch a square and your helper will join you.",
                PlayMode::Pair | PlayMode::Trio => "Copy the picture together. Two friends need to touch a square to change it.",
            };
            ctx.media.speak(format!("Level {}. {}", self.ladder.number(), line));
        }
        log::info!("{}: level {} ({}x{})", ACTIVITY, self.ladder.number(), size, size);
    }

    /// Apply one touch and report it. Returns true when it solved the board.
    fn apply_touch(&mut self, ctx: &mut EngineContext, index: usize, who: ParticipantId) -> bool {
        let Some(board) = self.board.as_mut() else {
            return false;
        };
        let touched = if self.roster.contains(who) {
            board.touch(index, who)
        } else {
            Err(PatternError::UnknownParticipant(who))
        };
        match touched {
            Ok(outcome) => {
                ctx.emit_event(GameEvent::new(
                    EVENT_CELL,
                    index as f32,
                    if outcome.cell.active { 1.0 } else { 0.0 },
                    outcome.cell.touched_by.len() as f32,
                ));
                if outcome.flipped {
                    ctx.media.chime(Chime::Gentle);
                }
                outcome.solved
            }
            Err(err) => {
                log::warn!("{}: touch ignored: {}", ACTIVITY, err);
                false
            }
        }
    }

    /// A human touch at (col, row). `human` None means whoever has the turn.
    fn human_touch(&mut self, ctx: &mut EngineContext, col: usize, row: usize, human: Option<usize>) {
        let Some(board) = self.board.as_ref() else {
            return;
        };
        let who = match human {
            Some(i) => self.roster.human(i),
            None => Ok(self.roster.active_human()),
        };
        let touched = who.and_then(|who| board.index(col, row).map(|index| (index, who)));
        let (index, who) = match touched {
            Ok(found) => found,
            Err(err) => {
                log::warn!("{}: touch ignored: {}", ACTIVITY, err);
                return;
            }
        };

        self.stats.touches += 1;
        let solved = self.apply_touch(ctx, index, who);

        if self.mode.humans() > 1 {
            self.roster.advance_turn();
            ctx.emit_event(GameEvent::new(EVENT_TURN, self.roster.turn() as f32, 0.0, 0.0));
        }
        if solved {
            self.clear_level(ctx);
        }
    }

    fn handle_tap(&mut self, ctx: &mut EngineContext, pos: Vec2) {
        if let Some((col, row)) = self.layout.world_to_cell(pos) {
            self.human_touch(ctx, col, row, None);
        }
    }

    fn helper_move(&mut self, ctx: &mut EngineContext) {
        let Some(id) = self.helper.as_mut().map(|helper| {
            helper.fired();
            helper.id()
        }) else {
            return;
        };
        let choice = self
            .board
            .as_ref()
            .and_then(|board| choose_cell(board, id, &mut self.rng));

        if let Some(index) = choice {
            log::debug!("{}: helper touches cell {}", ACTIVITY, index);
            self.stats.helper_touches += 1;
            ctx.emit_event(GameEvent::new(EVENT_HELPER_TOUCH, index as f32, 0.0, 0.0));
            if self.apply_touch(ctx, index, id) {
                self.clear_level(ctx);
                return;
            }
        }
        if let Some(helper) = self.helper.as_mut() {
            helper.arm(&mut self.timers, RoundTask::HelperMove);
        }
    }

    fn tick_second(&mut self, ctx: &mut EngineContext) {
        let Some(left) = self.seconds_left.as_mut() else {
            return;
        };
        *left = left.saturating_sub(1);
        let left = *left;
        ctx.emit_event(GameEvent::new(EVENT_TIMER, left as f32, 0.0, 0.0));
        if left == 0 {
            self.time_out(ctx);
        }
    }

    /// Clock ran out: the round is abandoned without credit.
    fn time_out(&mut self, ctx: &mut EngineContext) {
        self.stop_timers();
        ctx.media.chime(Chime::Timeout);
        ctx.emit_event(GameEvent::new(EVENT_TIMEOUT, self.ladder.number() as f32, 0.0, 0.0));
        ctx.submit_session(self.summary(false));
        log::info!("{}: time ran out on level {}", ACTIVITY, self.ladder.number());
        self.back_to_menu(ctx);
        if self.narrate {
            ctx.media.speak("Time is up. Let's try again when you are ready.");
        }
    }

    fn back_to_menu(&mut self, ctx: &mut EngineContext) {
        self.stop_timers();
        self.board = None;
        self.seconds_left = None;
        self.set_phase(ctx, Phase::ModeSelect);
    }

    fn clear_level(&mut self, ctx: &mut EngineContext) {
        self.stop_timers();
        let left = self.seconds_left.unwrap_or(0);
        let earned = LEVEL_POINTS
            .saturating_mul(self.ladder.number() as u32)
            .saturating_add(left);
        self.score = self.score.saturating_add(earned);
        self.stats.levels_cleared += 1;
        ctx.media.chime(Chime::Success);
        ctx.emit_event(GameEvent::new(
            EVENT_LEVEL_CLEARED,
            self.ladder.number() as f32,
            earned as f32,
            left as f32,
        ));

        if self.ladder.is_final() {
            self.complete(ctx);
        } else {
            self.set_phase(ctx, Phase::LevelCleared);
            if self.narrate {
                ctx.media.speak("Well done! That's the picture.");
            }
            self.timers.once(LEVEL_CARD_SECS, RoundTask::NextLevel);
        }
    }

    fn advance_level(&mut self, ctx: &mut EngineContext) {
        if self.ladder.advance() {
            self.start_level(ctx);
        }
    }

    /// Abandoned rounds (timeout, leaving) carry no score; points from levels
    /// already cleared stay visible in the metrics.
    fn summary(&self, completed: bool) -> SessionSummary {
        let score = if completed { self.score } else { 0 };
        SessionSummary::new(ACTIVITY, score, self.stats.total_secs, completed).with_metrics(json!({
            "points_earned": self.score,
            "mode": self.mode.name(),
            "levels_cleared": self.stats.levels_cleared,
            "levels_total": self.ladder.len(),
            "touches": self.stats.touches,
            "helper_touches": self.stats.helper_touches,
        }))
    }

    fn complete(&mut self, ctx: &mut EngineContext) {
        self.set_phase(ctx, Phase::Complete);
        ctx.emit_event(GameEvent::new(
            EVENT_COMPLETE,
            self.score as f32,
            self.stats.touches as f32,
            self.stats.total_secs,
        ));
        ctx.submit_session(self.summary(true));
        if self.narrate {
            ctx.media.speak("You copied every picture. Great teamwork!");
        }
        log::info!("{}: complete, score {}", ACTIVITY, self.score);
    }

    /// Leave mid-round: the round so far is recorded as abandoned.
    fn abandon(&mut self, ctx: &mut EngineContext) {
        if self.phase == Phase::Playing && self.stats.touches > 0 {
            ctx.submit_session(self.summary(false));
        }
        self.back_to_menu(ctx);
    }
}

impl Default for PatternTogether {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for PatternTogether {
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
            if level.grid_size == 0 || level.grid_size > MAX_GRID_SIZE {
                return Err(invalid(format!("grid size must be 1..={}, got {}", MAX_GRID_SIZE, level.grid_size)));
            }
            if let Some(secs) = level.time_limit_secs {
                if !secs.is_finite() || secs <= 0.0 || secs > MAX_TIME_LIMIT_SECS {
                    return Err(invalid(format!(
                        "time limit must be in (0, {}] seconds, got {}",
                        MAX_TIME_LIMIT_SECS, secs
                    )));
                }
            }
        }
        if !manifest.levels.is_empty() {
            self.ladder = LevelLadder::new(manifest.levels.clone());
        }
        if let Some(delay) = manifest.helper_delay_secs {
            if delay.is_finite() && delay >= 0.0 {
                self.helper_delay = delay;
            } else {
                log::warn!("{}: ignoring helper delay {}", ACTIVITY, delay);
            }
        }
        if let Some(seed) = manifest.seed {
            self.rng = Rng::new(seed);
        }
        self.narrate = manifest.narrate;
        Ok(())
    }

    fn init(&mut self, ctx: &mut EngineContext) {
        self.stop_timers();
        self.board = None;
        self.seconds_left = None;
        self.set_phase(ctx, Phase::ModeSelect);
        if self.narrate {
            ctx.media.speak("Choose how you want to play.");
        }
        log::info!("{}: ready", ACTIVITY);
    }

    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
        let dt = ctx.dt;

        let escape = input
            .iter()
            .any(|e| matches!(e, InputEvent::KeyDown { key_code } if *key_code == keys::ESCAPE));
        if self.phase != Phase::ModeSelect && (escape || input.custom(CUSTOM_BACK_TO_MENU).next().is_some()) {
            self.abandon(ctx);
            return;
        }

        for task in self.timers.advance(dt) {
            match (task, self.phase) {
                (RoundTask::Second, Phase::Playing) => self.tick_second(ctx),
                (RoundTask::HelperMove, Phase::Playing) => self.helper_move(ctx),
                (RoundTask::NextLevel, Phase::LevelCleared) => self.advance_level(ctx),
                _ => {}
            }
        }

        match self.phase {
            Phase::ModeSelect | Phase::Complete => {
                let picked = input
                    .custom(CUSTOM_SELECT_MODE)
                    .filter_map(|(a, _, _)| PlayMode::from_code(a as u32))
                    .last();
                if let Some(mode) = picked {
                    self.begin_round(ctx, mode);
                }
            }
            Phase::Playing => {
                self.stats.total_secs += dt;
                for event in input.iter() {
                    if self.phase != Phase::Playing {
                        break;
                    }
                    match event {
                        InputEvent::Custom { kind, a, b, c } if *kind == CUSTOM_TOUCH => {
                            if *a < 0.0 || *b < 0.0 {
                                log::warn!("{}: touch at negative cell ({}, {})", ACTIVITY, a, b);
                                continue;
                            }
                            let human = (*c >= 0.0).then_some(*c as usize);
                            self.human_touch(ctx, *a as usize, *b as usize, human);
                        }
                        InputEvent::Custom { kind, a, .. } if *kind == CUSTOM_SET_ACTIVE_PLAYER => {
                            match self.roster.set_turn(a.max(0.0) as usize) {
                                Ok(()) => ctx.emit_event(GameEvent::new(EVENT_TURN, self.roster.turn() as f32, 0.0, 0.0)),
                                Err(err) => log::warn!("{}: {}", ACTIVITY, err),
                            }
                        }
                        _ => {
                            if let Some(pos) = event.pointer_down() {
                                self.handle_tap(ctx, pos);
                            }
                        }
                    }
                }
            }
            Phase::LevelCleared => {
                if input.custom(CUSTOM_NEXT_LEVEL).next().is_some() {
                    self.stop_timers();
                    self.advance_level(ctx);
                }
            }
        }
    }

    fn snapshot(&self) -> serde_json::Value {
        let board = self.board.as_ref().map(|board| {
            json!({
                "cols": board.cols(),
                "rows": board.rows(),
                "quorum": board.quorum(),
                "cells": board.cells(),
                "target": board.target().cells(),
            })
        });
        json!({
            "phase": self.phase.name(),
            "mode": self.mode.name(),
            "level": self.ladder.number(),
            "levels": self.ladder.len(),
            "board": board,
            "seconds_left": self.seconds_left,
            "participants": self.roster.participants(),
            "turn": self.roster.turn(),
            "score": self.score,
            "cell_size": self.layout.cell_size,
            "origin": [self.layout.origin.x, self.layout.origin.y],
        })
    }

    fn shutdown(&mut self, ctx: &mut EngineContext) {
        if self.phase == Phase::Playing && self.stats.touches > 0 {
            ctx.submit_session(self.summary(false));
        }
        self.stop_timers();
        self.board = None;
        self.seconds_left = None;
        self.phase = Phase::ModeSelect;
    }
}
