//! Collaborative activation grid.
//!
//! Each cell remembers which distinct participants touched it since its last
//! flip. A touch toggles the participant's membership; once `quorum` distinct
//! participants are in, the cell flips and the set empties. With a quorum of
//! one a touch is a plain toggle. The board is solved when every cell's
//! `active` equals the target.

use std::collections::BTreeSet;

use bloom_engine::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::participants::ParticipantId;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PatternError {
    #[error("cell {index} is outside the {cols}x{rows} board")]
    CellOutOfRange { index: usize, cols: usize, rows: usize },
    #[error("participant {0:?} is not part of this round")]
    UnknownParticipant(ParticipantId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub active: bool,
    pub touched_by: BTreeSet<ParticipantId>,
}

/// Result of one touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TouchOutcome {
    pub cell: Cell,
    pub flipped: bool,
    pub solved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Coral,
    Sun,
    Mint,
    Sky,
    Lilac,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Circle,
    Square,
    Triangle,
    Star,
}

const COLORS: [Color; 5] = [Color::Coral, Color::Sun, Color::Mint, Color::Sky, Color::Lilac];
const SHAPES: [Shape; 4] = [Shape::Circle, Shape::Square, Shape::Triangle, Shape::Star];

/// Goal state of one cell. Color and shape are decoration only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetCell {
    pub active: bool,
    pub color: Color,
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPattern {
    cols: usize,
    rows: usize,
    cells: Vec<TargetCell>,
}

impl TargetPattern {
    /// Random target. Never all-inactive, since the board starts that way.
    pub fn generate(cols: usize, rows: usize, rng: &mut Rng) -> Self {
        let mut cells: Vec<TargetCell> = (0..cols * rows)
            .map(|_| TargetCell {
                active: rng.chance(0.5),
                color: COLORS[rng.next_index(COLORS.len())],
                shape: SHAPES[rng.next_index(SHAPES.len())],
            })
            .collect();
        if !cells.is_empty() && cells.iter().all(|c| !c.active) {
            let i = rng.next_index(cells.len());
            cells[i].active = true;
        }
        Self { cols, rows, cells }
    }

    /// Target from explicit `active` flags (row-major), plain decoration.
    pub fn from_active(cols: usize, rows: usize, active: &[bool]) -> Self {
        let cells = (0..cols * rows)
            .map(|i| TargetCell {
                active: active.get(i).copied().unwrap_or(false),
                color: COLORS[i % COLORS.len()],
                shape: SHAPES[i % SHAPES.len()],
            })
            .collect();
        Self { cols, rows, cells }
    }

    pub fn cells(&self) -> &[TargetCell] {
        &self.cells
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.cells.get(index).is_some_and(|c| c.active)
    }
}

/// Live grid plus its target for one level.
#[derive(Debug, Clone)]
pub struct PatternBoard {
    cols: usize,
    rows: usize,
    quorum: usize,
    cells: Vec<Cell>,
    target: TargetPattern,
}

impl PatternBoard {
    /// All cells start inactive and untouched.
    pub fn new(target: TargetPattern, quorum: usize) -> Self {
        Self {
            cols: target.cols,
            rows: target.rows,
            quorum: quorum.max(1),
            cells: vec![Cell::default(); target.cells.len()],
            target,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn quorum(&self) -> usize {
        self.quorum
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn target(&self) -> &TargetPattern {
        &self.target
    }

    pub fn index(&self, x: usize, y: usize) -> Result<usize, PatternError> {
        if x < self.cols && y < self.rows {
            Ok(y * self.cols + x)
        } else {
            Err(self.out_of_range(y.saturating_mul(self.cols).saturating_add(x)))
        }
    }

    fn out_of_range(&self, index: usize) -> PatternError {
        PatternError::CellOutOfRange { index, cols: self.cols, rows: self.rows }
    }

    /// Whether the cell already shows its target state.
    pub fn matches(&self, index: usize) -> bool {
        self.cells
            .get(index)
            .is_some_and(|c| c.active == self.target.is_active(index))
    }

    /// Indices whose state disagrees with the target.
    pub fn mismatched(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.cells.len()).filter(move |&i| !self.matches(i))
    }

    pub fn is_solved(&self) -> bool {
        self.mismatched().next().is_none()
    }

    /// Register a touch of `index` by `participant`.
    pub fn touch(&mut self, index: usize, participant: ParticipantId) -> Result<TouchOutcome, PatternError> {
        let quorum = self.quorum;
        let Some(cell) = self.cells.get_mut(index) else {
            return Err(self.out_of_range(index));
        };

        let mut flipped = false;
        if quorum == 1 {
            cell.active = !cell.active;
            flipped = true;
        } else if !cell.touched_by.remove(&participant) {
            cell.touched_by.insert(participant);
            if cell.touched_by.len() >= quorum {
                cell.active = !cell.active;
                cell.touched_by.clear();
                flipped = true;
            }
        }

        let cell = cell.clone();
        Ok(TouchOutcome { cell, flipped, solved: self.is_solved() })
    }
}
