//! Perfect maze generation by randomized backtracking.
//!
//! The grid is `size × size` with odd `size`. Cells with both coordinates odd
//! form the lattice; carving joins a lattice cell to an unvisited lattice cell
//! two steps away by opening the wall between them. Every lattice cell is
//! reached exactly once, so the open cells form a spanning tree: one route
//! between any two open cells.

use bloom_engine::Rng;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MazeError {
    #[error("maze size must be odd and at least 3, got {0}")]
    InvalidSize(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tile {
    Wall,
    Path,
    Start,
    End,
}

impl Tile {
    pub fn is_open(self) -> bool {
        self != Tile::Wall
    }

    fn glyph(self) -> char {
        match self {
            Tile::Wall => '#',
            Tile::Path => '.',
            Tile::Start => 'S',
            Tile::End => 'E',
        }
    }
}

/// Edge length of a maze, checked to be odd and ≥ 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MazeSize(usize);

impl MazeSize {
    pub const MIN: MazeSize = MazeSize(3);

    pub fn new(size: usize) -> Result<Self, MazeError> {
        if size < 3 || size % 2 == 0 {
            return Err(MazeError::InvalidSize(size));
        }
        Ok(MazeSize(size))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

/// Two-step moves between lattice cells: up, right, down, left.
const LATTICE_STEPS: [(isize, isize); 4] = [(0, -2), (2, 0), (0, 2), (-2, 0)];

/// One pending cell on the carve stack with its own shuffled direction order.
struct Frame {
    cell: (usize, usize),
    dirs: [(isize, isize); 4],
    next: usize,
}

impl Frame {
    fn new(cell: (usize, usize), rng: &mut Rng) -> Self {
        let mut dirs = LATTICE_STEPS;
        rng.shuffle(&mut dirs);
        Frame { cell, dirs, next: 0 }
    }
}

/// Immutable maze layout. The player position is tracked by the activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maze {
    size: usize,
    tiles: Vec<Tile>,
    passages: usize,
}

/// Validate `size` and generate a maze.
pub fn generate_maze(size: usize, rng: &mut Rng) -> Result<Maze, MazeError> {
    Ok(Maze::generate(MazeSize::new(size)?, rng))
}

impl Maze {
    pub fn generate(size: MazeSize, rng: &mut Rng) -> Self {
        let size = size.get();
        let mut tiles = vec![Tile::Wall; size * size];
        let passages = carve(&mut tiles, size, (1, 1), rng);

        // End first: on a 3×3 maze start and end share (1, 1) and Start wins.
        let last = size - 2;
        tiles[last * size + last] = Tile::End;
        tiles[size + 1] = Tile::Start;

        Maze { size, tiles, passages }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn start(&self) -> (usize, usize) {
        (1, 1)
    }

    pub fn end(&self) -> (usize, usize) {
        (self.size - 2, self.size - 2)
    }

    /// Tile at (x, y); anything off the grid reads as wall.
    pub fn tile(&self, x: usize, y: usize) -> Tile {
        if x < self.size && y < self.size {
            self.tiles[y * self.size + x]
        } else {
            Tile::Wall
        }
    }

    pub fn is_open(&self, x: usize, y: usize) -> bool {
        self.tile(x, y).is_open()
    }

    /// Number of lattice-to-lattice passages opened while carving.
    pub fn passages(&self) -> usize {
        self.passages
    }

    pub fn open_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_open()).count()
    }

    /// Text rows for display: `#` wall, `.` path, `S` start, `E` end.
    pub fn rows(&self) -> Vec<String> {
        self.tiles
            .chunks(self.size)
            .map(|row| row.iter().map(|t| t.glyph()).collect())
            .collect()
    }
}

/// Carve passages from `start` with an explicit stack. Returns passages opened.
fn carve(tiles: &mut [Tile], size: usize, start: (usize, usize), rng: &mut Rng) -> usize {
    let inner = 1..=(size as isize - 2);
    let mut passages = 0;

    tiles[start.1 * size + start.0] = Tile::Path;
    let mut stack = vec![Frame::new(start, rng)];

    while let Some(frame) = stack.last_mut() {
        if frame.next == frame.dirs.len() {
            stack.pop();
            continue;
        }
        let (dx, dy) = frame.dirs[frame.next];
        frame.next += 1;
        let (x, y) = frame.cell;

        let (nx, ny) = (x as isize + dx, y as isize + dy);
        if !inner.contains(&nx) || !inner.contains(&ny) {
            continue;
        }
        let (nx, ny) = (nx as usize, ny as usize);
        if tiles[ny * size + nx] != Tile::Wall {
            continue;
        }

        tiles[((y + ny) / 2) * size + (x + nx) / 2] = Tile::Path;
        tiles[ny * size + nx] = Tile::Path;
        passages += 1;
        stack.push(Frame::new((nx, ny), rng));
    }

    passages
}
