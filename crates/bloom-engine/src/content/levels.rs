use super::manifest::LevelDescriptor;

/// Progress through an ordered list of levels.
#[derive(Debug, Clone)]
pub struct LevelLadder {
    levels: Vec<LevelDescriptor>,
    current: usize,
}

impl LevelLadder {
    /// An empty ladder is given a single 3×3 untimed level.
    pub fn new(levels: Vec<LevelDescriptor>) -> Self {
        let levels = if levels.is_empty() {
            vec![LevelDescriptor { grid_size: 3, time_limit_secs: None }]
        } else {
            levels
        };
        Self { levels, current: 0 }
    }

    pub fn current(&self) -> LevelDescriptor {
        self.levels[self.current]
    }

    /// 1-based level number for display and scoring.
    pub fn number(&self) -> usize {
        self.current + 1
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_final(&self) -> bool {
        self.current + 1 == self.levels.len()
    }

    /// Step to the next level. Returns false (and stays put) on the last one.
    pub fn advance(&mut self) -> bool {
        if self.is_final() {
            return false;
        }
        self.current += 1;
        true
    }

    pub fn restart(&mut self) {
        self.current = 0;
    }
}
