//! Automated participant for the "with helper" mode.

use bloom_engine::{Rng, Scheduler, TaskHandle};

use crate::participants::ParticipantId;
use crate::pattern::PatternBoard;

/// Weight of a mismatched cell a human already touched.
pub const HUMAN_TOUCHED_WEIGHT: u32 = 3;
/// Weight of any other mismatched cell.
const PLAIN_WEIGHT: u32 = 1;

/// Seconds the helper waits between touches by default.
pub const DEFAULT_DELAY_SECS: f32 = 1.5;

/// Choose the next cell for the helper to touch.
///
/// Only cells that still disagree with the target are candidates, and cells
/// the helper already joined are skipped since touching again would withdraw
/// its contribution. Returns None when nothing is left to do.
pub fn choose_cell(board: &PatternBoard, helper: ParticipantId, rng: &mut Rng) -> Option<usize> {
    let weights: Vec<u32> = board
        .cells()
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            if board.matches(i) || cell.touched_by.contains(&helper) {
                0
            } else if cell.touched_by.is_empty() {
                PLAIN_WEIGHT
            } else {
                HUMAN_TOUCHED_WEIGHT
            }
        })
        .collect();
    rng.pick_weighted(&weights)
}

/// Owns the helper's single pending "thinking" timer.
#[derive(Debug, Clone)]
pub struct HelperDriver {
    id: ParticipantId,
    delay: f32,
    pending: Option<TaskHandle>,
}

impl HelperDriver {
    pub fn new(id: ParticipantId, delay: f32) -> Self {
        Self { id, delay: delay.max(0.0), pending: None }
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Schedule the next helper action. No-op while one is already pending.
    pub fn arm<T: Clone>(&mut self, timers: &mut Scheduler<T>, task: T) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(timers.once(self.delay, task));
        true
    }

    /// The pending action was delivered by the scheduler.
    pub fn fired(&mut self) {
        self.pending = None;
    }

    pub fn cancel<T: Clone>(&mut self, timers: &mut Scheduler<T>) {
        if let Some(handle) = self.pending.take() {
            timers.cancel(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::TargetPattern;

    const HUMAN: ParticipantId = ParticipantId(0);
    const HELPER: ParticipantId = ParticipantId(1);

    fn board(active: &[bool], cols: usize, rows: usize) -> PatternBoard {
        PatternBoard::new(TargetPattern::from_active(cols, rows, active), 2)
    }

    #[test]
    fn never_picks_a_matching_cell() {
        let b = board(&[true, false, false, true, false, false], 3, 2);
        let mut rng = Rng::new(12);
        for _ in 0..500 {
            let i = choose_cell(&b, HELPER, &mut rng).unwrap();
            assert!(i == 0 || i == 3, "picked matching cell {}", i);
        }
    }

    #[test]
    fn nothing_to_do_on_a_solved_board() {
        let b = board(&[false, false, false, false], 2, 2);
        assert_eq!(choose_cell(&b, HELPER, &mut Rng::new(1)), None);
    }

    #[test]
    fn prefers_cells_a_human_touched() {
        let mut b = board(&[true, true], 2, 1);
        b.touch(1, HUMAN).unwrap();
        let mut rng = Rng::new(77);
        let picks = 4000;
        let human_cell = (0..picks)
            .filter(|_| choose_cell(&b, HELPER, &mut rng) == Some(1))
            .count();
        // Expected share is 3/4.
        assert!(human_cell > picks * 65 / 100, "human-touched picked {} of {}", human_cell, picks);
        assert!(human_cell < picks * 85 / 100);
    }

    #[test]
    fn skips_cells_it_already_joined() {
        let mut b = board(&[true, true], 2, 1);
        b.touch(0, HELPER).unwrap();
        let mut rng = Rng::new(5);
        for _ in 0..100 {
            assert_eq!(choose_cell(&b, HELPER, &mut rng), Some(1));
        }
    }

    #[test]
    fn only_one_action_pending_at_a_time() {
        let mut timers: Scheduler<u8> = Scheduler::new();
        let mut driver = HelperDriver::new(HELPER, 0.5);
        assert!(driver.arm(&mut timers, 1));
        assert!(!driver.arm(&mut timers, 1));
        assert_eq!(timers.len(), 1);

        assert_eq!(timers.advance(0.6), vec![1]);
        driver.fired();
        assert!(driver.arm(&mut timers, 1));
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn cancel_drops_the_pending_action() {
        let mut timers: Scheduler<u8> = Scheduler::new();
        let mut driver = HelperDriver::new(HELPER, 0.5);
        driver.arm(&mut timers, 1);
        driver.cancel(&mut timers);
        assert!(!driver.is_pending());
        assert!(timers.advance(1.0).is_empty());
    }
}
