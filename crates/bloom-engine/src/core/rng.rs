//! Seedable pseudo-random number generator (xorshift64).
//! Deterministic and allocation-free, so a level can be replayed from its seed.

/// Seedable pseudo-random number generator (xorshift64).
#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Rng {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Random index in [0, len).
    pub fn next_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.next_u64() % len as u64) as usize
    }

    /// Uniform float in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        // Top 24 bits fill the f32 mantissa exactly.
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Fair coin with probability `p` of returning true.
    pub fn chance(&mut self, p: f32) -> bool {
        self.next_f32() < p
    }

    /// Fisher-Yates shuffle. Every permutation is reachable.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_index(i + 1);
            items.swap(i, j);
        }
    }

    /// Pick an index with probability proportional to its weight.
    /// Returns None when every weight is zero or the slice is empty.
    pub fn pick_weighted(&mut self, weights: &[u32]) -> Option<usize> {
        let total: u64 = weights.iter().map(|&w| w as u64).sum();
        if total == 0 {
            return None;
        }
        let mut roll = self.next_u64() % total;
        for (i, &w) in weights.iter().enumerate() {
            if roll < w as u64 {
                return Some(i);
            }
            roll -= w as u64;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn rng_deterministic() {
        let mut rng1 = Rng::new(42);
        let mut rng2 = Rng::new(42);
        for _ in 0..10 {
            assert_eq!(rng1.next_index(1000), rng2.next_index(1000));
        }
    }

    #[test]
    fn rng_zero_seed_handled() {
        let mut rng = Rng::new(0);
        assert_ne!(rng.next_u64(), 0);
        assert_eq!(rng.next_index(0), 0);
    }

    #[test]
    fn shuffle_reaches_every_ordering_of_four() {
        let mut rng = Rng::new(7);
        let mut seen = HashSet::new();
        for _ in 0..2000 {
            let mut dirs = [0u8, 1, 2, 3];
            rng.shuffle(&mut dirs);
            seen.insert(dirs);
        }
        assert_eq!(seen.len(), 24);
    }

    #[test]
    fn next_f32_in_unit_range() {
        let mut rng = Rng::new(99);
        for _ in 0..1000 {
            let v = rng.next_f32();
            assert!((0.0..1.0).contains(&v), "got {}", v);
        }
    }

    #[test]
    fn pick_weighted_skips_zero_weights() {
        let mut rng = Rng::new(3);
        for _ in 0..200 {
            assert_eq!(rng.pick_weighted(&[0, 5, 0]), Some(1));
        }
        assert_eq!(rng.pick_weighted(&[0, 0]), None);
        assert_eq!(rng.pick_weighted(&[]), None);
    }

    #[test]
    fn pick_weighted_favours_heavier_entries() {
        let mut rng = Rng::new(11);
        let mut counts = [0u32; 2];
        for _ in 0..4000 {
            if let Some(i) = rng.pick_weighted(&[1, 3]) {
                counts[i] += 1;
            }
        }
        assert!(counts[1] > counts[0] * 2, "counts {:?}", counts);
    }
}
