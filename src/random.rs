use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniformly distributed bytes for the RND instruction.
pub trait RandomSource {
    fn next_byte(&mut self) -> u8;
}

/// rand-backed source; seeded from the OS unless a seed is given
pub struct SystemRandom {
    rng: StdRng,
}

impl SystemRandom {
    pub fn new() -> Self {
        SystemRandom {
            rng: StdRng::from_os_rng(),
        }
    }

    /// same seed, same sequence
    pub fn seeded(seed: u64) -> Self {
        SystemRandom {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for SystemRandom {
    fn next_byte(&mut self) -> u8 {
        self.rng.random()
    }
}

/// Plays back a fixed list of bytes, cycling when it runs out. Mostly useful
/// for tests.
pub struct FixedSequence {
    bytes: Vec<u8>,
    next: usize,
}

impl FixedSequence {
    pub fn new(bytes: &[u8]) -> Self {
        FixedSequence {
            bytes: Vec::from(bytes),
            next: 0,
        }
    }
}

impl RandomSource for FixedSequence {
    fn next_byte(&mut self) -> u8 {
        if self.bytes.is_empty() {
            return 0;
        }
        let b = self.bytes[self.next % self.bytes.len()];
        self.next += 1;
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_sequence_cycles() {
        let mut r = FixedSequence::new(&[1, 2, 3]);
        let got: Vec<u8> = (0..5).map(|_| r.next_byte()).collect();
        assert_eq!(got, vec![1, 2, 3, 1, 2]);
    }

    #[test]
    fn test_empty_sequence_is_zero() {
        let mut r = FixedSequence::new(&[]);
        assert_eq!(r.next_byte(), 0);
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = SystemRandom::seeded(42);
        let mut b = SystemRandom::seeded(42);
        for _ in 0..32 {
            assert_eq!(a.next_byte(), b.next_byte());
        }
    }
}
