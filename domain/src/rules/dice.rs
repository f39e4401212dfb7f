//! Percentile dice.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Source of percentile rolls in `[0, 100)`.
pub trait PercentileDie: Send + Sync {
    fn roll(&self) -> u8;
}

/// Roll a percentile die with the given RNG.
pub fn roll_percentile<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.gen_range(0..100)
}

/// Die backed by a standard RNG, optionally seeded for replays.
pub struct RandomDie {
    rng: Mutex<StdRng>,
}

impl RandomDie {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomDie {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl PercentileDie for RandomDie {
    fn roll(&self) -> u8 {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        roll_percentile(&mut *rng)
    }
}

/// Die that always shows the same face.
#[derive(Debug, Clone, Copy)]
pub struct FixedDie(pub u8);

impl PercentileDie for FixedDie {
    fn roll(&self) -> u8 {
        self.0
    }
}
