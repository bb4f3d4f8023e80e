//! Diversity Injection
//!
//! Gives a random subset of events a small flat boost so that rankings do not
//! collapse onto the same handful of popular events every time.
//!
//! ## Algorithm
//! 1. Draw one uniform number `u` in [0, 1)
//! 2. If `u < probability` (default 0.3) return `boost` (default 0.2)
//! 3. Otherwise return 0.0
//!
//! The draw comes from a [`RandomSource`] so tests can replay a fixed seed.

use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Default chance that an event receives the boost
pub const DEFAULT_DIVERSITY_PROBABILITY: f64 = 0.3;

/// Default boost value
pub const DEFAULT_DIVERSITY_BOOST: f64 = 0.2;

/// Source of uniform draws in [0, 1).
pub trait RandomSource: Send + Sync {
    fn next_unit(&self) -> f64;
}

/// Thread-local generator, for production use.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Deterministic generator seeded once; identical seeds replay identical draws.
///
/// Shared behind a `Mutex` so one seeded source can serve a whole request
/// sequence in order.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&self) -> f64 {
        // A panic mid-draw cannot leave the generator in a torn state
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.random::<f64>()
    }
}

/// Produces the randomized diversity component of the final score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiversityInjector {
    probability: f64,
    boost: f64,
}

impl DiversityInjector {
    pub fn new() -> Self {
        Self {
            probability: DEFAULT_DIVERSITY_PROBABILITY,
            boost: DEFAULT_DIVERSITY_BOOST,
        }
    }

    /// Configure the boost probability (default: 0.3)
    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = probability;
        self
    }

    /// Configure the boost value (default: 0.2)
    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = boost;
        self
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// One draw: `boost` with probability `probability`, else 0.0.
    pub fn boost(&self, random: &dyn RandomSource) -> f64 {
        if random.next_unit() < self.probability {
            self.boost
        } else {
            0.0
        }
    }
}

impl Default for DiversityInjector {
    fn default() -> Self {
        Self::new()
    }
}
