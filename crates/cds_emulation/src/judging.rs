//! Randomness behind simulated judging progress.
//!
//! Synthesis draws three kinds of values: the first judged fraction, the
//! fraction increment per step, and the time jitter per step. They come
//! from a [`ProgressSource`] so tests can script exact sequences.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;
use std::time::Duration;

/// Upper bound (exclusive) of the first judged fraction
pub const INITIAL_FRACTION_LIMIT: f64 = 0.1;

/// Upper bound (exclusive) of a single fraction increment
pub const FRACTION_STEP_LIMIT: f64 = 1.0;

/// Upper bound (exclusive) of a single jitter draw, in milliseconds
pub const JITTER_LIMIT_MS: u64 = 20_000;

/// Source of judging progress draws
pub trait ProgressSource {
    /// First judged fraction, in `[0, INITIAL_FRACTION_LIMIT)`
    fn initial_fraction(&mut self) -> f64;

    /// Fraction increment, in `[0, FRACTION_STEP_LIMIT)`
    fn fraction_step(&mut self) -> f64;

    /// Time jitter added per step, whole milliseconds below `JITTER_LIMIT_MS`
    fn jitter(&mut self) -> Duration;
}

/// Uniform random draws from a seedable RNG
#[derive(Debug, Clone)]
pub struct RandomProgress<R = ChaCha8Rng> {
    rng: R,
}

impl RandomProgress<ChaCha8Rng> {
    /// Seed from OS entropy
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(ChaCha8Rng::from_entropy())
    }

    /// Seed from a fixed value
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Seeded when a seed is given, entropy otherwise
    #[must_use]
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }
}

impl<R: Rng> RandomProgress<R> {
    /// Wrap an RNG
    #[must_use]
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> ProgressSource for RandomProgress<R> {
    fn initial_fraction(&mut self) -> f64 {
        self.rng.gen_range(0.0..INITIAL_FRACTION_LIMIT)
    }

    fn fraction_step(&mut self) -> f64 {
        self.rng.gen_range(0.0..FRACTION_STEP_LIMIT)
    }

    fn jitter(&mut self) -> Duration {
        Duration::from_millis(self.rng.gen_range(0..JITTER_LIMIT_MS))
    }
}

/// Fixed sequences of draws
///
/// Once a sequence runs out it falls back to a value that ends judging
/// quickly: initial fraction 0, step 1.0, jitter 0.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProgress {
    initial: VecDeque<f64>,
    steps: VecDeque<f64>,
    jitter: VecDeque<Duration>,
}

impl ScriptedProgress {
    /// Create with empty sequences
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial fractions, one per judged run
    #[must_use]
    pub fn with_initial(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.initial = values.into_iter().collect();
        self
    }

    /// Set the fraction increments
    #[must_use]
    pub fn with_steps(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.steps = values.into_iter().collect();
        self
    }

    /// Set the jitter draws in milliseconds
    #[must_use]
    pub fn with_jitter_ms(mut self, values: impl IntoIterator<Item = u64>) -> Self {
        self.jitter = values.into_iter().map(Duration::from_millis).collect();
        self
    }
}

impl ProgressSource for ScriptedProgress {
    fn initial_fraction(&mut self) -> f64 {
        self.initial.pop_front().unwrap_or(0.0)
    }

    fn fraction_step(&mut self) -> f64 {
        self.steps.pop_front().unwrap_or(FRACTION_STEP_LIMIT)
    }

    fn jitter(&mut self) -> Duration {
        self.jitter.pop_front().unwrap_or(Duration::ZERO)
    }
}
