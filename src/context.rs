//! Execution context: the caller's frozen clock and a seeded id source

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic time provider with a frozen time value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeterministicTime {
    current_time: DateTime<Utc>,
}

impl DeterministicTime {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self { current_time: time }
    }

    /// Get the current frozen time
    pub fn current(&self) -> DateTime<Utc> {
        self.current_time
    }
}

/// Seeded random number generator for reproducible ids
#[derive(Debug)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
    seed: u64,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn next_u64(&mut self) -> u64 {
        self.rng.gen()
    }
}

impl Clone for SeededRandom {
    fn clone(&self) -> Self {
        // Restart from the seed so a cloned context reproduces the same ids
        Self::new(self.seed)
    }
}

/// Execution context handed to every engine operation
///
/// Trade expiry and auction cutoffs compare stored deadlines against
/// [`ExecutionContext::now`]; nothing in the engine reads the system clock.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    deterministic_time: DeterministicTime,
    seeded_random: SeededRandom,
}

impl ExecutionContext {
    /// Create a new execution context with specified time and random seed
    pub fn new(time: DateTime<Utc>, random_seed: u64) -> Self {
        Self {
            deterministic_time: DeterministicTime::new(time),
            seeded_random: SeededRandom::new(random_seed),
        }
    }

    pub fn builder() -> ExecutionContextBuilder {
        ExecutionContextBuilder::new()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.deterministic_time.current()
    }

    /// Move the clock without restarting the id sequence
    pub fn advance_to(&mut self, time: DateTime<Utc>) {
        self.deterministic_time = DeterministicTime::new(time);
    }

    /// Next id in the seeded sequence, e.g. `trade-3f2a9c0e1b7d4a55`
    pub fn next_id(&mut self, prefix: &str) -> String {
        format!("{}-{:016x}", prefix, self.seeded_random.next_u64())
    }
}

/// Builder for constructing execution contexts
#[derive(Debug, Default)]
pub struct ExecutionContextBuilder {
    time: Option<DateTime<Utc>>,
    random_seed: Option<u64>,
}

impl ExecutionContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Build the context. Time falls back to the Unix epoch, never to the
    /// system clock.
    pub fn build(self) -> ExecutionContext {
        let time = self.time.unwrap_or(DateTime::<Utc>::default());
        ExecutionContext::new(time, self.random_seed.unwrap_or(0))
    }
}
