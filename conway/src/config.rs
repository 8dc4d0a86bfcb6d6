// config.rs - Run configuration passed through from drivers

use crate::control::Pacing;
use crate::partition::Strategy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub workers:     usize,
    pub strategy:    Strategy,
    /// `None` runs until a stop is requested.
    pub generations: Option<u64>,
    pub pacing:      Pacing,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers:     1,
            strategy:    Strategy::RowSlice,
            generations: Some(1),
            pacing:      Pacing::Free,
        }
    }
}

impl RunConfig {
    pub fn new(workers: usize, strategy: Strategy, generations: u64) -> Self {
        Self { workers, strategy, generations: Some(generations), ..Self::default() }
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn generations(mut self, generations: Option<u64>) -> Self {
        self.generations = generations;
        self
    }

    pub fn pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Whether generation number `completed` (zero-based) is still within the limit.
    pub(crate) fn within_limit(&self, completed: u64) -> bool {
        self.generations.is_none_or(|limit| completed < limit)
    }
}
