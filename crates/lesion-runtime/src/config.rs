/// Knobs for a [`Controller`](crate::Controller).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Threads in the worker pool shared by model loads and predictions.
    pub worker_threads: usize,

    /// Predictions queued or running at once before `submit` reports busy.
    pub max_in_flight: usize,

    /// Seed for patch sampling. `None` draws from OS entropy per prediction.
    pub seed: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: 2,
            max_in_flight: 4,
            seed: None,
        }
    }
}

impl RuntimeConfig {
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.max_in_flight = limit;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}
