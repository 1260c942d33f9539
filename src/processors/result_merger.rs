use crate::error::{ProcessingError, Result};
use crate::models::{FinalResult, PartialResult};
use rayon::prelude::*;

/// Combines per-chunk partials into the sorted final result.
///
/// Merging is commutative and associative, so the order in which partials
/// arrive never changes the outcome.
pub struct ResultMerger {
    threads: usize,
}

impl ResultMerger {
    pub fn new(threads: usize) -> Self {
        Self { threads }
    }

    /// Fold partials one at a time into a fresh final result.
    pub fn merge<I>(&self, partials: I) -> FinalResult
    where
        I: IntoIterator<Item = PartialResult>,
    {
        let mut result = FinalResult::new();
        for partial in partials {
            result.absorb(partial);
        }
        result
    }

    /// Tree-reduce partials on a dedicated rayon pool, then build the final result once.
    pub fn merge_parallel(&self, partials: Vec<PartialResult>) -> Result<FinalResult> {
        if self.threads <= 1 || partials.len() < 2 {
            return Ok(self.merge(partials));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|index| format!("merge-worker-{index}"))
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        let combined = pool.install(|| {
            partials
                .into_par_iter()
                .reduce(PartialResult::default, |mut left, right| {
                    left.merge(right);
                    left
                })
        });

        Ok(FinalResult::from(combined))
    }
}

impl Default for ResultMerger {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}
