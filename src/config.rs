use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::error::Result;
use crate::utils::constants::{
    default_merge_threads, default_workers, DEFAULT_CHUNK_SIZE, ENV_PREFIX, MIN_CHUNK_SIZE,
};

/// What to do with trailing bytes that have no record terminator at end of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinalRecordPolicy {
    /// Fail the run with `UnterminatedRecord`
    #[default]
    Reject,
    /// Treat the trailing bytes as one last record
    Accept,
}

impl FinalRecordPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinalRecordPolicy::Reject => "reject",
            FinalRecordPolicy::Accept => "accept",
        }
    }
}

/// Tunables for the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PipelineConfig {
    /// Size of each read buffer; must exceed the longest record
    #[validate(range(min = MIN_CHUNK_SIZE))]
    pub chunk_size: usize,

    #[validate(range(min = 1))]
    pub workers: usize,

    /// Chunks that may wait for a worker before the reader runs one itself
    #[validate(range(min = 1))]
    pub queue_capacity: usize,

    #[serde(default)]
    pub final_record: FinalRecordPolicy,

    #[validate(range(min = 1))]
    pub merge_threads: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let workers = default_workers();
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            workers,
            queue_capacity: workers,
            final_record: FinalRecordPolicy::Reject,
            merge_threads: default_merge_threads(),
        }
    }
}

impl PipelineConfig {
    /// Layer defaults, an optional config file and `MEASUREMENTS_*`
    /// environment variables, then validate the result.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();

        let mut builder = Config::builder()
            .set_default("chunk_size", defaults.chunk_size as i64)?
            .set_default("workers", defaults.workers as i64)?
            .set_default("queue_capacity", defaults.queue_capacity as i64)?
            .set_default("final_record", defaults.final_record.as_str())?
            .set_default("merge_threads", defaults.merge_threads as i64)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let config: PipelineConfig = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn with_final_record(mut self, final_record: FinalRecordPolicy) -> Self {
        self.final_record = final_record;
        self
    }

    pub fn with_merge_threads(mut self, merge_threads: usize) -> Self {
        self.merge_threads = merge_threads;
        self
    }
}
