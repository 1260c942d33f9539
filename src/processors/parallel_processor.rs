use crate::config::{FinalRecordPolicy, PipelineConfig};
use crate::error::Result;
use crate::models::{FinalResult, PartialResult, RawChunk};
use crate::processors::{ChunkAggregator, DispatchStats, ResultMerger, WorkerPool};
use crate::readers::ChunkReader;
use crate::utils::progress::ProgressReporter;
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use validator::Validate;

/// Totals for one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingSummary {
    pub bytes: u64,
    pub chunks: u64,
    pub records: u64,
    pub stations: usize,
    pub dispatch: DispatchStats,
    pub elapsed: Duration,
}

impl ProcessingSummary {
    pub fn summary(&self) -> String {
        format!(
            "Processed {} records for {} stations\n\
             Input: {} bytes in {} chunks ({} queued, {} run inline)\n\
             Elapsed: {:.3}s",
            self.records,
            self.stations,
            self.bytes,
            self.chunks,
            self.dispatch.queued,
            self.dispatch.inline,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Drives the reader, worker pool and merger over one input.
pub struct ParallelProcessor {
    config: PipelineConfig,
}

impl ParallelProcessor {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.config.queue_capacity = queue_capacity;
        self
    }

    pub fn with_final_record(mut self, final_record: FinalRecordPolicy) -> Self {
        self.config.final_record = final_record;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process a measurements file, reporting byte progress if requested
    pub fn process_file(
        &self,
        path: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<(FinalResult, ProcessingSummary)> {
        let file = File::open(path)?;
        info!(path = %path.display(), "Processing measurements file");
        self.process(file, progress)
    }

    /// Read `source` to the end and aggregate every record in it.
    ///
    /// Any read, split or parse failure aborts the run; no partial result is
    /// returned. The configuration is validated before any input is read.
    pub fn process<R: Read>(
        &self,
        source: R,
        progress: Option<&ProgressReporter>,
    ) -> Result<(FinalResult, ProcessingSummary)> {
        let started = Instant::now();
        let config = &self.config;
        config.validate()?;
        info!(
            chunk_size = config.chunk_size,
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            final_record = config.final_record.as_str(),
            "Starting aggregation"
        );

        let mut reader =
            ChunkReader::new(source, config.chunk_size).with_final_record(config.final_record);
        let aggregator = ChunkAggregator::new();
        let work = |chunk: RawChunk| aggregator.aggregate(&chunk);

        let (partials, dispatch) = thread::scope(|scope| -> Result<_> {
            let mut pool =
                WorkerPool::start(scope, config.workers, config.queue_capacity, &work)?;
            let mut partials = Vec::new();

            for chunk in reader.by_ref() {
                let chunk = chunk?;
                debug!(
                    offset = chunk.start_offset(),
                    len = chunk.len(),
                    "Dispatching chunk"
                );
                if let Some(p) = progress {
                    p.increment(chunk.len() as u64);
                }

                pool.submit(chunk)?;
                collect_partials(pool.drain_completed(), &mut partials)?;
            }

            let (remaining, dispatch) = pool.finish()?;
            collect_partials(remaining, &mut partials)?;
            Ok((partials, dispatch))
        })?;

        if let Some(p) = progress {
            p.set_message("Merging partial results...");
        }

        let merger = ResultMerger::new(config.merge_threads);
        let result = merger.merge_parallel(partials)?;

        let summary = ProcessingSummary {
            bytes: reader.bytes_consumed(),
            chunks: dispatch.submitted,
            records: result.record_count(),
            stations: result.len(),
            dispatch,
            elapsed: started.elapsed(),
        };

        info!(
            records = summary.records,
            stations = summary.stations,
            chunks = summary.chunks,
            inline = summary.dispatch.inline,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Aggregation complete"
        );

        if let Some(p) = progress {
            p.finish_with_message(&format!("Processed {} records", summary.records));
        }

        Ok((result, summary))
    }
}

impl Default for ParallelProcessor {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

/// Keep successful partials; the first failed chunk fails the run.
fn collect_partials(
    outputs: Vec<Result<PartialResult>>,
    partials: &mut Vec<PartialResult>,
) -> Result<()> {
    for output in outputs {
        partials.push(output?);
    }
    Ok(())
}
