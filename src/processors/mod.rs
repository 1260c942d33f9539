pub mod chunk_aggregator;
pub mod parallel_processor;
pub mod result_merger;
pub mod worker_pool;

pub use chunk_aggregator::ChunkAggregator;
pub use parallel_processor::{ParallelProcessor, ProcessingSummary};
pub use result_merger::ResultMerger;
pub use worker_pool::{DispatchStats, WorkerPool};
