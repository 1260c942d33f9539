pub mod chunk;
pub mod station_stats;

pub use chunk::RawChunk;
pub use station_stats::{FinalResult, PartialResult, StationKey, StationStats};
