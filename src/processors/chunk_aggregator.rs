use crate::error::Result;
use crate::models::{PartialResult, RawChunk};
use crate::readers::{parse_temperature, LineScanner};
use crate::utils::constants::DEFAULT_PARTIAL_CAPACITY;

/// Builds the per-station statistics of a single chunk.
#[derive(Debug, Clone, Copy)]
pub struct ChunkAggregator {
    capacity: usize,
}

impl ChunkAggregator {
    pub fn new() -> Self {
        Self {
            capacity: DEFAULT_PARTIAL_CAPACITY,
        }
    }

    /// Expected number of distinct stations per chunk
    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity }
    }

    pub fn aggregate(&self, chunk: &RawChunk) -> Result<PartialResult> {
        self.aggregate_records(LineScanner::for_chunk(chunk))
    }

    /// Aggregate terminator-aligned bytes that are not wrapped in a chunk.
    pub fn aggregate_bytes(&self, data: &[u8]) -> Result<PartialResult> {
        self.aggregate_records(LineScanner::new(data, 0))
    }

    fn aggregate_records(&self, scanner: LineScanner<'_>) -> Result<PartialResult> {
        let mut partial = PartialResult::with_capacity(self.capacity);
        for record in scanner {
            let (station, field) = record?;
            partial.record(station, parse_temperature(field)?);
        }
        Ok(partial)
    }
}

impl Default for ChunkAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use crate::models::StationStats;

    #[test]
    fn test_aggregate_single_station() {
        let chunk = RawChunk::from_bytes(b"A;10.0\nA;-5.0\nA;20.0\n");
        let partial = ChunkAggregator::new().aggregate(&chunk).unwrap();

        assert_eq!(partial.len(), 1);
        assert_eq!(
            *partial.get(b"A").unwrap(),
            StationStats {
                min: -50,
                max: 200,
                sum: 250,
                count: 3
            }
        );
    }

    #[test]
    fn test_aggregate_interleaved_stations() {
        let partial = ChunkAggregator::with_capacity(4)
            .aggregate_bytes(b"Oslo;-3.1\nLima;19.4\nOslo;-7.9\nLima;21.0\nOslo;0.0\n")
            .unwrap();

        assert_eq!(partial.len(), 2);
        assert_eq!(partial.record_count(), 5);

        let oslo = partial.get(b"Oslo").unwrap();
        assert_eq!((oslo.min, oslo.max, oslo.sum), (-79, 0, -110));

        let lima = partial.get(b"Lima").unwrap();
        assert_eq!((lima.min, lima.max, lima.count), (194, 210, 2));
    }

    #[test]
    fn test_invalid_temperature_aborts_chunk() {
        let chunk = RawChunk::from_bytes(b"A;1.0\nB;1.05\n");

        assert!(matches!(
            ChunkAggregator::new().aggregate(&chunk),
            Err(ProcessingError::InvalidTemperature { .. })
        ));
    }

    #[test]
    fn test_empty_chunk_gives_empty_partial() {
        let partial = ChunkAggregator::new().aggregate_bytes(b"").unwrap();
        assert!(partial.is_empty());
    }
}
