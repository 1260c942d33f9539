use crate::utils::constants::RECORD_TERMINATOR;

/// An owned, terminator-aligned slice of the input.
///
/// The buffer may be larger than `len`; only `buffer[..len]` holds records,
/// and when non-empty its last byte is the record terminator. A chunk is
/// moved into exactly one worker and dropped when that worker returns, so a
/// buffer can never be refilled while it is still being scanned.
#[derive(Debug)]
pub struct RawChunk {
    buffer: Vec<u8>,
    len: usize,
    start_offset: u64,
}

impl RawChunk {
    pub fn new(buffer: Vec<u8>, len: usize, start_offset: u64) -> Self {
        debug_assert!(len <= buffer.len());
        debug_assert!(len == 0 || buffer[len - 1] == RECORD_TERMINATOR);
        Self {
            buffer,
            len,
            start_offset,
        }
    }

    /// Copy `data` into a chunk of its own; used by tests and benches.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            buffer: data.to_vec(),
            len: data.len(),
            start_offset: 0,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Absolute input position of the first byte
    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }
}
