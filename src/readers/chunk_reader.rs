use memchr::memrchr;
use std::io::{ErrorKind, Read};
use tracing::warn;

use crate::config::FinalRecordPolicy;
use crate::error::{ProcessingError, Result};
use crate::models::RawChunk;
use crate::utils::constants::{DEFAULT_CHUNK_SIZE, RECORD_TERMINATOR};

/// Splits a byte source into terminator-aligned chunks.
///
/// Each fill starts after the leftover bytes carried from the previous
/// buffer. Every chunk gets its own freshly allocated buffer, so a chunk
/// handed to a worker is never written again.
pub struct ChunkReader<R> {
    source: R,
    chunk_size: usize,
    final_record: FinalRecordPolicy,
    buffer: Vec<u8>,
    carried: usize,
    offset: u64,
    eof: bool,
    finished: bool,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(source: R, chunk_size: usize) -> Self {
        Self {
            source,
            chunk_size,
            final_record: FinalRecordPolicy::Reject,
            buffer: vec![0; chunk_size],
            carried: 0,
            offset: 0,
            eof: false,
            finished: false,
        }
    }

    pub fn with_default_chunk_size(source: R) -> Self {
        Self::new(source, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_final_record(mut self, policy: FinalRecordPolicy) -> Self {
        self.final_record = policy;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Bytes handed out in chunks so far
    pub fn bytes_consumed(&self) -> u64 {
        self.offset
    }

    /// Read until the buffer is full or the source is exhausted.
    fn fill(&mut self) -> Result<usize> {
        let mut total = 0;
        while !self.eof && self.carried + total < self.buffer.len() {
            match self.source.read(&mut self.buffer[self.carried + total..]) {
                Ok(0) => self.eof = true,
                Ok(n) => total += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(total)
    }

    fn next_chunk(&mut self) -> Result<Option<RawChunk>> {
        if self.chunk_size == 0 {
            return Err(ProcessingError::Config(
                "chunk size must be greater than zero".to_string(),
            ));
        }

        let filled = self.carried + self.fill()?;
        if filled == 0 {
            return Ok(None);
        }

        let Some(last_terminator) = memrchr(RECORD_TERMINATOR, &self.buffer[..filled]) else {
            if !self.eof {
                return Err(ProcessingError::OversizedRecord {
                    buffer_size: self.chunk_size,
                });
            }
            return self.finish_unterminated(filled);
        };

        let end = last_terminator + 1;
        let leftover = filled - end;

        let mut next = vec![0; self.chunk_size];
        next[..leftover].copy_from_slice(&self.buffer[end..filled]);
        let buffer = std::mem::replace(&mut self.buffer, next);

        let chunk = RawChunk::new(buffer, end, self.offset);
        self.offset += end as u64;
        self.carried = leftover;

        Ok(Some(chunk))
    }

    /// `filled` bytes remain at end of input with no terminator.
    fn finish_unterminated(&mut self, filled: usize) -> Result<Option<RawChunk>> {
        match self.final_record {
            FinalRecordPolicy::Reject => Err(ProcessingError::UnterminatedRecord { length: filled }),
            FinalRecordPolicy::Accept => {
                warn!(
                    offset = self.offset,
                    length = filled,
                    "Accepting unterminated final record"
                );
                let mut buffer = std::mem::take(&mut self.buffer);
                buffer.truncate(filled);
                buffer.push(RECORD_TERMINATOR);

                let len = buffer.len();
                let chunk = RawChunk::new(buffer, len, self.offset);
                self.offset += filled as u64;
                self.carried = 0;

                Ok(Some(chunk))
            }
        }
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = Result<RawChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.next_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
