use memchr::{memchr, memchr2};

use crate::error::{ProcessingError, Result};
use crate::models::RawChunk;
use crate::utils::constants::{FIELD_SEPARATOR, RECORD_TERMINATOR};

/// Iterates `(station, temperature)` field pairs of a terminator-aligned chunk.
///
/// Both fields borrow from the chunk; nothing is copied here. Scanning stops
/// after the first malformed record.
pub struct LineScanner<'a> {
    data: &'a [u8],
    position: usize,
    base_offset: u64,
}

impl<'a> LineScanner<'a> {
    pub fn new(data: &'a [u8], base_offset: u64) -> Self {
        Self {
            data,
            position: 0,
            base_offset,
        }
    }

    pub fn for_chunk(chunk: &'a RawChunk) -> Self {
        Self::new(chunk.data(), chunk.start_offset())
    }

    fn fail(&mut self, record_start: usize, message: &str) -> Option<Result<(&'a [u8], &'a [u8])>> {
        self.position = self.data.len();
        Some(Err(ProcessingError::malformed(
            self.base_offset + record_start as u64,
            message,
        )))
    }
}

impl<'a> Iterator for LineScanner<'a> {
    type Item = Result<(&'a [u8], &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.data.len() {
            return None;
        }

        let data = self.data;
        let start = self.position;
        let rest = &data[start..];

        // first separator or terminator, whichever comes first
        let separator = match memchr2(FIELD_SEPARATOR, RECORD_TERMINATOR, rest) {
            Some(idx) if rest[idx] == FIELD_SEPARATOR => idx,
            Some(_) => return self.fail(start, "missing field separator"),
            None => return self.fail(start, "missing record terminator"),
        };
        if separator == 0 {
            return self.fail(start, "record begins with a field separator");
        }

        let field_start = separator + 1;
        let field_len = match memchr(RECORD_TERMINATOR, &rest[field_start..]) {
            Some(len) => len,
            None => return self.fail(start, "missing record terminator"),
        };

        self.position = start + field_start + field_len + 1;
        Some(Ok((
            &rest[..separator],
            &rest[field_start..field_start + field_len],
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(data: &[u8]) -> Result<Vec<(String, String)>> {
        LineScanner::new(data, 0)
            .map(|pair| {
                pair.map(|(station, field)| {
                    (
                        String::from_utf8_lossy(station).into_owned(),
                        String::from_utf8_lossy(field).into_owned(),
                    )
                })
            })
            .collect()
    }

    #[test]
    fn test_scan_records() {
        let records = collect(b"A;1.0\nB;2.0\nC;3.0\n").unwrap();

        assert_eq!(
            records,
            vec![
                ("A".to_string(), "1.0".to_string()),
                ("B".to_string(), "2.0".to_string()),
                ("C".to_string(), "3.0".to_string()),
            ]
        );
    }

    #[test]
    fn test_station_may_contain_non_ascii_and_spaces() {
        let records = collect("São Paulo;25.1\nİzmir;-3.4\n".as_bytes()).unwrap();

        assert_eq!(records[0].0, "São Paulo");
        assert_eq!(records[1], ("İzmir".to_string(), "-3.4".to_string()));
    }

    #[test]
    fn test_temperature_field_stops_at_terminator() {
        let records = collect(b"A;1.0;extra\n").unwrap();
        assert_eq!(records[0].1, "1.0;extra");
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(collect(b"").unwrap().is_empty());
    }

    #[test]
    fn test_record_starting_with_separator() {
        let mut scanner = LineScanner::new(b"A;1.0\n;2.0\n", 100);
        assert!(scanner.next().unwrap().is_ok());

        match scanner.next() {
            Some(Err(ProcessingError::MalformedRecord { offset, .. })) => assert_eq!(offset, 106),
            other => panic!("unexpected scan result: {:?}", other),
        }
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_missing_separator_and_terminator() {
        assert!(matches!(
            collect(b"no separator\n"),
            Err(ProcessingError::MalformedRecord { .. })
        ));
        assert!(matches!(
            collect(b"A;1.0"),
            Err(ProcessingError::MalformedRecord { .. })
        ));
        assert!(matches!(
            collect(b"\n"),
            Err(ProcessingError::MalformedRecord { .. })
        ));
    }
}
