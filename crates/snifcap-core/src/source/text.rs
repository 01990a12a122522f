use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

use super::{LineSource, RawLine, SourceError};

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Line source over any buffered reader (file, in-memory upload, ...).
///
/// Malformed UTF-8 is replaced rather than rejected: vendor dumps regularly
/// carry stray bytes in their ASCII columns.
pub struct TextLineSource<R> {
    reader: R,
    total_bytes: u64,
    buf: Vec<u8>,
}

impl TextLineSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        // Size is only used for progress reporting.
        let total_bytes = file.metadata().map(|meta| meta.len()).unwrap_or(0);
        Ok(Self::new(
            BufReader::with_capacity(READ_BUFFER_SIZE, file),
            total_bytes,
        ))
    }
}

impl<'a> TextLineSource<Cursor<&'a [u8]>> {
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self::new(Cursor::new(bytes), bytes.len() as u64)
    }
}

impl<R: BufRead> TextLineSource<R> {
    pub fn new(reader: R, total_bytes: u64) -> Self {
        Self {
            reader,
            total_bytes,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> LineSource for TextLineSource<R> {
    fn next_line(&mut self) -> Result<Option<RawLine>, SourceError> {
        self.buf.clear();
        let read = self.reader.read_until(b'\n', &mut self.buf)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(RawLine {
            text: String::from_utf8_lossy(&self.buf).into_owned(),
            byte_len: read,
        }))
    }

    fn total_bytes(&self) -> u64 {
        self.total_bytes
    }
}
