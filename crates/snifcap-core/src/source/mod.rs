mod text;

pub use text::TextLineSource;

use thiserror::Error;

/// Sequential access to the physical lines of a finite text dump.
///
/// `next_line` yields `Ok(None)` once the input is exhausted; that is the
/// only end-of-input signal, genuine failures are always `Err`.
pub trait LineSource {
    fn next_line(&mut self) -> Result<Option<RawLine>, SourceError>;

    /// Total input size in bytes, `0` when unknown (pipes, fifos).
    fn total_bytes(&self) -> u64;
}

/// One physical line, decoded best-effort to text.
#[derive(Debug, Clone)]
pub struct RawLine {
    pub text: String,
    /// Raw byte length including the line terminator.
    pub byte_len: usize,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
