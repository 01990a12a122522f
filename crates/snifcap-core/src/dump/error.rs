use thiserror::Error;

use crate::source::SourceError;

/// A line classified as packet data that could not be decoded.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: unparsable packet offset")]
    InvalidOffset { line: u64 },
    #[error("line {line}: no hex payload found")]
    MissingPayload { line: u64, offset: usize },
    #[error("line {line}: invalid hex payload: {source}")]
    InvalidHex {
        line: u64,
        offset: usize,
        #[source]
        source: hex::FromHexError,
    },
}

impl ParseError {
    /// 1-based source line number of the offending line.
    pub fn line(&self) -> u64 {
        match self {
            ParseError::InvalidOffset { line }
            | ParseError::MissingPayload { line, .. }
            | ParseError::InvalidHex { line, .. } => *line,
        }
    }

    /// Offset of the offending line, when it could be decoded.
    pub fn offset(&self) -> Option<usize> {
        match self {
            ParseError::InvalidOffset { .. } => None,
            ParseError::MissingPayload { offset, .. } | ParseError::InvalidHex { offset, .. } => {
                Some(*offset)
            }
        }
    }
}

/// Unrecognized header-line layout. Never fatal: callers log it and fall
/// back to placeholder values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("cannot recognize time format")]
    Timestamp,
    #[error("invalid calendar timestamp")]
    Calendar,
    #[error("cannot recognize interface and/or direction format")]
    Interface,
}

#[derive(Debug, Error)]
pub enum DumpError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}
