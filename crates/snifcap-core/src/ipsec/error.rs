use thiserror::Error;

use crate::source::SourceError;

#[derive(Debug, Error)]
pub enum IpsecError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A cipher or hash absent from the esp_sa whitelist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnsupportedAlgorithm {
    #[error("unknown cipher ({code}, {key_len})")]
    Cipher { code: String, key_len: String },
    #[error("unknown hash ({code}, {key_len})")]
    Hash { code: String, key_len: String },
}

/// A direction line whose field does not carry the expected prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown line format ({field})")]
pub struct FieldError {
    pub field: &'static str,
}
