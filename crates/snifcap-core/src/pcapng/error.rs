use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("option {code} value too long: {len} bytes")]
    OptionTooLong { code: u16, len: usize },
    #[error("packet too long: {len} bytes")]
    PacketTooLong { len: usize },
    #[error("block too long: {len} bytes")]
    BlockTooLong { len: usize },
}

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding error: {0}")]
    Encode(#[from] EncodeError),
    #[error("maximum packets per file must be at least 1")]
    InvalidCapacity,
    #[error("output file is closed")]
    Closed,
}
