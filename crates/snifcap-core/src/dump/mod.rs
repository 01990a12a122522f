//! Vendor text-dump decoding.
//!
//! A sniffer dump interleaves free-form header lines with hex-dump lines
//! (`0x0010\t 4500 0034 ...\tE..4`). The parser classifies every physical
//! line, decodes packet-data lines into [`LineFragment`]s and, for the first
//! line of each packet (offset 0), recovers timestamp, interface and
//! direction from the preceding non-blank line.
//!
//! Layering follows the rest of the crate:
//! - `layout`: constants of the text format
//! - `reader`: line conventions (classification, normalization, payload column)
//! - `header`: header-line decoding (pure, reports [`FormatError`]s)
//! - `parser`: the stateful line-by-line decoder
//! - `error`: explicit, line-numbered errors

pub mod error;
pub mod header;
pub mod layout;
pub mod parser;
pub mod reader;

use serde::{Deserialize, Serialize};

pub use error::{DumpError, FormatError, ParseError};
pub use parser::DumpParser;

/// Accepted hex-dump line shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `0x` followed by exactly four hex digits and a space or tab.
    Strict,
    /// Also accepts bare `<hex>\t` offsets and `0x<hex>[ \t:]` (tcpdump -XX).
    #[default]
    Compatible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
    Unknown,
}

impl Direction {
    pub fn from_token(token: &str) -> Self {
        match token {
            "in" => Direction::In,
            "out" => Direction::Out,
            _ => Direction::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
            Direction::Unknown => "unknown",
        }
    }
}

/// Metadata attached to the first fragment of a packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketHeader {
    pub ts_sec: u64,
    pub ts_usec: u64,
    pub interface: String,
    pub direction: Direction,
    /// 1-based line number of the packet's offset-0 hex line.
    pub source_line: u64,
}

impl PacketHeader {
    /// Microseconds since the epoch, as stored in Enhanced Packet Blocks.
    pub fn timestamp_micros(&self) -> u64 {
        self.ts_sec
            .saturating_mul(1_000_000)
            .saturating_add(self.ts_usec)
    }
}

/// One decoded hex-dump line. `header` is present only when `offset == 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFragment {
    pub offset: usize,
    pub payload: Vec<u8>,
    pub header: Option<PacketHeader>,
}
