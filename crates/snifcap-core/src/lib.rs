//! snifcap core library: vendor sniffer text dumps to pcapng.
//!
//! The conversion pipeline is line oriented and single pass: a line source
//! feeds the dump parser, which decodes hex-dump lines into fragments; the
//! assembler merges fragments into packets; the conversion layer filters and
//! fixes up packets and hands Enhanced Packet Blocks to the pcapng writer,
//! which splits output across files when asked to. Tunnel keys are extracted
//! by an independent pass over the same dump (`ipsec`).
//!
//! Invariants:
//! - Packets are written in dump order, within and across output files.
//! - Interface ids follow first-seen order and are never reused.
//! - Header problems never abort a conversion; they degrade to placeholder
//!   metadata and a warning.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use snifcap_core::{ConvertOptions, convert_file};
//!
//! let summary = convert_file(
//!     Path::new("sniffer.txt"),
//!     Path::new("sniffer.pcapng"),
//!     &ConvertOptions::default(),
//! )?;
//! println!("{} packets written to {}", summary.packets_converted, summary.output_path);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

pub mod assembler;
mod convert;
pub mod dump;
pub mod ipsec;
pub mod pcapng;
pub mod source;

pub use assembler::{AssembledPacket, PacketAssembler};
pub use convert::{
    ConversionError, ConvertOptions, FrameError, check_ipv4_size, convert_bytes, convert_file,
    convert_source, strip_point_to_point_header,
};
pub use dump::{Dialect, Direction, DumpError, DumpParser, LineFragment, PacketHeader, ParseError};
pub use ipsec::{
    IpsecError, TunnelSummary, extract_tunnel_keys, extract_tunnel_keys_from_file,
    resolve_esp_sa_path,
};
pub use pcapng::{InterfaceRegistration, LinkType, PcapNgWriter, WriterError};
pub use source::{LineSource, RawLine, SourceError, TextLineSource};

/// Outcome of one conversion.
///
/// `packets_received_by_filter` is copied from the dump's own trailer and is
/// never reconciled with `packets_converted`.
///
/// # Examples
/// ```
/// use snifcap_core::ConversionSummary;
///
/// let summary = ConversionSummary {
///     output_path: "out.pcapng".to_string(),
///     output_files: vec!["out.pcapng".to_string()],
///     packets_converted: 3,
///     ..ConversionSummary::default()
/// };
/// let json = serde_json::to_value(&summary).unwrap();
/// assert_eq!(json["packets_converted"], 3);
/// assert!(json.get("time_start").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionSummary {
    /// First file written (the target itself unless output was split).
    pub output_path: String,
    /// Every file written, in sequence order.
    pub output_files: Vec<String>,
    pub packets_converted: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packets_received_by_filter: Option<u64>,
    /// Packets dropped by the include/exclude interface filters.
    pub packets_filtered: u64,
    /// Packets dropped by the `skip` option.
    pub packets_skipped: u64,
    /// Packets dropped by the IPv4 size check.
    pub packets_incomplete: u64,
    /// Packet lines that could not be decoded.
    pub skipped_lines: u64,
    /// Hex lines that did not belong to any packet.
    pub dropped_fragments: u64,
    pub interfaces: Vec<InterfaceRegistration>,
    /// RFC3339 timestamp of the earliest written packet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    /// RFC3339 timestamp of the latest written packet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}
