//! pcapng output.
//!
//! Everything is written big-endian with microsecond timestamps:
//! - `layout`: block types, magic numbers and option codes
//! - `block`: Section Header / Interface Description / Enhanced Packet builders
//! - `interfaces`: interface-name registry
//! - `writer`: file output with optional capacity-based splitting

pub mod block;
pub mod error;
pub mod interfaces;
pub mod layout;
pub mod writer;

use serde::{Deserialize, Serialize};

pub use error::{EncodeError, WriterError};
pub use interfaces::{InterfaceRegistration, InterfaceRegistry};
pub use writer::{OutputFileState, PcapNgWriter, existing_parts};

/// Framing of the packets captured on an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    #[default]
    Ethernet,
    /// BSD loopback: a 4-byte address family word precedes the payload.
    Null,
    /// Raw IP, no link-layer header.
    Raw,
    Ppp,
}

impl LinkType {
    pub fn code(self) -> u16 {
        match self {
            LinkType::Ethernet => layout::LINKTYPE_ETHERNET,
            LinkType::Null => layout::LINKTYPE_NULL,
            LinkType::Raw => layout::LINKTYPE_RAW,
            LinkType::Ppp => layout::LINKTYPE_PPP,
        }
    }
}
