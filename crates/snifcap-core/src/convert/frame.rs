use etherparse::{EtherType, Ethernet2Header, Ethernet2HeaderSlice, Ipv4HeaderSlice};
use thiserror::Error;

/// MAC addresses dropped from point-to-point frames, keeping the EtherType.
const P2P_STRIP_LEN: usize = 10;
const IPV4_TOTAL_LEN_RANGE: std::ops::Range<usize> = 2..4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("IPv4 packet is not complete: {declared} bytes declared, {captured} captured")]
    Incomplete { declared: usize, captured: usize },
}

/// Turn a sniffer-synthesized Ethernet frame into a BSD loopback one.
///
/// The two MAC addresses are removed and the EtherType is widened to the
/// 4-byte family word by two leading zero bytes. Frames shorter than an
/// Ethernet header are left alone.
pub fn strip_point_to_point_header(bytes: &mut Vec<u8>) {
    if bytes.len() < Ethernet2Header::LEN {
        return;
    }
    bytes.drain(..P2P_STRIP_LEN);
    bytes[0] = 0;
    bytes[1] = 0;
}

/// Check that an Ethernet-framed IPv4 packet holds as many bytes as its
/// header declares. Other frames always pass.
pub fn check_ipv4_size(bytes: &[u8]) -> Result<(), FrameError> {
    let Ok(ethernet) = Ethernet2HeaderSlice::from_slice(bytes) else {
        return Ok(());
    };
    if ethernet.ether_type() != EtherType::IPV4 {
        return Ok(());
    }
    let ip = &bytes[Ethernet2Header::LEN..];
    let declared = match Ipv4HeaderSlice::from_slice(ip) {
        Ok(header) => header.total_len() as usize,
        // Truncated or damaged header: fall back to the raw total length field.
        Err(_) => match ip.get(IPV4_TOTAL_LEN_RANGE) {
            Some(field) => u16::from_be_bytes([field[0], field[1]]) as usize,
            None => {
                return Err(FrameError::Incomplete {
                    declared: Ethernet2Header::LEN + 20,
                    captured: bytes.len(),
                });
            }
        },
    };
    let declared = declared + Ethernet2Header::LEN;
    if declared > bytes.len() {
        return Err(FrameError::Incomplete {
            declared,
            captured: bytes.len(),
        });
    }
    Ok(())
}
