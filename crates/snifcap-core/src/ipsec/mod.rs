//! IPsec key extraction.
//!
//! Sniffer dumps taken with tunnel debugging enabled list every phase-2 SA:
//!
//! ```text
//! name=vpn1 ver=1 serial=1 10.0.0.1:0->10.0.0.2:0 ...
//! dec: spi=ca646448 esp=aes key=16 2d0fb0e6da1e3b15da4d0ab32bc1bd8f
//!      ah=sha1 key=20 c5e57ba2d3bd4dbea6f7b7ce66e2f2f0a1c0e111
//! enc: spi=8fa1e352 esp=aes key=16 9f1f3c8d91e10a78e0b6f8b2a6de8a49
//!      ah=sha1 key=20 4e9b6e4cf0c4b48f5e31c5e1f3f8a6e7b1a2c3d4
//! ```
//!
//! Supported SAs are rendered as rows of Wireshark's `esp_sa` table so the
//! converted capture can be decrypted.

pub mod config;
pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::source::{LineSource, TextLineSource};

pub use config::{append_rows, esp_sa_path_from, resolve_esp_sa_path};
pub use error::{FieldError, IpsecError, UnsupportedAlgorithm};
pub use parser::{EspSaRows, TunnelSet, scan_tunnels};

/// Keying context of an SA: `enc` is outbound (src to dst), `dec` inbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelDirection {
    Enc,
    Dec,
}

impl TunnelDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            TunnelDirection::Enc => "enc",
            TunnelDirection::Dec => "dec",
        }
    }
}

impl std::fmt::Display for TunnelDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionParams {
    pub spi: String,
    pub cipher_alg: String,
    pub cipher_key_len: String,
    pub cipher_key: String,
    pub hash_alg: String,
    pub hash_key_len: String,
    pub hash_key: String,
}

impl DirectionParams {
    /// esp_sa labels for the cipher and hash, in that order.
    pub fn labels(&self) -> Result<(&'static str, &'static str), UnsupportedAlgorithm> {
        let cipher = layout::cipher_label(&self.cipher_alg, &self.cipher_key_len).ok_or_else(
            || UnsupportedAlgorithm::Cipher {
                code: self.cipher_alg.clone(),
                key_len: self.cipher_key_len.clone(),
            },
        )?;
        let hash = layout::hash_label(&self.hash_alg, &self.hash_key_len).ok_or_else(|| {
            UnsupportedAlgorithm::Hash {
                code: self.hash_alg.clone(),
                key_len: self.hash_key_len.clone(),
            }
        })?;
        Ok((cipher, hash))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tunnel {
    pub name: String,
    pub src: String,
    pub dst: String,
    pub enc: Option<DirectionParams>,
    pub dec: Option<DirectionParams>,
    /// Set when the tunnel header carried no usable endpoints.
    pub ignore: bool,
}

impl Tunnel {
    pub fn direction(&self, direction: TunnelDirection) -> Option<&DirectionParams> {
        match direction {
            TunnelDirection::Enc => self.enc.as_ref(),
            TunnelDirection::Dec => self.dec.as_ref(),
        }
    }

    pub(crate) fn set_direction(
        &mut self,
        direction: TunnelDirection,
        params: Option<DirectionParams>,
    ) {
        match direction {
            TunnelDirection::Enc => self.enc = params,
            TunnelDirection::Dec => self.dec = params,
        }
    }

    /// The esp_sa row for one direction.
    ///
    /// `Ok(None)` when the tunnel is ignored or the direction was not
    /// recognized. `enc` rows run src to dst, `dec` rows dst to src.
    pub fn esp_sa_row(
        &self,
        direction: TunnelDirection,
    ) -> Result<Option<String>, UnsupportedAlgorithm> {
        if self.ignore {
            return Ok(None);
        }
        let Some(params) = self.direction(direction) else {
            return Ok(None);
        };
        let (cipher, hash) = params.labels()?;
        let (first, second) = match direction {
            TunnelDirection::Enc => (&self.src, &self.dst),
            TunnelDirection::Dec => (&self.dst, &self.src),
        };
        Ok(Some(format!(
            "\"{}\",\"{}\",\"{}\",\"0x{}\",\"{}\",\"0x{}\",\"{}\",\"0x{}\"",
            layout::ADDRESS_FAMILY,
            first,
            second,
            params.spi,
            cipher,
            params.cipher_key,
            hash,
            params.hash_key
        )))
    }
}

/// Outcome of one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelSummary {
    pub tunnels_found: usize,
    pub rows_written: usize,
    /// Tunnel directions that produced no row.
    pub directions_skipped: usize,
}

/// Scan `source` for tunnels and append their rows to `esp_sa`.
///
/// # Errors
/// Read failures on the source and write failures on `esp_sa`. Malformed or
/// unsupported tunnels are logged and skipped.
pub fn extract_tunnel_keys<S: LineSource>(
    source: &mut S,
    esp_sa: &Path,
) -> Result<TunnelSummary, IpsecError> {
    let tunnels = scan_tunnels(source)?;
    let rows = tunnels.esp_sa_rows();
    append_rows(esp_sa, &rows.rows)?;
    info!(
        "{} tunnels found, {} esp_sa rows appended to {}",
        tunnels.len(),
        rows.rows.len(),
        esp_sa.display()
    );
    Ok(TunnelSummary {
        tunnels_found: tunnels.len(),
        rows_written: rows.rows.len(),
        directions_skipped: rows.skipped,
    })
}

/// [`extract_tunnel_keys`] over a dump file.
pub fn extract_tunnel_keys_from_file(
    input: &Path,
    esp_sa: &Path,
) -> Result<TunnelSummary, IpsecError> {
    let mut source = TextLineSource::open(input)?;
    extract_tunnel_keys(&mut source, esp_sa)
}
