use log::{debug, warn};

use crate::source::LineSource;

use super::error::{FieldError, IpsecError};
use super::reader::{self, TunnelHeader};
use super::{DirectionParams, Tunnel, TunnelDirection};

/// Tunnels in the order their headers appear in the dump.
#[derive(Debug, Default)]
pub struct TunnelSet {
    tunnels: Vec<Tunnel>,
    renames: u32,
}

/// Rendered esp_sa rows plus the number of tunnel directions left out.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct EspSaRows {
    pub rows: Vec<String>,
    pub skipped: usize,
}

impl TunnelSet {
    pub fn tunnels(&self) -> &[Tunnel] {
        &self.tunnels
    }

    pub fn get(&self, name: &str) -> Option<&Tunnel> {
        self.tunnels.iter().find(|tunnel| tunnel.name == name)
    }

    pub fn len(&self) -> usize {
        self.tunnels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tunnels.is_empty()
    }

    /// Rows for every recognized, supported direction: `enc` then `dec` per
    /// tunnel.
    pub fn esp_sa_rows(&self) -> EspSaRows {
        let mut out = EspSaRows::default();
        for tunnel in &self.tunnels {
            for direction in [TunnelDirection::Enc, TunnelDirection::Dec] {
                match tunnel.esp_sa_row(direction) {
                    Ok(Some(row)) => out.rows.push(row),
                    Ok(None) => out.skipped += 1,
                    Err(err) => {
                        warn!(
                            "ignoring \"{}\" direction for tunnel \"{}\" because of {}",
                            direction, tunnel.name, err
                        );
                        out.skipped += 1;
                    }
                }
            }
        }
        out
    }

    /// Register a tunnel; a name already in use gets a `_<n>` suffix from a
    /// counter shared by the whole scan.
    fn insert(&mut self, header: &TunnelHeader<'_>) -> usize {
        let mut name = header.name.to_string();
        while self.get(&name).is_some() {
            self.renames += 1;
            name = format!("{}_{}", header.name, self.renames);
        }
        let (src, dst, ignore) = match header.endpoints {
            Some((src, dst)) => (src.to_string(), dst.to_string(), false),
            None => {
                warn!("ignoring tunnel \"{name}\" because its header has no src->dst pair");
                (String::new(), String::new(), true)
            }
        };
        debug!("found tunnel {name} ({src} -> {dst})");
        self.tunnels.push(Tunnel {
            name,
            src,
            dst,
            enc: None,
            dec: None,
            ignore,
        });
        self.tunnels.len() - 1
    }
}

/// Collect tunnel definitions from a raw dump.
///
/// Each `enc:`/`dec:` line is paired with the line that follows it (the
/// `ah=` line) and applies to the most recent tunnel header.
///
/// # Errors
/// Only source read failures; format problems are logged.
pub fn scan_tunnels<S: LineSource>(source: &mut S) -> Result<TunnelSet, IpsecError> {
    let mut set = TunnelSet::default();
    let mut current = None;

    while let Some(raw) = source.next_line()? {
        let tokens: Vec<&str> = raw.text.split_whitespace().collect();
        if let Some(header) = reader::parse_tunnel_header(&tokens) {
            current = Some(set.insert(&header));
            continue;
        }
        let Some(direction) = tokens.first().and_then(|token| reader::direction_tag(token)) else {
            continue;
        };

        let auth_line = source.next_line()?.map(|line| line.text).unwrap_or_default();
        let auth_tokens: Vec<&str> = auth_line.split_whitespace().collect();
        let Some(index) = current else {
            warn!("ignoring \"{direction}\" line outside of any tunnel");
            continue;
        };

        let tunnel = &mut set.tunnels[index];
        match direction_params(&tokens[1..], &auth_tokens) {
            Ok(params) => tunnel.set_direction(direction, Some(params)),
            Err(err) => {
                warn!(
                    "ignoring \"{}\" direction for tunnel \"{}\" because of {}",
                    direction, tunnel.name, err
                );
                tunnel.set_direction(direction, None);
            }
        }
    }
    Ok(set)
}

fn direction_params(cipher: &[&str], auth: &[&str]) -> Result<DirectionParams, FieldError> {
    let cipher = reader::parse_cipher_fields(cipher)?;
    let auth = reader::parse_auth_fields(auth)?;
    Ok(DirectionParams {
        spi: cipher.spi.to_string(),
        cipher_alg: cipher.code.to_string(),
        cipher_key_len: cipher.key_len.to_string(),
        cipher_key: cipher.key.to_string(),
        hash_alg: auth.code.to_string(),
        hash_key_len: auth.key_len.to_string(),
        hash_key: auth.key.to_string(),
    })
}
