use std::borrow::Cow;
use std::collections::VecDeque;

use log::{debug, warn};

use crate::source::LineSource;

use super::error::{DumpError, ParseError};
use super::header::parse_header_line;
use super::{Dialect, LineFragment, PacketHeader, layout, reader};

/// Stateful line-by-line decoder over a [`LineSource`].
pub struct DumpParser<S> {
    source: S,
    dialect: Dialect,
    normalize_lines: bool,
    history: VecDeque<String>,
    lines_read: u64,
    bytes_read: u64,
    packets_received_by_filter: Option<u64>,
}

impl<S: LineSource> DumpParser<S> {
    pub fn new(source: S, dialect: Dialect) -> Self {
        Self {
            source,
            dialect,
            normalize_lines: true,
            history: VecDeque::with_capacity(layout::HISTORY_CAPACITY),
            lines_read: 0,
            bytes_read: 0,
            packets_received_by_filter: None,
        }
    }

    pub fn with_normalization(mut self, enabled: bool) -> Self {
        self.normalize_lines = enabled;
        self
    }

    /// Decode the next packet-data line.
    ///
    /// Non-packet lines are skipped. `Ok(None)` means end of input.
    ///
    /// # Errors
    /// `DumpError::Parse` for a packet line that cannot be decoded (the line
    /// is consumed, so calling again continues after it) and
    /// `DumpError::Source` when the input cannot be read.
    pub fn next_fragment(&mut self) -> Result<Option<LineFragment>, DumpError> {
        loop {
            let Some(raw) = self.source.next_line()? else {
                return Ok(None);
            };
            self.lines_read += 1;
            self.bytes_read += raw.byte_len as u64;

            let line = raw.text.trim();
            if line.is_empty() {
                continue;
            }
            if self.packets_received_by_filter.is_none() {
                if let Some(count) = reader::parse_filter_summary(line) {
                    debug!("sniffer reports {count} packets received by filter");
                    self.packets_received_by_filter = Some(count);
                }
            }

            let decoded =
                decode_packet_line(line, self.dialect, self.normalize_lines, self.lines_read);
            let header = match &decoded {
                Ok(Some((0, _))) => Some(self.header_from_previous_line()),
                _ => None,
            };
            self.remember(line);

            match decoded? {
                Some((offset, payload)) => {
                    return Ok(Some(LineFragment {
                        offset,
                        payload,
                        header,
                    }));
                }
                None => continue,
            }
        }
    }

    /// Physical lines consumed so far (blank lines included).
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn total_bytes(&self) -> u64 {
        self.source.total_bytes()
    }

    /// Whole-percent progress through the input, `None` when the size is unknown.
    pub fn progress_percent(&self) -> Option<u8> {
        let total = self.source.total_bytes();
        if total == 0 {
            return None;
        }
        Some((self.bytes_read.min(total) * 100 / total) as u8)
    }

    /// First `<N> packets received by filter` figure seen so far.
    pub fn packets_received_by_filter(&self) -> Option<u64> {
        self.packets_received_by_filter
    }

    fn remember(&mut self, line: &str) {
        if self.history.len() == layout::HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(line.to_string());
    }

    fn header_from_previous_line(&self) -> PacketHeader {
        let previous = self.history.back().map(String::as_str).unwrap_or("");
        let (fields, issues) = parse_header_line(previous);
        for issue in issues {
            warn!(
                "packet header for line {}: {}, using placeholder values",
                self.lines_read, issue
            );
        }
        PacketHeader {
            ts_sec: fields.ts_sec,
            ts_usec: fields.ts_usec,
            interface: fields.interface,
            direction: fields.direction,
            source_line: self.lines_read,
        }
    }
}

/// Decode one trimmed line into `(offset, bytes)`.
///
/// `Ok(None)` for non-packet lines, including packet lines with nothing
/// after the offset.
fn decode_packet_line(
    line: &str,
    dialect: Dialect,
    normalize: bool,
    line_number: u64,
) -> Result<Option<(usize, Vec<u8>)>, ParseError> {
    if reader::split_packet_line(line, dialect).is_none() {
        return Ok(None);
    }
    let line = if normalize {
        reader::normalize_packet_line(line)
    } else {
        Cow::Borrowed(line)
    };
    let Some((digits, rest)) = reader::split_packet_line(&line, dialect) else {
        return Ok(None);
    };
    let offset = usize::from_str_radix(digits, 16)
        .ok()
        .filter(|offset| *offset < layout::MAX_PACKET_LEN)
        .ok_or(ParseError::InvalidOffset { line: line_number })?;
    if rest.is_empty() {
        return Ok(None);
    }

    let hex_text: String = reader::locate_payload(rest)
        .chars()
        .filter(|c| *c != ' ')
        .collect();
    if hex_text.is_empty() {
        return Err(ParseError::MissingPayload {
            line: line_number,
            offset,
        });
    }
    let payload = hex::decode(&hex_text).map_err(|source| ParseError::InvalidHex {
        line: line_number,
        offset,
        source,
    })?;
    if offset + payload.len() > layout::MAX_PACKET_LEN {
        return Err(ParseError::InvalidOffset { line: line_number });
    }
    Ok(Some((offset, payload)))
}
