//! Packet reassembly from hex-dump fragments.
//!
//! A packet's hex dump spans consecutive lines; a fragment at offset 0 marks
//! the start of the next packet and flushes the one being accumulated.

use std::collections::VecDeque;

use log::{debug, warn};

use crate::dump::{DumpError, DumpParser, LineFragment, PacketHeader};
use crate::source::LineSource;

/// A reassembled packet with the metadata of its first line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPacket {
    pub bytes: Vec<u8>,
    pub header: PacketHeader,
}

pub struct PacketAssembler<S> {
    parser: DumpParser<S>,
    stop_on_error: bool,
    pending: VecDeque<LineFragment>,
    ready: VecDeque<AssembledPacket>,
    skipped_lines: u64,
    dropped_fragments: u64,
    /// Set after a malformed offset-0 line: the rest of that packet is dropped.
    discarding: bool,
}

impl<S: LineSource> PacketAssembler<S> {
    /// With `stop_on_error` unset, undecodable packet lines are logged and
    /// skipped; otherwise the first one is returned as an error.
    pub fn new(parser: DumpParser<S>, stop_on_error: bool) -> Self {
        Self {
            parser,
            stop_on_error,
            pending: VecDeque::new(),
            ready: VecDeque::new(),
            skipped_lines: 0,
            dropped_fragments: 0,
            discarding: false,
        }
    }

    /// Read fragments until one more packet is complete.
    ///
    /// Returns `Ok(true)` when a packet was queued and more may follow,
    /// `Ok(false)` at end of input; the last packet, if any, is queued
    /// before `false` is returned. Drain with [`Self::dequeue`] after every
    /// call to keep memory bounded.
    ///
    /// # Errors
    /// Source failures always propagate; parse failures only with
    /// `stop_on_error`.
    pub fn assemble_next(&mut self) -> Result<bool, DumpError> {
        loop {
            let fragment = match self.parser.next_fragment() {
                Ok(Some(fragment)) => fragment,
                Ok(None) => {
                    self.flush();
                    return Ok(false);
                }
                Err(DumpError::Parse(err)) => {
                    if self.stop_on_error {
                        return Err(DumpError::Parse(err));
                    }
                    warn!("packet decoder problem: {err}, line ignored");
                    self.skipped_lines += 1;
                    if err.offset() == Some(0) {
                        // Later lines of the broken packet must not extend the previous one.
                        self.discarding = true;
                        if self.flush() {
                            return Ok(true);
                        }
                    }
                    continue;
                }
                Err(err) => return Err(err),
            };

            if self.discarding {
                if fragment.offset != 0 {
                    debug!("dropping line of a packet whose first line was malformed");
                    self.dropped_fragments += 1;
                    continue;
                }
                self.discarding = false;
            }

            if fragment.offset == 0 && !self.pending.is_empty() {
                let queued = self.flush();
                self.pending.push_back(fragment);
                if queued {
                    return Ok(true);
                }
                continue;
            }
            self.pending.push_back(fragment);
        }
    }

    /// Oldest completed packet, `None` when the queue is empty.
    pub fn dequeue(&mut self) -> Option<AssembledPacket> {
        self.ready.pop_front()
    }

    pub fn queued(&self) -> usize {
        self.ready.len()
    }

    pub fn parser(&self) -> &DumpParser<S> {
        &self.parser
    }

    /// Packet lines skipped because they could not be decoded.
    pub fn skipped_lines(&self) -> u64 {
        self.skipped_lines
    }

    /// Fragments discarded because no valid offset-0 line preceded them.
    pub fn dropped_fragments(&self) -> u64 {
        self.dropped_fragments
    }

    fn flush(&mut self) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        let len = self
            .pending
            .iter()
            .map(|fragment| fragment.offset + fragment.payload.len())
            .max()
            .unwrap_or(0);
        let count = self.pending.len();
        let mut bytes = vec![0u8; len];
        let mut header = None;
        for fragment in self.pending.drain(..) {
            let end = fragment.offset + fragment.payload.len();
            bytes[fragment.offset..end].copy_from_slice(&fragment.payload);
            if header.is_none() {
                header = fragment.header;
            }
        }

        match header {
            Some(header) => {
                debug!(
                    "assembled {} bytes from {} lines (line {})",
                    bytes.len(),
                    count,
                    header.source_line
                );
                self.ready.push_back(AssembledPacket { bytes, header });
                true
            }
            None => {
                warn!("dropping {count} hex lines that do not belong to any packet header");
                self.dropped_fragments += count as u64;
                false
            }
        }
    }
}
