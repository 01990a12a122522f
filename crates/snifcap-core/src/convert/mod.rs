//! Text dump to pcapng conversion.
//!
//! Packets stream one at a time from the assembler through the interface
//! filters, skip/limit, link-type fix-ups and the size check into Enhanced
//! Packet Blocks. Without a section size each block is appended to the open
//! section as soon as it is encoded, interface blocks included as new
//! interfaces appear; with one, blocks are buffered until the section is
//! full. The writer takes care of file splitting.

mod frame;
mod options;

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::ConversionSummary;
use crate::assembler::{AssembledPacket, PacketAssembler};
use crate::dump::{DumpError, DumpParser, PacketHeader};
use crate::pcapng::block::enhanced_packet_block;
use crate::pcapng::{
    EncodeError, InterfaceRegistry, LinkType, PcapNgWriter, WriterError, existing_parts,
};
use crate::source::{LineSource, SourceError, TextLineSource};

pub use frame::{FrameError, check_ipv4_size, strip_point_to_point_header};
pub use options::ConvertOptions;

/// Progress is re-evaluated every this many assembled packets.
const PROGRESS_INTERVAL: u64 = 1000;
const COMMENT_DIRECTION_WIDTH: usize = 4;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("output file {} already exists", .0.display())]
    OutputExists(PathBuf),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Dump(#[from] DumpError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Writer(#[from] WriterError),
}

impl ConversionError {
    /// Message safe to show to end users: no paths, line numbers or bytes.
    pub fn user_message(&self) -> &'static str {
        match self {
            ConversionError::OutputExists(_) => "The output file already exists.",
            ConversionError::Source(_) | ConversionError::Dump(DumpError::Source(_)) => {
                "The uploaded dump could not be read."
            }
            ConversionError::Dump(DumpError::Parse(_)) => {
                "The dump contains a malformed packet line."
            }
            ConversionError::Encode(_) => "A packet in the dump could not be encoded.",
            ConversionError::Writer(_) => "The capture file could not be written.",
        }
    }
}

pub fn convert_file(
    input: &Path,
    output: &Path,
    options: &ConvertOptions,
) -> Result<ConversionSummary, ConversionError> {
    let source = TextLineSource::open(input)?;
    convert_source(source, output, options)
}

/// Convert an in-memory dump, e.g. an uploaded file.
pub fn convert_bytes(
    input: &[u8],
    output: &Path,
    options: &ConvertOptions,
) -> Result<ConversionSummary, ConversionError> {
    convert_source(TextLineSource::from_bytes(input), output, options)
}

/// Convert every packet of `source` into `output`.
///
/// # Errors
/// I/O failures on either side, a refused overwrite (of the target or,
/// when splitting, of any existing `.partNNN` file), and, with
/// `stop_on_error`, the first malformed packet line.
pub fn convert_source<S: LineSource>(
    source: S,
    output: &Path,
    options: &ConvertOptions,
) -> Result<ConversionSummary, ConversionError> {
    if !options.overwrite {
        if output.exists() {
            return Err(ConversionError::OutputExists(output.to_path_buf()));
        }
        if options.max_packets_per_file.is_some() {
            if let Some(part) = existing_parts(output)?.into_iter().next() {
                return Err(ConversionError::OutputExists(part));
            }
        }
    }

    let parser =
        DumpParser::new(source, options.dialect).with_normalization(options.normalize_lines);
    let mut assembler = PacketAssembler::new(parser, options.stop_on_error);
    let mut writer =
        PcapNgWriter::create(output, options.max_packets_per_file, &options.application)?;
    let section_size = options.section_size.filter(|size| *size > 0);
    let mut pipeline = Pipeline::new(options);
    let mut progress = Progress::new(options.report_progress);
    let mut section = Vec::new();
    let mut in_section = 0usize;

    'read: loop {
        let more = assembler.assemble_next()?;
        while let Some(packet) = assembler.dequeue() {
            if pipeline.limit_reached() {
                debug!("packet limit reached, stopping");
                break 'read;
            }
            if let Some(block) = pipeline.encode(packet)? {
                if section_size.is_some() {
                    section.push(block);
                } else {
                    writer.append_packet(pipeline.registry.description_blocks(), &block)?;
                }
            }
            in_section += 1;
            progress.update(pipeline.assembled, assembler.parser().progress_percent());

            if section_size.is_some_and(|size| in_section >= size) {
                writer.write_packets(pipeline.registry.description_blocks(), &section)?;
                section.clear();
                in_section = 0;
            }
        }
        if !more {
            break;
        }
    }
    writer.write_packets(pipeline.registry.description_blocks(), &section)?;
    let files = writer.finish()?;

    let parser = assembler.parser();
    let packets_received_by_filter = parser.packets_received_by_filter();
    info!(
        "converted {} packets from {} lines into {} file(s)",
        pipeline.converted,
        parser.lines_read(),
        files.len()
    );
    if let Some(received) = packets_received_by_filter {
        info!("dump reports {received} packets received by filter");
    }

    let output_files: Vec<String> = files
        .iter()
        .map(|path| path.display().to_string())
        .collect();
    Ok(ConversionSummary {
        output_path: output_files
            .first()
            .cloned()
            .unwrap_or_else(|| output.display().to_string()),
        output_files,
        packets_converted: pipeline.converted,
        packets_received_by_filter,
        packets_filtered: pipeline.filtered,
        packets_skipped: pipeline.skipped,
        packets_incomplete: pipeline.incomplete,
        skipped_lines: assembler.skipped_lines(),
        dropped_fragments: assembler.dropped_fragments(),
        interfaces: pipeline.registry.registrations().to_vec(),
        time_start: ts_to_rfc3339(pipeline.first_ts),
        time_end: ts_to_rfc3339(pipeline.last_ts),
    })
}

/// Per-packet stage between the assembler and the writer.
struct Pipeline<'a> {
    options: &'a ConvertOptions,
    registry: InterfaceRegistry,
    assembled: u64,
    filtered: u64,
    skipped: u64,
    incomplete: u64,
    converted: u64,
    first_ts: Option<u64>,
    last_ts: Option<u64>,
}

impl<'a> Pipeline<'a> {
    fn new(options: &'a ConvertOptions) -> Self {
        Self {
            options,
            registry: InterfaceRegistry::new(),
            assembled: 0,
            filtered: 0,
            skipped: 0,
            incomplete: 0,
            converted: 0,
            first_ts: None,
            last_ts: None,
        }
    }

    fn limit_reached(&self) -> bool {
        self.options
            .limit
            .is_some_and(|limit| self.converted >= limit)
    }

    /// Enhanced Packet Block for `packet`, `None` when it is filtered,
    /// skipped or incomplete.
    fn encode(&mut self, packet: AssembledPacket) -> Result<Option<Vec<u8>>, ConversionError> {
        self.assembled += 1;
        let AssembledPacket { mut bytes, header } = packet;
        if !self.options.accepts_interface(&header.interface) {
            self.filtered += 1;
            return Ok(None);
        }
        if self.skipped < self.options.skip {
            self.skipped += 1;
            return Ok(None);
        }

        let link_type = self.options.link_type(&header.interface);
        if link_type == LinkType::Null {
            strip_point_to_point_header(&mut bytes);
        }
        if self.options.check_packet_size && link_type == LinkType::Ethernet {
            if let Err(err) = check_ipv4_size(&bytes) {
                warn!(
                    "packet at line {} is not complete, ignoring: {}",
                    header.source_line, err
                );
                self.incomplete += 1;
                return Ok(None);
            }
        }

        let index = self.registry.resolve(&header.interface, link_type)?;
        let timestamp = header.timestamp_micros();
        let comment = packet_comment(&header, self.options.include_packet_line);
        let block = enhanced_packet_block(index, timestamp, &bytes, &comment)?;
        self.converted += 1;
        update_ts_bounds(&mut self.first_ts, &mut self.last_ts, timestamp);
        Ok(Some(block))
    }
}

/// `(<direction>)<pad><interface>`, optionally followed by the dump line.
fn packet_comment(header: &PacketHeader, include_line: bool) -> String {
    let direction = header.direction.as_str();
    let pad = COMMENT_DIRECTION_WIDTH.saturating_sub(direction.len());
    let mut comment = format!("({}){}{}", direction, " ".repeat(pad), header.interface);
    if include_line {
        comment.push_str(&format!("  {:5}", header.source_line));
    }
    comment
}

struct Progress {
    enabled: bool,
    last: Option<u8>,
}

impl Progress {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            last: None,
        }
    }

    fn update(&mut self, assembled: u64, percent: Option<u8>) {
        if !self.enabled || assembled % PROGRESS_INTERVAL != 0 {
            return;
        }
        if let Some(percent) = percent {
            if self.last != Some(percent) {
                info!("assembling: {percent:3} %");
                self.last = Some(percent);
            }
        }
    }
}

fn update_ts_bounds(first: &mut Option<u64>, last: &mut Option<u64>, ts: u64) {
    match first {
        None => *first = Some(ts),
        Some(existing) => {
            if ts < *existing {
                *first = Some(ts);
            }
        }
    }
    match last {
        None => *last = Some(ts),
        Some(existing) => {
            if ts > *existing {
                *last = Some(ts);
            }
        }
    }
}

fn ts_to_rfc3339(micros: Option<u64>) -> Option<String> {
    let nanos = i128::from(micros?) * 1_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}
